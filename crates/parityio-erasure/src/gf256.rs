//! GF(2^8) arithmetic
//!
//! Symbols are bytes. Addition (and subtraction) is xor; multiplication goes
//! through logarithm/antilogarithm tables generated from the irreducible
//! polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D) with generator 2.
//!
//! The log/exp tables are computed at compile time. The full 256x256 product
//! table used by the encode/decode hot loops is built once, on first use, and
//! only read afterwards.

use crate::ErasureError;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;

/// Irreducible polynomial x^8 + x^4 + x^3 + x^2 + 1
const POLYNOMIAL: u16 = 0x11d;

/// Order of the multiplicative group
const GROUP_ORDER: usize = 255;

/// Logarithm and antilogarithm tables
struct Tables {
    /// exp[i] = 2^i, stored twice so `log a + log b` never needs a modulo
    exp: [u8; 2 * GROUP_ORDER + 2],
    /// log[x] = i where 2^i = x; log[0] is unused
    log: [u8; 256],
}

impl Tables {
    const fn new() -> Self {
        let mut exp = [0u8; 2 * GROUP_ORDER + 2];
        let mut log = [0u8; 256];

        let mut x: u16 = 1;
        let mut i = 0;
        while i < GROUP_ORDER {
            exp[i] = x as u8;
            exp[i + GROUP_ORDER] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLYNOMIAL;
            }
            i += 1;
        }

        Self { exp, log }
    }
}

static TABLES: Tables = Tables::new();

/// One row of the product table: `row[b] = a * b` for a fixed `a`
pub type MulRow = [u8; 256];

fn product_table() -> &'static [MulRow] {
    static TABLE: OnceLock<Box<[MulRow]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..=u8::MAX)
            .map(|a| {
                let mut row = [0u8; 256];
                for (b, out) in (0..=u8::MAX).zip(row.iter_mut()) {
                    *out = mul_raw(a, b);
                }
                row
            })
            .collect()
    })
}

#[inline]
fn mul_raw(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    TABLES.exp[TABLES.log[a as usize] as usize + TABLES.log[b as usize] as usize]
}

/// An element of GF(256)
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Gf256(u8);

impl fmt::Debug for Gf256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

impl Gf256 {
    /// The additive identity.
    pub const ZERO: Self = Self(0);

    /// The multiplicative identity.
    pub const ONE: Self = Self(1);

    /// Generator of the multiplicative group.
    pub const GENERATOR: Self = Self(2);

    /// Wrap a byte as a field element
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// The underlying byte
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this is the additive identity
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `GENERATOR^n`
    #[must_use]
    pub fn exp(n: usize) -> Self {
        Self(TABLES.exp[n % GROUP_ORDER])
    }

    /// Discrete logarithm base `GENERATOR`, `None` for zero
    #[must_use]
    pub fn log(self) -> Option<usize> {
        if self.is_zero() {
            None
        } else {
            Some(TABLES.log[self.0 as usize] as usize)
        }
    }

    /// `self^n`, with `0^0 = 1`
    #[must_use]
    pub fn pow(self, n: usize) -> Self {
        match self.log() {
            _ if n == 0 => Self::ONE,
            None => Self::ZERO,
            Some(log) => Self::exp((log * (n % GROUP_ORDER)) % GROUP_ORDER),
        }
    }

    /// Multiplicative inverse
    ///
    /// Zero has no inverse and yields [`ErasureError::Domain`].
    pub fn inverse(self) -> Result<Self, ErasureError> {
        match self.log() {
            None => Err(ErasureError::Domain("inverse of zero in GF(256)")),
            Some(log) => Ok(Self(TABLES.exp[GROUP_ORDER - log])),
        }
    }

    /// `self / rhs`
    ///
    /// Division by zero yields [`ErasureError::Domain`].
    pub fn divide(self, rhs: Self) -> Result<Self, ErasureError> {
        if rhs.is_zero() {
            return Err(ErasureError::Domain("division by zero in GF(256)"));
        }
        Ok(self * rhs.inverse()?)
    }

    /// Product-table row for this element: `row[b] == (self * b).value()`
    #[must_use]
    pub fn mul_row(self) -> &'static MulRow {
        &product_table()[self.0 as usize]
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Gf256> for u8 {
    fn from(value: Gf256) -> Self {
        value.0
    }
}

impl Add for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf256 {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

// Characteristic 2: subtraction is addition.
impl Sub for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl SubAssign for Gf256 {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Mul for Gf256 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(mul_raw(self.0, rhs.0))
    }
}

impl MulAssign for Gf256 {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = mul_raw(self.0, rhs.0);
    }
}

/// `a + b` over GF(256)
#[inline]
#[must_use]
pub const fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// `a * b` over GF(256)
#[inline]
#[must_use]
pub fn multiply(a: u8, b: u8) -> u8 {
    mul_raw(a, b)
}

/// Multiplicative inverse of `a`; fails for zero
pub fn inverse(a: u8) -> Result<u8, ErasureError> {
    Gf256(a).inverse().map(Gf256::value)
}

/// `a / b` over GF(256); fails when `b` is zero
pub fn divide(a: u8, b: u8) -> Result<u8, ErasureError> {
    Gf256(a).divide(Gf256(b)).map(Gf256::value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Carry-less multiply followed by reduction, independent of the tables
    fn slow_mul(a: u8, b: u8) -> u8 {
        let mut product: u16 = 0;
        for bit in 0..8 {
            if b & (1 << bit) != 0 {
                product ^= u16::from(a) << bit;
            }
        }
        for bit in (8..16).rev() {
            if product & (1 << bit) != 0 {
                product ^= POLYNOMIAL << (bit - 8);
            }
        }
        product as u8
    }

    #[test]
    fn test_tables_match_polynomial_arithmetic() {
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                assert_eq!(multiply(a, b), slow_mul(a, b), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn test_product_table_matches_multiply() {
        for a in 0..=u8::MAX {
            let row = Gf256::new(a).mul_row();
            for b in 0..=u8::MAX {
                assert_eq!(row[b as usize], multiply(a, b));
            }
        }
    }

    #[test]
    fn test_known_products() {
        // x^8 reduces to x^4 + x^3 + x^2 + 1
        assert_eq!(multiply(2, 0x80), 0x1d);
        assert_eq!(Gf256::exp(8), Gf256::new(0x1d));
        assert_eq!(Gf256::exp(255), Gf256::ONE);
        assert_eq!(Gf256::exp(0), Gf256::ONE);
    }

    #[test]
    fn test_generator_spans_group() {
        let mut seen = [false; 256];
        for n in 0..255 {
            let x = Gf256::exp(n).value();
            assert!(!seen[x as usize], "2^{n} repeats");
            seen[x as usize] = true;
        }
        assert!(!seen[0]);
    }

    #[test]
    fn test_mul_identity() {
        for a in 0..=u8::MAX {
            assert_eq!(multiply(a, 1), a);
            assert_eq!(multiply(1, a), a);
            assert_eq!(multiply(a, 0), 0);
            assert_eq!(multiply(0, a), 0);
        }
    }

    #[test]
    fn test_inverse() {
        for a in 1..=u8::MAX {
            let inv = inverse(a).unwrap();
            assert_eq!(multiply(a, inv), 1, "a={a} inv={inv}");
        }
        assert_eq!(inverse(1).unwrap(), 1);
    }

    #[test]
    fn test_divide() {
        for a in 0..=u8::MAX {
            for b in 1..=u8::MAX {
                let q = divide(a, b).unwrap();
                assert_eq!(multiply(q, b), a);
            }
        }
    }

    #[test]
    fn test_zero_is_outside_domain() {
        assert!(matches!(inverse(0), Err(ErasureError::Domain(_))));
        assert!(matches!(divide(7, 0), Err(ErasureError::Domain(_))));
        assert!(matches!(
            Gf256::ONE.divide(Gf256::ZERO),
            Err(ErasureError::Domain(_))
        ));
    }

    #[test]
    fn test_log_exp_roundtrip() {
        assert_eq!(Gf256::ZERO.log(), None);
        for a in 1..=u8::MAX {
            let x = Gf256::new(a);
            assert_eq!(Gf256::exp(x.log().unwrap()), x);
        }
    }

    #[test]
    fn test_pow() {
        assert_eq!(Gf256::ZERO.pow(0), Gf256::ONE);
        assert_eq!(Gf256::ZERO.pow(3), Gf256::ZERO);
        assert_eq!(Gf256::GENERATOR.pow(8), Gf256::new(0x1d));
        for a in 1..=u8::MAX {
            assert_eq!(Gf256::new(a).pow(255), Gf256::ONE);
        }
    }

    fn any_gf() -> impl Strategy<Value = Gf256> {
        any::<u8>().prop_map(Gf256::new)
    }

    fn nonzero_gf() -> impl Strategy<Value = Gf256> {
        (1..=u8::MAX).prop_map(Gf256::new)
    }

    proptest! {
        #[test]
        fn test_add_self_is_zero(x in any_gf()) {
            prop_assert_eq!(x + x, Gf256::ZERO);
            prop_assert_eq!(x - x, Gf256::ZERO);
        }

        #[test]
        fn test_add_commutative(x in any_gf(), y in any_gf()) {
            prop_assert_eq!(x + y, y + x);
        }

        #[test]
        fn test_mul_commutative(x in any_gf(), y in any_gf()) {
            prop_assert_eq!(x * y, y * x);
        }

        #[test]
        fn test_mul_associative(x in any_gf(), y in any_gf(), z in any_gf()) {
            prop_assert_eq!(x * (y * z), (x * y) * z);
        }

        #[test]
        fn test_distributive(x in any_gf(), y in any_gf(), z in any_gf()) {
            prop_assert_eq!(x * (y + z), x * y + x * z);
        }

        #[test]
        fn test_divide_then_multiply(x in any_gf(), y in nonzero_gf()) {
            prop_assert_eq!(x.divide(y).unwrap() * y, x);
        }

        #[test]
        fn test_assign_ops_agree(x in any_gf(), y in any_gf()) {
            let mut sum = x;
            sum += y;
            prop_assert_eq!(sum, x + y);
            let mut product = x;
            product *= y;
            prop_assert_eq!(product, x * y);
        }
    }
}
