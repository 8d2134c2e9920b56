//! Dense matrices over GF(256)
//!
//! Row-major storage. Inversion is Gauss-Jordan elimination using field
//! operations only: a pivot is usable exactly when it is not the field's
//! zero element.

use crate::ErasureError;
use crate::gf256::Gf256;
use std::fmt;

/// A `rows x cols` matrix of field elements
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Gf256>,
}

impl Matrix {
    /// All-zero matrix
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Gf256::ZERO; rows * cols],
        }
    }

    /// `n x n` identity matrix
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, Gf256::ONE);
        }
        m
    }

    /// Build a matrix from row-major elements
    pub fn from_vec(rows: usize, cols: usize, data: Vec<Gf256>) -> Result<Self, ErasureError> {
        if data.len() != rows * cols {
            return Err(ErasureError::InvalidArgument(format!(
                "{rows}x{cols} matrix needs {} elements, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of rows
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix is square
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element at (`row`, `col`)
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Gf256 {
        self.data[row * self.cols + col]
    }

    /// Overwrite the element at (`row`, `col`)
    pub fn set(&mut self, row: usize, col: usize, value: Gf256) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row
    #[must_use]
    pub fn row(&self, row: usize) -> &[Gf256] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mutably borrow one row
    pub fn row_mut(&mut self, row: usize) -> &mut [Gf256] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Replace one row
    ///
    /// # Panics
    /// Panics if `values` is not exactly `cols` long.
    pub fn set_row(&mut self, row: usize, values: &[Gf256]) {
        self.row_mut(row).copy_from_slice(values);
    }

    /// Swap two rows
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let (head, tail) = self.data.split_at_mut(hi * self.cols);
        head[lo * self.cols..(lo + 1) * self.cols].swap_with_slice(&mut tail[..self.cols]);
    }

    /// New matrix made of the given rows, in the given order
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Self {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Self) -> Result<Self, ErasureError> {
        if self.cols != other.rows {
            return Err(ErasureError::InvalidArgument(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for (k, &a) in self.row(r).iter().enumerate() {
                if a.is_zero() {
                    continue;
                }
                let b_row = other.row(k);
                for (dst, &b) in out.row_mut(r).iter_mut().zip(b_row) {
                    *dst += a * b;
                }
            }
        }
        Ok(out)
    }

    /// Inverse via Gauss-Jordan elimination
    ///
    /// Rows are swapped whenever the current pivot is zero. If a column has
    /// no nonzero pivot the matrix is singular and
    /// [`ErasureError::UnrecoverableErasure`] names that column.
    pub fn invert(&self) -> Result<Self, ErasureError> {
        if !self.is_square() {
            return Err(ErasureError::InvalidArgument(format!(
                "cannot invert non-square {}x{} matrix",
                self.rows, self.cols
            )));
        }

        let n = self.rows;
        let mut work = self.clone();
        let mut inverse = Self::identity(n);

        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| !work.get(r, col).is_zero())
                .ok_or(ErasureError::UnrecoverableErasure { column: col })?;
            if pivot != col {
                work.swap_rows(pivot, col);
                inverse.swap_rows(pivot, col);
            }

            let scale = work.get(col, col).inverse()?;
            if scale != Gf256::ONE {
                work.scale_row(col, scale);
                inverse.scale_row(col, scale);
            }

            for r in 0..n {
                let factor = work.get(r, col);
                if r == col || factor.is_zero() {
                    continue;
                }
                work.add_scaled_row(col, r, factor);
                inverse.add_scaled_row(col, r, factor);
            }
        }

        Ok(inverse)
    }

    fn scale_row(&mut self, row: usize, scale: Gf256) {
        for v in self.row_mut(row) {
            *v *= scale;
        }
    }

    /// `row[dst] += factor * row[src]`
    fn add_scaled_row(&mut self, src: usize, dst: usize, factor: Gf256) {
        debug_assert_ne!(src, dst);
        let cols = self.cols;
        let (src_row, dst_row): (&[Gf256], &mut [Gf256]) = if src < dst {
            let (head, tail) = self.data.split_at_mut(dst * cols);
            (&head[src * cols..(src + 1) * cols], &mut tail[..cols])
        } else {
            let (head, tail) = self.data.split_at_mut(src * cols);
            (&tail[..cols], &mut head[dst * cols..(dst + 1) * cols])
        };
        for (d, &s) in dst_row.iter_mut().zip(src_row) {
            *d += factor * s;
        }
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {}x{} [", self.rows, self.cols)?;
        for r in 0..self.rows {
            writeln!(f, "  {:?}", self.row(r))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Matrix {
        Matrix::from_vec(rows, cols, bytes.iter().copied().map(Gf256::new).collect()).unwrap()
    }

    /// Square Vandermonde matrix on distinct points, always invertible
    fn vandermonde(n: usize) -> Matrix {
        let mut m = Matrix::zeros(n, n);
        for r in 0..n {
            let x = Gf256::exp(r + 1);
            for c in 0..n {
                m.set(r, c, x.pow(c));
            }
        }
        m
    }

    #[test]
    fn test_identity_inverse() {
        let id = Matrix::identity(5);
        assert_eq!(id.invert().unwrap(), id);
    }

    #[test]
    fn test_inverse_requires_row_swap() {
        let m = from_bytes(2, 2, &[0, 1, 1, 0]);
        assert_eq!(m.invert().unwrap(), m);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        for n in [1, 2, 3, 8, 16] {
            let m = vandermonde(n);
            let inv = m.invert().unwrap();
            assert_eq!(m.multiply(&inv).unwrap(), Matrix::identity(n), "n={n}");
            assert_eq!(inv.multiply(&m).unwrap(), Matrix::identity(n), "n={n}");
        }
    }

    #[test]
    fn test_invert_leaves_input_untouched() {
        let m = vandermonde(4);
        let copy = m.clone();
        let _ = m.invert().unwrap();
        assert_eq!(m, copy);
    }

    #[test]
    fn test_singular_zero_column() {
        let m = from_bytes(2, 2, &[0, 1, 0, 1]);
        assert_eq!(
            m.invert(),
            Err(ErasureError::UnrecoverableErasure { column: 0 })
        );
    }

    #[test]
    fn test_singular_duplicate_rows() {
        let m = from_bytes(3, 3, &[1, 2, 3, 4, 5, 6, 1, 2, 3]);
        assert!(matches!(
            m.invert(),
            Err(ErasureError::UnrecoverableErasure { .. })
        ));
    }

    #[test]
    fn test_invert_non_square() {
        let m = Matrix::zeros(2, 3);
        assert!(matches!(m.invert(), Err(ErasureError::InvalidArgument(_))));
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(
            a.multiply(&b),
            Err(ErasureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_vec_wrong_length() {
        assert!(Matrix::from_vec(2, 2, vec![Gf256::ONE; 3]).is_err());
    }

    #[test]
    fn test_swap_and_select_rows() {
        let mut m = from_bytes(3, 2, &[1, 2, 3, 4, 5, 6]);
        m.swap_rows(2, 0);
        assert_eq!(m, from_bytes(3, 2, &[5, 6, 3, 4, 1, 2]));
        assert_eq!(m.select_rows(&[1, 1]), from_bytes(2, 2, &[3, 4, 3, 4]));
    }

    #[test]
    fn test_set_row() {
        let mut m = Matrix::identity(3);
        m.set_row(1, &[Gf256::new(7), Gf256::new(8), Gf256::new(9)]);
        assert_eq!(m, from_bytes(3, 3, &[1, 0, 0, 7, 8, 9, 0, 0, 1]));
    }
}
