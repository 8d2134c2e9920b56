//! Parity computation
//!
//! Each row of `data` holds one symbol from each of the K data shards; each
//! row of the parity buffer receives one symbol from each of the M parity
//! shards:
//!
//! ```text
//! parity[r * M + j] = sum over i of generator[j][i] * data[r * K + i]
//! ```

use crate::ErasureError;
use crate::generator::{GeneratorMatrix, check_capacity};
use crate::gf256::MulRow;
use crate::rows::zip_rows;
use std::sync::Arc;
use tracing::trace;

/// Encode every row of `data` into `ec_out`
///
/// `data` holds `Rows * data_shards` bytes and `ec_out` must hold exactly
/// `Rows * parity_shards` bytes. Only `ec_out` is written.
pub fn encode(
    data: &[u8],
    ec_out: &mut [u8],
    data_shards: usize,
    parity_shards: usize,
) -> Result<(), ErasureError> {
    Encoder::new(data_shards, parity_shards)?.encode(data, ec_out)
}

/// Encoder bound to one (K, M) shape
///
/// Holds the shared generator and the product-table row of every
/// coefficient, so repeated encodes skip all setup.
#[derive(Clone)]
pub struct Encoder {
    data_shards: usize,
    parity_shards: usize,
    generator: Option<Arc<GeneratorMatrix>>,
    /// `products[j * K + i]` multiplies by `generator[j][i]`
    products: Vec<&'static MulRow>,
}

impl Encoder {
    /// Create an encoder for K data and M parity shards
    ///
    /// M may be zero, in which case encoding produces no parity.
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self, ErasureError> {
        if data_shards == 0 {
            return Err(ErasureError::InvalidConfig(
                "data_shards must be > 0".into(),
            ));
        }
        check_capacity(data_shards, parity_shards)?;

        let generator = if parity_shards == 0 {
            None
        } else {
            Some(GeneratorMatrix::shared(data_shards, parity_shards)?)
        };
        let products = generator
            .as_deref()
            .map(|g| {
                (0..parity_shards)
                    .flat_map(|j| g.row(j).iter().map(|c| c.mul_row()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            data_shards,
            parity_shards,
            generator,
            products,
        })
    }

    /// Get the number of data shards
    #[must_use]
    pub const fn data_shards(&self) -> usize {
        self.data_shards
    }

    /// Get the number of parity shards
    #[must_use]
    pub const fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    /// Generator in use, `None` when M is zero
    #[must_use]
    pub fn generator(&self) -> Option<&GeneratorMatrix> {
        self.generator.as_deref()
    }

    /// Encode every row of `data` into `ec_out`
    pub fn encode(&self, data: &[u8], ec_out: &mut [u8]) -> Result<(), ErasureError> {
        let rows = self.row_count(data, ec_out)?;
        trace!(
            rows,
            data_shards = self.data_shards,
            parity_shards = self.parity_shards,
            "encoding"
        );
        if rows == 0 || self.parity_shards == 0 {
            return Ok(());
        }

        zip_rows(
            data,
            self.data_shards,
            ec_out,
            self.parity_shards,
            |data_row, parity_row| self.encode_row(data_row, parity_row),
        );
        Ok(())
    }

    fn row_count(&self, data: &[u8], ec_out: &[u8]) -> Result<usize, ErasureError> {
        if !data.len().is_multiple_of(self.data_shards) {
            return Err(ErasureError::InvalidArgument(format!(
                "data length {} is not a multiple of {} data shards",
                data.len(),
                self.data_shards
            )));
        }
        let rows = data.len() / self.data_shards;
        let expected = rows * self.parity_shards;
        if ec_out.len() != expected {
            return Err(ErasureError::InvalidArgument(format!(
                "parity buffer holds {} bytes, expected {expected} for {rows} rows",
                ec_out.len()
            )));
        }
        Ok(rows)
    }

    fn encode_row(&self, data_row: &[u8], parity_row: &mut [u8]) {
        for (out, products) in parity_row
            .iter_mut()
            .zip(self.products.chunks_exact(self.data_shards))
        {
            *out = products
                .iter()
                .zip(data_row)
                .fold(0, |acc, (product, &symbol)| acc ^ product[usize::from(symbol)]);
        }
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("data_shards", &self.data_shards)
            .field("parity_shards", &self.parity_shards)
            .finish_non_exhaustive()
    }
}
