//! In-place recovery of erased data columns
//!
//! Before decoding, the caller overwrites every erased data column with the
//! parity shard paired with it in the pattern. Each row of the buffer then
//! equals `D * original_row`, where `D` is the K x K identity with row
//! `data_index` replaced by generator row `ec_index` for every pair. The
//! decoder inverts `D` once and recomputes only the erased columns of every
//! row; all other bytes are left as they are.

use crate::ErasureError;
use crate::generator::{GeneratorMatrix, check_capacity};
use crate::gf256::MulRow;
use crate::index::{ErasureIndex, validate_pattern};
use crate::matrix::Matrix;
use crate::rows::for_each_row;
use parityio_common::MAX_TOTAL_SHARDS;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Recover the erased columns of `buffer` in place
///
/// The parity count is not needed here: any parity index the field can
/// represent for this K is accepted, since generator rows depend only on K
/// and their position. Use [`Decoder`] to enforce a specific M.
pub fn decode(
    buffer: &mut [u8],
    data_shards: usize,
    indexes: &[ErasureIndex],
) -> Result<(), ErasureError> {
    if data_shards == 0 {
        return Err(ErasureError::InvalidConfig(
            "data_shards must be > 0".into(),
        ));
    }
    check_capacity(data_shards, 0)?;
    Decoder::new(data_shards, MAX_TOTAL_SHARDS - data_shards)?.decode(buffer, indexes)
}

/// Decoder bound to one (K, M) shape
#[derive(Clone, Debug)]
pub struct Decoder {
    data_shards: usize,
    parity_shards: usize,
    generator: Option<Arc<GeneratorMatrix>>,
}

impl Decoder {
    /// Create a decoder for K data and M parity shards
    ///
    /// With M equal to zero only the empty pattern is accepted.
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
        Ok(Self {
            data_shards,
            parity_shards,
            generator,
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

    /// Rows of `D^-1` that rebuild the erased columns, in pattern order
    ///
    /// Row `n` of the result, applied to a substituted buffer row, yields the
    /// original symbol of `indexes[n].data_index`.
    pub fn recovery_matrix(&self, indexes: &[ErasureIndex]) -> Result<Matrix, ErasureError> {
        validate_pattern(indexes, self.data_shards, self.parity_shards)?;
        let generator = match &self.generator {
            Some(generator) if !indexes.is_empty() => generator,
            _ => return Ok(Matrix::zeros(0, self.data_shards)),
        };

        let mut decode_matrix = Matrix::identity(self.data_shards);
        for index in indexes {
            decode_matrix.set_row(index.data_index, generator.row(index.ec_index));
        }

        let inverse = decode_matrix.invert().inspect_err(|e| {
            warn!(
                data_shards = self.data_shards,
                parity_shards = self.parity_shards,
                erasures = indexes.len(),
                error = %e,
                "decode matrix is singular"
            );
        })?;
        debug!(
            data_shards = self.data_shards,
            erasures = indexes.len(),
            "inverted decode matrix"
        );

        let targets: Vec<usize> = indexes.iter().map(|i| i.data_index).collect();
        Ok(inverse.select_rows(&targets))
    }

    /// Recover the erased columns of `buffer` in place
    ///
    /// Every check runs before the buffer is touched, so on error the
    /// buffer is unchanged.
    pub fn decode(&self, buffer: &mut [u8], indexes: &[ErasureIndex]) -> Result<(), ErasureError> {
        let k = self.data_shards;
        if !buffer.len().is_multiple_of(k) {
            return Err(ErasureError::InvalidArgument(format!(
                "buffer length {} is not a multiple of {k} data shards",
                buffer.len()
            )));
        }
        let recovery = self.recovery_matrix(indexes)?;
        if indexes.is_empty() || buffer.is_empty() {
            return Ok(());
        }
        trace!(
            rows = buffer.len() / k,
            data_shards = k,
            erasures = indexes.len(),
            "decoding"
        );

        let products: Vec<&'static MulRow> = (0..recovery.rows())
            .flat_map(|r| recovery.row(r).iter().map(|c| c.mul_row()))
            .collect();
        let targets: Vec<usize> = indexes.iter().map(|i| i.data_index).collect();

        for_each_row(buffer, k, |row| {
            // At most 254 erasures fit beside a single data shard
            let mut recovered = [0u8; MAX_TOTAL_SHARDS];
            for (slot, products) in recovered.iter_mut().zip(products.chunks_exact(k)) {
                *slot = products
                    .iter()
                    .zip(row.iter())
                    .fold(0, |acc, (product, &symbol)| acc ^ product[usize::from(symbol)]);
            }
            for (&target, &value) in targets.iter().zip(&recovered) {
                row[target] = value;
            }
        });
        Ok(())
    }
}
