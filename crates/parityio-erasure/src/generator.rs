//! Generator matrix construction
//!
//! The M x K generator is a column-normalized Cauchy matrix over K + M
//! distinct nonzero points, `y_i = i + 1` for data columns and
//! `x_j = K + 1 + j` for parity rows:
//!
//! ```text
//! g[j][i] = (y_i + x_0) / (x_j + y_i)
//! ```
//!
//! Every square submatrix of a Cauchy matrix is nonsingular and scaling a
//! column by a nonzero constant keeps it that way, so each decode matrix
//! built from this generator is invertible (the MDS property). The
//! normalization makes parity row 0 all ones, i.e. plain XOR parity.
//!
//! Row `j` depends only on K and `j`, so the generator for (K, M) is a prefix
//! of the generator for any (K, M') with M' >= M.

use crate::ErasureError;
use crate::gf256::Gf256;
use crate::matrix::Matrix;
use parityio_common::MAX_TOTAL_SHARDS;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// An M x K generator matrix with the MDS property
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorMatrix {
    data_shards: usize,
    parity_shards: usize,
    matrix: Matrix,
}

impl GeneratorMatrix {
    /// Build the generator for `data_shards` (K) and `parity_shards` (M)
    ///
    /// Fails with [`ErasureError::InvalidConfig`] when K or M is zero, or
    /// when K + M exceeds the 255 nonzero elements of the field.
    pub fn build(data_shards: usize, parity_shards: usize) -> Result<Self, ErasureError> {
        if data_shards == 0 {
            return Err(ErasureError::InvalidConfig(
                "data_shards must be > 0".into(),
            ));
        }
        if parity_shards == 0 {
            return Err(ErasureError::InvalidConfig(
                "parity_shards must be > 0".into(),
            ));
        }
        check_capacity(data_shards, parity_shards)?;

        let x0 = point(data_shards + 1);
        let mut matrix = Matrix::zeros(parity_shards, data_shards);
        for j in 0..parity_shards {
            let x = point(data_shards + 1 + j);
            for i in 0..data_shards {
                let y = point(i + 1);
                matrix.set(j, i, (y + x0).divide(x + y)?);
            }
        }

        Ok(Self {
            data_shards,
            parity_shards,
            matrix,
        })
    }

    /// Shared, process-wide instance for (K, M)
    ///
    /// The first request for a shape builds the matrix; later requests get
    /// the same `Arc`.
    pub fn shared(data_shards: usize, parity_shards: usize) -> Result<Arc<Self>, ErasureError> {
        let key = (data_shards, parity_shards);
        if let Some(generator) = cache().read().get(&key) {
            return Ok(Arc::clone(generator));
        }

        let built = Arc::new(Self::build(data_shards, parity_shards)?);
        debug!(data_shards, parity_shards, "built generator matrix");

        let mut cache = cache().write();
        Ok(Arc::clone(cache.entry(key).or_insert(built)))
    }

    /// Number of data shards (K)
    #[must_use]
    pub const fn data_shards(&self) -> usize {
        self.data_shards
    }

    /// Number of parity shards (M)
    #[must_use]
    pub const fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    /// The underlying M x K matrix
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Coefficients producing parity shard `parity_index`
    #[must_use]
    pub fn row(&self, parity_index: usize) -> &[Gf256] {
        self.matrix.row(parity_index)
    }

    /// Coefficient of data shard `data_index` in parity shard `parity_index`
    #[must_use]
    pub fn coefficient(&self, parity_index: usize, data_index: usize) -> Gf256 {
        self.matrix.get(parity_index, data_index)
    }
}

/// Reject shapes that need more distinct points than GF(256) has
pub(crate) fn check_capacity(data_shards: usize, parity_shards: usize) -> Result<(), ErasureError> {
    if data_shards
        .checked_add(parity_shards)
        .is_none_or(|total| total > MAX_TOTAL_SHARDS)
    {
        return Err(ErasureError::InvalidConfig(format!(
            "total shards must be <= {MAX_TOTAL_SHARDS}, got {data_shards} + {parity_shards}"
        )));
    }
    Ok(())
}

/// Evaluation point for a shard; callers stay within `1..=MAX_TOTAL_SHARDS`
fn point(value: usize) -> Gf256 {
    debug_assert!((1..=MAX_TOTAL_SHARDS).contains(&value));
    Gf256::new(value as u8)
}

type GeneratorCache = RwLock<HashMap<(usize, usize), Arc<GeneratorMatrix>>>;

fn cache() -> &'static GeneratorCache {
    static CACHE: OnceLock<GeneratorCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}
