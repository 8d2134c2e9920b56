//! Shard-level encoder/decoder
//!
//! `ErasureCodec` splits an object into K data shards, computes M parity
//! shards and rebuilds any missing shards from K survivors. It is a thin
//! layer over the row-major [`Encoder`] and [`Decoder`]: shards are
//! interleaved into rows, processed, and split again.
//!
//! ```
//! use parityio_erasure::ErasureCodec;
//! use parityio_common::ErasureConfig;
//!
//! let codec = ErasureCodec::new(ErasureConfig::new(4, 2)).unwrap();
//! let data = b"Hello, World!";
//! let shards = codec.encode(data).unwrap();
//!
//! let mut received: Vec<_> = shards.into_iter().map(Some).collect();
//! received[0] = None;
//! received[5] = None;
//! assert_eq!(codec.decode(&mut received, data.len()).unwrap(), data);
//! ```

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::index::ErasureIndex;
use crate::shard::{deinterleave, gather, interleave, scatter};
use bytes::Bytes;
use parityio_common::{ErasureConfig, Error as CommonError, Result};
use thiserror::Error;
use tracing::debug;

/// Errors specific to erasure coding operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErasureError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid erasure pattern: {0}")]
    InvalidErasurePattern(String),

    #[error("unrecoverable erasure: decode matrix is singular at column {column}")]
    UnrecoverableErasure { column: usize },

    #[error("field domain error: {0}")]
    Domain(&'static str),

    #[error("insufficient shards: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("shard size mismatch")]
    ShardSizeMismatch,
}

impl From<ErasureError> for CommonError {
    fn from(e: ErasureError) -> Self {
        match e {
            ErasureError::InvalidConfig(msg) => Self::Configuration(msg),
            ErasureError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            ErasureError::InsufficientShards {
                available,
                required,
            } => Self::InsufficientShards {
                available,
                required,
            },
            other => Self::ErasureCoding(other.to_string()),
        }
    }
}

/// Erasure codec over separate shard buffers
///
/// Any K of the K + M shards produced by [`ErasureCodec::encode`] are
/// enough to rebuild the rest.
#[derive(Clone, Debug)]
pub struct ErasureCodec {
    config: ErasureConfig,
    encoder: Encoder,
    decoder: Decoder,
}

impl ErasureCodec {
    /// Create a new erasure codec with the given configuration
    pub fn new(config: ErasureConfig) -> Result<Self> {
        config.validate()?;
        if config.parity_shards == 0 {
            return Err(ErasureError::InvalidConfig("parity_shards must be > 0".into()).into());
        }

        let k = usize::from(config.data_shards);
        let m = usize::from(config.parity_shards);
        Ok(Self {
            config,
            encoder: Encoder::new(k, m)?,
            decoder: Decoder::new(k, m)?,
        })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> ErasureConfig {
        self.config
    }

    /// Get the number of data shards
    #[must_use]
    pub const fn data_shards(&self) -> usize {
        self.encoder.data_shards()
    }

    /// Get the number of parity shards
    #[must_use]
    pub const fn parity_shards(&self) -> usize {
        self.encoder.parity_shards()
    }

    /// Get the total number of shards (data + parity)
    #[must_use]
    pub const fn total_shards(&self) -> usize {
        self.data_shards() + self.parity_shards()
    }

    /// Encode data into K data shards and M parity shards
    ///
    /// The input is zero padded to a multiple of K and split into K
    /// contiguous chunks of `ceil(len / K)` bytes (at least one byte each).
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Bytes>> {
        let k = self.data_shards();
        let shard_size = data.len().div_ceil(k).max(1);

        let mut padded = vec![0u8; shard_size * k];
        padded[..data.len()].copy_from_slice(data);
        let padded = Bytes::from(padded);

        let mut shards: Vec<Bytes> = (0..k)
            .map(|i| padded.slice(i * shard_size..(i + 1) * shard_size))
            .collect();
        let parity = self.compute_parity(&shards)?;
        shards.extend(parity.into_iter().map(Bytes::from));

        debug!(
            size = data.len(),
            shard_size,
            shards = shards.len(),
            "encoded object"
        );
        Ok(shards)
    }

    /// Rebuild every missing shard, data and parity, in place
    ///
    /// `shards` holds K + M entries with `None` for lost shards. At least K
    /// must be present and all present shards must have the same size.
    pub fn reconstruct(&self, shards: &mut [Option<Bytes>]) -> Result<()> {
        self.reconstruct_data(shards)?;

        let k = self.data_shards();
        if shards[k..].iter().all(Option::is_some) {
            return Ok(());
        }
        let data: Vec<Bytes> = shards[..k].iter().flatten().cloned().collect();
        let parity = self.compute_parity(&data)?;
        for (slot, computed) in shards[k..].iter_mut().zip(parity) {
            if slot.is_none() {
                *slot = Some(Bytes::from(computed));
            }
        }
        Ok(())
    }

    /// Decode shards back to original data
    ///
    /// Missing data shards are rebuilt in place; missing parity shards are
    /// left as they are.
    pub fn decode(&self, shards: &mut [Option<Bytes>], original_size: usize) -> Result<Vec<u8>> {
        let shard_size = self.reconstruct_data(shards)?;
        let k = self.data_shards();
        if original_size > shard_size * k {
            return Err(ErasureError::InvalidArgument(format!(
                "original size {original_size} exceeds {} encoded bytes",
                shard_size * k
            ))
            .into());
        }

        let mut output = Vec::with_capacity(shard_size * k);
        for shard in shards[..k].iter().flatten() {
            output.extend_from_slice(shard);
        }
        output.truncate(original_size);
        Ok(output)
    }

    /// Verify that shards are consistent
    ///
    /// Re-encodes the data shards and compares the result with the parity
    /// shards.
    pub fn verify(&self, shards: &[Bytes]) -> Result<bool> {
        if shards.len() != self.total_shards() {
            return Ok(false);
        }
        let Some(first_len) = shards.first().map(Bytes::len) else {
            return Ok(false);
        };
        if shards.iter().any(|s| s.len() != first_len) {
            return Ok(false);
        }

        let k = self.data_shards();
        let parity = self.compute_parity(&shards[..k])?;
        Ok(parity
            .iter()
            .zip(&shards[k..])
            .all(|(computed, stored)| computed[..] == stored[..]))
    }

    /// Parity shards for K equally sized data shards
    fn compute_parity(&self, data: &[Bytes]) -> Result<Vec<Vec<u8>>> {
        let rows = interleave(data)?;
        let mut parity = vec![0u8; rows.len() / self.data_shards() * self.parity_shards()];
        self.encoder.encode(&rows, &mut parity)?;
        Ok(deinterleave(&parity, self.parity_shards())?)
    }

    /// Restore missing data shards; returns the shard size
    fn reconstruct_data(&self, shards: &mut [Option<Bytes>]) -> Result<usize> {
        let k = self.data_shards();
        if shards.len() != self.total_shards() {
            return Err(ErasureError::InvalidArgument(format!(
                "expected {} shards, got {}",
                self.total_shards(),
                shards.len()
            ))
            .into());
        }

        let available = shards.iter().filter(|s| s.is_some()).count();
        if available < k {
            return Err(ErasureError::InsufficientShards {
                available,
                required: k,
            }
            .into());
        }
        let mut present = shards.iter().flatten().map(Bytes::len);
        let shard_size = present.next().unwrap_or_default();
        if present.any(|len| len != shard_size) {
            return Err(ErasureError::ShardSizeMismatch.into());
        }

        // Pair lost data columns with surviving parity shards in order;
        // `available >= k` guarantees there are enough of them.
        let missing = (0..k).filter(|&i| shards[i].is_none());
        let survivors = (0..self.parity_shards()).filter(|&j| shards[k + j].is_some());
        let indexes: Vec<ErasureIndex> = missing.zip(survivors).map(ErasureIndex::from).collect();
        if indexes.is_empty() {
            return Ok(shard_size);
        }

        let zeros = vec![0u8; shard_size];
        let columns: Vec<&[u8]> = shards[..k]
            .iter()
            .map(|s| s.as_deref().unwrap_or(zeros.as_slice()))
            .collect();
        let mut rows = interleave(&columns)?;
        for index in &indexes {
            if let Some(parity) = &shards[k + index.ec_index] {
                scatter(&mut rows, k, index.data_index, parity)?;
            }
        }

        self.decoder.decode(&mut rows, &indexes)?;
        for index in &indexes {
            shards[index.data_index] = Some(Bytes::from(gather(&rows, k, index.data_index)?));
        }
        debug!(recovered = indexes.len(), shard_size, "reconstructed data shards");
        Ok(shard_size)
    }
}

impl Default for ErasureCodec {
    fn default() -> Self {
        Self::new(ErasureConfig::default()).expect("default config is valid")
    }
}
