//! ParityIO Erasure Coding - GF(256) erasure coding engine
//!
//! Given K data shards, the encoder computes M parity shards such that any
//! K of the K + M shards reconstruct the data:
//!
//! - **Field**: GF(256) over x^8 + x^4 + x^3 + x^2 + 1 with lookup tables
//! - **Generator**: normalized Cauchy matrix, MDS for every K + M <= 255
//! - **Encode**: one matrix-vector product per row of data
//! - **Decode**: invert the substituted decode matrix once, then recompute
//!   only the erased columns of every row, in place
//!
//! # Buffer layout
//!
//! The core [`encode`] and [`decode`] operate on flat, row-major buffers.
//! Row `r` of a data buffer holds byte `r` of each of the K data shards.
//! Before decoding, the caller writes each surviving parity symbol into the
//! column of the data shard it replaces, as named by an [`ErasureIndex`].
//! [`ErasureCodec`] layers a shard-per-buffer API on top.
//!
//! # Example
//!
//! ```
//! use parityio_erasure::{decode, encode, ErasureIndex};
//!
//! let data = [1u8, 2, 3, 4, 5, 6, 7, 8]; // two rows, K = 4
//! let mut parity = [0u8; 4]; // two rows, M = 2
//! encode(&data, &mut parity, 4, 2).unwrap();
//!
//! // Lose data column 1 and replace it with parity shard 0
//! let mut buffer = data;
//! buffer[1] = parity[0];
//! buffer[5] = parity[2];
//! decode(&mut buffer, 4, &[ErasureIndex::new(1, 0)]).unwrap();
//! assert_eq!(buffer, data);
//! ```

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod generator;
pub mod gf256;
pub mod index;
pub mod matrix;
mod rows;
pub mod shard;

pub use codec::{ErasureCodec, ErasureError};
pub use decoder::{Decoder, decode};
pub use encoder::{Encoder, encode};
pub use generator::GeneratorMatrix;
pub use gf256::Gf256;
pub use index::{ErasureIndex, validate_pattern};
pub use matrix::Matrix;
pub use rows::PARALLEL_ROW_THRESHOLD;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        Decoder, Encoder, ErasureCodec, ErasureError, ErasureIndex, decode, encode,
    };
}
