//! Shard layout helpers
//!
//! The engine works on row-major buffers: row `r` of a buffer with stride
//! `S` holds byte `r` of each of the `S` shards. These helpers convert
//! between that layout and one buffer per shard.

use crate::ErasureError;
use crate::index::{ErasureIndex, validate_pattern};

fn check_stride(len: usize, stride: usize) -> Result<usize, ErasureError> {
    if stride == 0 {
        return Err(ErasureError::InvalidConfig("stride must be > 0".into()));
    }
    if !len.is_multiple_of(stride) {
        return Err(ErasureError::InvalidArgument(format!(
            "buffer length {len} is not a multiple of stride {stride}"
        )));
    }
    Ok(len / stride)
}

fn check_column(column: usize, stride: usize) -> Result<(), ErasureError> {
    if column >= stride {
        return Err(ErasureError::InvalidArgument(format!(
            "column {column} out of range for stride {stride}"
        )));
    }
    Ok(())
}

/// Copy one shard (column) out of a row-major buffer
pub fn gather(buffer: &[u8], stride: usize, column: usize) -> Result<Vec<u8>, ErasureError> {
    check_stride(buffer.len(), stride)?;
    check_column(column, stride)?;
    Ok(buffer.chunks_exact(stride).map(|row| row[column]).collect())
}

/// Write one shard (column) into a row-major buffer
pub fn scatter(
    buffer: &mut [u8],
    stride: usize,
    column: usize,
    shard: &[u8],
) -> Result<(), ErasureError> {
    let rows = check_stride(buffer.len(), stride)?;
    check_column(column, stride)?;
    if shard.len() != rows {
        return Err(ErasureError::ShardSizeMismatch);
    }
    for (row, &byte) in buffer.chunks_exact_mut(stride).zip(shard) {
        row[column] = byte;
    }
    Ok(())
}

/// Build a row-major buffer from equally sized shards
pub fn interleave<S: AsRef<[u8]>>(shards: &[S]) -> Result<Vec<u8>, ErasureError> {
    let Some(first) = shards.first() else {
        return Ok(Vec::new());
    };
    let rows = first.as_ref().len();
    if shards.iter().any(|s| s.as_ref().len() != rows) {
        return Err(ErasureError::ShardSizeMismatch);
    }

    let stride = shards.len();
    let mut buffer = vec![0u8; rows * stride];
    for (column, shard) in shards.iter().enumerate() {
        for (row, &byte) in buffer.chunks_exact_mut(stride).zip(shard.as_ref()) {
            row[column] = byte;
        }
    }
    Ok(buffer)
}

/// Split a row-major buffer into one buffer per shard
pub fn deinterleave(buffer: &[u8], stride: usize) -> Result<Vec<Vec<u8>>, ErasureError> {
    let rows = check_stride(buffer.len(), stride)?;
    let mut shards = vec![Vec::with_capacity(rows); stride];
    for row in buffer.chunks_exact(stride) {
        for (shard, &byte) in shards.iter_mut().zip(row) {
            shard.push(byte);
        }
    }
    Ok(shards)
}

/// Overwrite each erased data column with its paired parity shard
///
/// This is the substitution a caller performs before an in-place decode.
/// `data` has stride K and `parity` stride M; both must describe the same
/// number of rows.
pub fn substitute_parity(
    data: &mut [u8],
    data_shards: usize,
    parity: &[u8],
    parity_shards: usize,
    indexes: &[ErasureIndex],
) -> Result<(), ErasureError> {
    validate_pattern(indexes, data_shards, parity_shards)?;
    if indexes.is_empty() {
        return Ok(());
    }
    let rows = check_stride(data.len(), data_shards)?;
    let parity_rows = check_stride(parity.len(), parity_shards)?;
    if rows != parity_rows {
        return Err(ErasureError::InvalidArgument(format!(
            "data has {rows} rows but parity has {parity_rows}"
        )));
    }

    for (row, parity_row) in data
        .chunks_exact_mut(data_shards)
        .zip(parity.chunks_exact(parity_shards))
    {
        for index in indexes {
            row[index.data_index] = parity_row[index.ec_index];
        }
    }
    Ok(())
}
