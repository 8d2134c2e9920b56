//! Row drivers
//!
//! Rows never interact, so large buffers can be split across the rayon pool
//! when the `parallel` feature is enabled. Sequential and parallel runs
//! produce identical output.

/// Row count at which encode and decode switch to the rayon pool
pub const PARALLEL_ROW_THRESHOLD: usize = 1 << 12;

/// Call `f` on each pair of corresponding input and output rows
pub(crate) fn zip_rows<F>(
    input: &[u8],
    input_stride: usize,
    output: &mut [u8],
    output_stride: usize,
    f: F,
) where
    F: Fn(&[u8], &mut [u8]) + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if input.len() / input_stride >= PARALLEL_ROW_THRESHOLD {
            use rayon::prelude::*;
            input
                .par_chunks_exact(input_stride)
                .zip(output.par_chunks_exact_mut(output_stride))
                .for_each(|(row, out)| f(row, out));
            return;
        }
    }

    for (row, out) in input
        .chunks_exact(input_stride)
        .zip(output.chunks_exact_mut(output_stride))
    {
        f(row, out);
    }
}

/// Call `f` on each row of `buffer` in place
pub(crate) fn for_each_row<F>(buffer: &mut [u8], stride: usize, f: F)
where
    F: Fn(&mut [u8]) + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if buffer.len() / stride >= PARALLEL_ROW_THRESHOLD {
            use rayon::prelude::*;
            buffer.par_chunks_exact_mut(stride).for_each(|row| f(row));
            return;
        }
    }

    for row in buffer.chunks_exact_mut(stride) {
        f(row);
    }
}
