//! Chunk-boundary arithmetic for bounded-memory streaming.
//!
//! A block of `total` samples is partitioned into half-open ranges of
//! `chunk` samples each; the final range absorbs the remainder. Holding one
//! range of all channels at a time keeps memory use independent of block
//! length.

/// Compute the chunk boundaries over `[0, total)`.
///
/// Returns a strictly increasing sequence `[0, chunk, 2·chunk, …, total]`.
/// Every interior gap equals `chunk`; the last gap holds `total mod chunk`
/// samples unless `total` is an exact multiple, in which case there is no
/// undersized trailing range. `total = 0` yields `[0]` (zero ranges), and
/// `total < chunk` yields `[0, total]` (one range covering the whole block).
///
/// # Panics
///
/// Panics if `chunk == 0` (rejected earlier by config validation).
///
/// # Examples
///
/// ```
/// use edfconv::chunk::chunk_boundaries;
///
/// assert_eq!(chunk_boundaries(10_000, 3000), vec![0, 3000, 6000, 9000, 10_000]);
/// assert_eq!(chunk_boundaries(9000, 3000), vec![0, 3000, 6000, 9000]);
/// assert_eq!(chunk_boundaries(100, 3000), vec![0, 100]);
/// ```
pub fn chunk_boundaries(total: usize, chunk: usize) -> Vec<usize> {
    assert!(chunk > 0, "chunk size must be positive");

    let trimmed = total - total % chunk;
    let mut bounds: Vec<usize> = (0..=trimmed).step_by(chunk).collect();
    bounds.push(total);
    // An exact multiple appends `total` twice.
    bounds.dedup();
    bounds
}

/// Iterate the half-open `(start, stop)` ranges a boundary list defines.
pub fn chunk_ranges(bounds: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    bounds.windows(2).map(|w| (w[0], w[1]))
}
