//! Translation of absolute position ranges into block-relative descriptors.

use std::ops::Range;

use tessera_bits::BlockLayout;

use crate::RangeIteratorsExt;

/// A run of logical elements described relative to a block grid: the run
/// holds `count` consecutive elements and begins at `offset` within `block`.
///
/// A run longer than the space left in its starting block rolls over into
/// the following block(s); the descriptor records where the run starts.
/// Consecutive descriptors produced by [`partition`] never overlap and
/// together cover the requested span exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// Index of the block in which the run starts.
    pub block: u64,
    /// Offset of the run's first element within that block.
    pub offset: u64,
    /// Number of elements in the run.
    pub count: u64,
}

impl BlockRange {
    pub fn new(block: u64, offset: u64, count: u64) -> BlockRange {
        BlockRange {
            block,
            offset,
            count,
        }
    }
}

/// An iterator adapter mapping absolute `Range<u64>` position ranges to
/// [`BlockRange`] descriptors for blocks of `1 << shift` elements.
#[derive(Debug, Clone)]
pub struct BlockRangesIter<I>
where
    I: Iterator<Item = Range<u64>>,
{
    inner: I,
    shift: u32,
    mask: u64,
}

impl<I> BlockRangesIter<I>
where
    I: Iterator<Item = Range<u64>>,
{
    pub fn new(inner: I, shift: u32) -> Self {
        Self {
            inner,
            shift,
            mask: (1u64 << shift) - 1,
        }
    }
}

impl<I> Iterator for BlockRangesIter<I>
where
    I: Iterator<Item = Range<u64>>,
{
    type Item = BlockRange;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.inner.next()?;
        Some(BlockRange {
            block: range.start >> self.shift,
            offset: range.start & self.mask,
            count: range.end.saturating_sub(range.start),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Partitions `total` logical elements, starting at the first slot of
/// `start_block`, into step-sized [`BlockRange`] runs.
///
/// Each run holds `min(step, items remaining)` elements, so the final run is
/// short when `step` does not divide `total`. Run item counts always sum to
/// exactly `total`. When `step` equals the block size the runs degenerate to
/// one block per descriptor.
pub fn partition(
    start_block: u64,
    total: u64,
    step: u64,
    layout: BlockLayout,
) -> impl Iterator<Item = BlockRange> {
    let start = start_block << layout.shift();
    partition_at(start, total, step, layout)
}

/// Partitions the span of `total` elements beginning at absolute position
/// `start_pos` into step-sized [`BlockRange`] runs.
///
/// Same contract as [`partition`], but the span may begin mid-block; used
/// for index-bounded sub-range scans.
pub fn partition_at(
    start_pos: u64,
    total: u64,
    step: u64,
    layout: BlockLayout,
) -> impl Iterator<Item = BlockRange> {
    std::iter::once(start_pos..start_pos + total)
        .filter(|r| !r.is_empty())
        .step_ranges(step)
        .to_block_ranges(layout.shift())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(start_block: u64, total: u64, step: u64, block_size: usize) -> Vec<BlockRange> {
        partition(start_block, total, step, BlockLayout::new(block_size)).collect()
    }

    #[test]
    fn test_step_not_dividing_block_size() {
        // Runs of 3 over blocks of 2: the starting offset alternates as runs
        // roll across block boundaries, and the final run is short.
        let runs = collect(0, 10, 3, 2);
        assert_eq!(
            runs,
            vec![
                BlockRange::new(0, 0, 3),
                BlockRange::new(1, 1, 3),
                BlockRange::new(3, 0, 3),
                BlockRange::new(4, 1, 1),
            ]
        );
        assert_eq!(runs.iter().map(|r| r.count).sum::<u64>(), 10);
    }

    #[test]
    fn test_large_step_over_large_blocks() {
        let runs = collect(0, 333, 109, 128);
        assert_eq!(
            runs,
            vec![
                BlockRange::new(0, 0, 109),
                BlockRange::new(0, 109, 109),
                BlockRange::new(1, 90, 109),
                BlockRange::new(2, 71, 6),
            ]
        );
        assert_eq!(runs.iter().map(|r| r.count).sum::<u64>(), 333);
    }

    #[test]
    fn test_step_equal_to_block_size_degenerates_to_blocks() {
        let runs = collect(0, 512, 128, 128);
        assert_eq!(runs.len(), 4);
        for (i, r) in runs.iter().enumerate() {
            assert_eq!(*r, BlockRange::new(i as u64, 0, 128));
        }
    }

    #[test]
    fn test_nonzero_start_block() {
        let runs = collect(5, 7, 4, 4);
        assert_eq!(
            runs,
            vec![BlockRange::new(5, 0, 4), BlockRange::new(6, 0, 3)]
        );
    }

    #[test]
    fn test_partition_at_mid_block() {
        let layout = BlockLayout::new(4);
        let runs: Vec<BlockRange> = partition_at(6, 5, 2, layout).collect();
        assert_eq!(
            runs,
            vec![
                BlockRange::new(1, 2, 2),
                BlockRange::new(2, 0, 2),
                BlockRange::new(2, 2, 1),
            ]
        );
    }

    #[test]
    fn test_empty_span() {
        assert_eq!(collect(0, 0, 16, 16), vec![]);
    }

    #[test]
    fn test_step_larger_than_total() {
        let runs = collect(0, 5, 100, 8);
        assert_eq!(runs, vec![BlockRange::new(0, 0, 5)]);
    }
}
