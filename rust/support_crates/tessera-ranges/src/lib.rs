//! Iterator adapters for partitioning logical element spans.
//!
//! This crate provides the range arithmetic that both the chunked copy/shift
//! paths and the parallel scan fan-out of the segmented collections are built
//! on. Spans are expressed as `Range<u64>` of logical positions; adapters
//! split them into step-sized runs and translate absolute positions into
//! block-relative [`BlockRange`] descriptors.
//!
//! # Provided adapters
//!
//! - [`SteppedRanges`]: splits each input range into subranges of at most a
//!   given number of items.
//! - [`BlockRangesIter`]: maps absolute ranges to `(block, offset, count)`
//!   descriptors for a power-of-two block size.
//!
//! The [`RangeIteratorsExt`] trait is implemented for all iterators over
//! `Range<u64>`, providing convenient methods to construct these adapters.

pub mod block_ranges;
pub mod step;

pub use block_ranges::{BlockRange, BlockRangesIter, partition, partition_at};
pub use step::SteppedRanges;

use std::ops::Range;

/// Extension trait for more idiomatic usage of the range iterator adapters.
pub trait RangeIteratorsExt: Iterator<Item = Range<u64>> + Sized {
    /// Adapts an iterator of `Range<u64>` to yield consecutive runs of at
    /// most `step` items each.
    ///
    /// # Panics
    ///
    /// Panics if `step` is 0.
    fn step_ranges(self, step: u64) -> SteppedRanges<Self> {
        SteppedRanges::new(self, step)
    }

    /// Adapts an iterator of absolute `Range<u64>` ranges to yield
    /// [`BlockRange`] descriptors for blocks of `1 << shift` elements.
    fn to_block_ranges(self, shift: u32) -> BlockRangesIter<Self> {
        BlockRangesIter::new(self, shift)
    }
}

impl<I: Iterator<Item = Range<u64>>> RangeIteratorsExt for I {}
