//! Sequential and parallel equality search.
//!
//! Small windows get a single linear scan over block slices. Once the
//! scanned window reaches [`PARALLEL_SEARCH_THRESHOLD`] elements, the
//! window is partitioned into one step-sized chunk per available worker
//! and scanned concurrently over the global work pool; the workers are
//! read-only and their chunks are disjoint. All chunks run to completion
//! and the match from the earliest chunk wins, so the result is always the
//! lowest matching index regardless of scheduling.

use tessera_bits::FastDivisor;
use tessera_common::{Result, result::verify_range};
use tessera_ranges::partition_at;
use tessera_workflow::data_parallel;

use crate::SegmentedList;

/// Window size at which equality scans switch to the parallel path.
pub const PARALLEL_SEARCH_THRESHOLD: u64 = 65_536;

impl<T: PartialEq + Send + Sync> SegmentedList<T> {
    /// Returns the lowest index of an element equal to `value`, or `None`.
    pub fn index_of(&self, value: &T) -> Option<u64> {
        self.search_in(value, 0, self.len)
    }

    /// Searches the window `[start, start + count)` for the lowest index
    /// of an element equal to `value`.
    pub fn index_of_in(&self, value: &T, start: u64, count: u64) -> Result<Option<u64>> {
        verify_range(start, count, self.len)?;
        Ok(self.search_in(value, start, count))
    }

    /// Returns `true` when the list contains an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    fn search_in(&self, value: &T, start: u64, count: u64) -> Option<u64> {
        if count >= PARALLEL_SEARCH_THRESHOLD {
            self.parallel_search(value, start, count)
        } else {
            self.scan_range(value, start, count)
        }
    }

    fn parallel_search(&self, value: &T, start: u64, count: u64) -> Option<u64> {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get() as u64)
            .unwrap_or(8);
        // ceil(count / workers), one chunk per worker
        let (quot, rem) = FastDivisor::new(workers).div_rem(count);
        let step = (quot + u64::from(rem != 0)).max(1);
        let chunks: Vec<_> = partition_at(start, count, step, self.layout).collect();
        // map() preserves chunk order, so the first hit is the lowest index.
        data_parallel::map(Some(workers as usize), chunks, |chunk| {
            let chunk_start = self
                .layout
                .position(chunk.block as usize, chunk.offset as usize);
            self.scan_range(value, chunk_start, chunk.count)
        })
        .flatten()
        .next()
    }
}

impl<T: PartialEq> SegmentedList<T> {
    /// Linear scan of `[start, start + count)` in block-bounded slices.
    fn scan_range(&self, value: &T, start: u64, count: u64) -> Option<u64> {
        let mut pos = start;
        let mut remaining = count;
        while remaining > 0 {
            let block = self.layout.block_index(pos);
            let offset = self.layout.offset(pos);
            let run = (self.layout.remaining_in_block(pos) as u64).min(remaining) as usize;
            let slice = &self.blocks[block][offset..offset + run];
            if let Some(i) = slice.iter().position(|v| v == value) {
                return Some(pos + i as u64);
            }
            pos += run as u64;
            remaining -= run as u64;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::PARALLEL_SEARCH_THRESHOLD;
    use crate::SegmentedList;

    #[test]
    fn test_sequential_index_of() {
        let mut list = SegmentedList::with_block_size(4);
        list.extend([5u32, 3, 7, 3, 9, 1]);
        assert_eq!(list.index_of(&3), Some(1));
        assert_eq!(list.index_of(&1), Some(5));
        assert_eq!(list.index_of(&42), None);
        assert!(list.contains(&9));
        assert!(!list.contains(&0));
    }

    #[test]
    fn test_index_of_in_windows() {
        let mut list = SegmentedList::with_block_size(4);
        list.extend([5u32, 3, 7, 3, 9, 3]);
        assert_eq!(list.index_of_in(&3, 0, 6).unwrap(), Some(1));
        assert_eq!(list.index_of_in(&3, 2, 4).unwrap(), Some(3));
        assert_eq!(list.index_of_in(&3, 4, 1).unwrap(), None);
        assert_eq!(list.index_of_in(&3, 2, 0).unwrap(), None);
        assert!(list.index_of_in(&3, 3, 4).unwrap_err().is_range_error());
        assert!(list.index_of_in(&3, 7, 0).unwrap_err().is_range_error());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let total = PARALLEL_SEARCH_THRESHOLD + 5_000;
        let mut list = SegmentedList::with_block_size(1024);
        let mut rng = fastrand::Rng::with_seed(0x1d0f);
        let values: Vec<u64> = (0..total).map(|_| rng.u64(1000..)).collect();
        list.extend(values.iter().copied());

        for _ in 0..20 {
            let i = rng.usize(0..values.len());
            let needle = values[i];
            let expected = values.iter().position(|v| *v == needle).map(|p| p as u64);
            // full window exceeds the threshold: parallel path
            assert_eq!(list.index_of(&needle), expected);
            // narrow window: sequential path over the same data
            assert_eq!(
                list.index_of_in(&needle, i as u64, 1).unwrap(),
                Some(i as u64)
            );
        }
        // absent value, both paths
        assert_eq!(list.index_of(&1), None);
        assert_eq!(list.index_of_in(&1, 0, 100).unwrap(), None);
    }

    #[test]
    fn test_parallel_returns_lowest_index() {
        let total = (PARALLEL_SEARCH_THRESHOLD + 1_000) as usize;
        let mut values = vec![0u32; total];
        // plant duplicates in different partition chunks
        values[137] = 7;
        values[total / 2] = 7;
        values[total - 1] = 7;
        let list = SegmentedList::from_slice(&values);
        assert_eq!(list.index_of(&7), Some(137));
    }

    #[test]
    fn test_search_window_on_parallel_sized_list() {
        let total = PARALLEL_SEARCH_THRESHOLD * 2;
        let list: SegmentedList<u64> = (0..total).collect();
        // window above the threshold starting mid-list
        let found = list
            .index_of_in(&(total - 10), total / 2, total - total / 2)
            .unwrap();
        assert_eq!(found, Some(total - 10));
        // value outside the window is not reported
        assert_eq!(list.index_of_in(&5, total / 2, 1000).unwrap(), None);
    }
}
