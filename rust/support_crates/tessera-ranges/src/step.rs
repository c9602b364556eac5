//! An iterator adapter that splits ranges into step-sized runs.

use std::ops::Range;

/// An iterator adapter that splits ranges from an underlying iterator into
/// consecutive runs of at most `step` items.
///
/// Given an iterator yielding `Range<u64>`, this adapter yields `Range<u64>`
/// such that no output range is longer than `step`. An input range that does
/// not divide evenly produces a short final run. Empty input ranges are
/// passed through as-is.
#[derive(Debug, Clone)]
pub struct SteppedRanges<I>
where
    I: Iterator<Item = Range<u64>>,
{
    /// The underlying iterator of ranges.
    inner: I,
    /// Maximum number of items per output run.
    step: u64,
    /// The unconsumed remainder of the range being split.
    remainder: Range<u64>,
}

impl<I> SteppedRanges<I>
where
    I: Iterator<Item = Range<u64>>,
{
    /// Creates a new `SteppedRanges` iterator.
    ///
    /// # Panics
    ///
    /// Panics if `step` is 0, as no progress could be made.
    pub fn new(inner: I, step: u64) -> Self {
        assert!(step != 0, "step must be greater than 0");
        Self {
            inner,
            step,
            remainder: 0..0,
        }
    }
}

impl<I> Iterator for SteppedRanges<I>
where
    I: Iterator<Item = Range<u64>>,
{
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remainder.is_empty() {
            self.remainder = self.inner.next()?;
        }

        let remainder = std::mem::replace(&mut self.remainder, 0..0);
        let len = remainder.end.saturating_sub(remainder.start);
        if len <= self.step {
            Some(remainder)
        } else {
            let split = remainder.start + self.step;
            self.remainder = split..remainder.end;
            Some(remainder.start..split)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::RangeIteratorsExt;
    use std::ops::Range;

    #[test]
    fn test_even_split() {
        let runs: Vec<Range<u64>> = vec![0..20].into_iter().step_ranges(10).collect();
        assert_eq!(runs, vec![0..10, 10..20]);
    }

    #[test]
    fn test_short_final_run() {
        let runs: Vec<Range<u64>> = vec![0..10].into_iter().step_ranges(3).collect();
        assert_eq!(runs, vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn test_multiple_inputs() {
        let runs: Vec<Range<u64>> = vec![10..20, 40..45, 50..51]
            .into_iter()
            .step_ranges(4)
            .collect();
        assert_eq!(runs, vec![10..14, 14..18, 18..20, 40..44, 44..45, 50..51]);
    }

    #[test]
    fn test_ranges_not_exceeding_step_pass_through() {
        let runs: Vec<Range<u64>> = vec![0..5, 7..7, 9..12]
            .into_iter()
            .step_ranges(5)
            .collect();
        assert_eq!(runs, vec![0..5, 7..7, 9..12]);
    }

    #[test]
    fn test_empty_input() {
        let runs: Vec<Range<u64>> = Vec::<Range<u64>>::new()
            .into_iter()
            .step_ranges(8)
            .collect();
        assert!(runs.is_empty());
    }

    #[test]
    fn test_step_of_one() {
        let runs: Vec<Range<u64>> = vec![3..6].into_iter().step_ranges(1).collect();
        assert_eq!(runs, vec![3..4, 4..5, 5..6]);
    }

    #[test]
    fn test_near_u64_max() {
        let runs: Vec<Range<u64>> = vec![(u64::MAX - 15)..u64::MAX]
            .into_iter()
            .step_ranges(10)
            .collect();
        assert_eq!(
            runs,
            vec![(u64::MAX - 15)..(u64::MAX - 5), (u64::MAX - 5)..u64::MAX]
        );
    }

    #[test]
    #[should_panic(expected = "step must be greater than 0")]
    fn test_zero_step_panics() {
        let _ = vec![0..10].into_iter().step_ranges(0);
    }
}
