//! Fixed-capacity bit set with atomic per-bit operations.

use std::sync::atomic::{AtomicU64, Ordering};

/// A lock-free fixed-size bit set backed by `AtomicU64` words.
///
/// The pool uses this as its worker availability mask: claiming a bit
/// reserves the corresponding worker slot. Reads are inherently stale in
/// concurrent use; the only reliable claim is [`try_claim_bit`], which
/// validates the claim through the previous value returned by `set`.
///
/// [`try_claim_bit`]: Self::try_claim_bit
pub struct AtomicBitSet {
    words: Vec<AtomicU64>,
    len: usize,
}

impl AtomicBitSet {
    /// Creates a bit set of `size` bits, all unset.
    pub fn new(size: usize) -> AtomicBitSet {
        let words = (0..size.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        AtomicBitSet { words, len: size }
    }

    /// Number of bits in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads a bit. The result may be stale by the time the caller acts
    /// on it.
    #[inline]
    pub fn get(&self, index: usize, ordering: Ordering) -> bool {
        assert!(index < self.len);
        let (word, pos) = self.bit_location(index);
        (word.load(ordering) & (1 << pos)) != 0
    }

    /// Atomically sets a bit, returning its previous value.
    #[inline]
    pub fn set(&self, index: usize) -> bool {
        assert!(index < self.len);
        let (word, pos) = self.bit_location(index);
        (word.fetch_or(1 << pos, Ordering::SeqCst) & (1 << pos)) != 0
    }

    /// Atomically clears a bit, returning its previous value.
    #[inline]
    pub fn reset(&self, index: usize) -> bool {
        assert!(index < self.len);
        let (word, pos) = self.bit_location(index);
        (word.fetch_and(!(1 << pos), Ordering::SeqCst) & (1 << pos)) != 0
    }

    /// Finds an unset bit and claims it, returning its index.
    ///
    /// Best effort: bounded retries mean this can return `None` under
    /// contention even while unset bits exist. A `Some(index)` result is a
    /// reliable exclusive claim.
    pub fn try_claim_bit(&self) -> Option<usize> {
        const RETRY_COUNT: usize = 8;
        for _ in 0..RETRY_COUNT {
            let candidate = self.try_find_unset_index()?;
            // set() returns the previous value: false means we won the claim.
            if !self.set(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Returns the index of the first unset bit, if any. The answer may be
    /// stale; use [`try_claim_bit`](Self::try_claim_bit) to actually
    /// reserve it.
    pub fn try_find_unset_index(&self) -> Option<usize> {
        for (i, word) in self.words.iter().enumerate() {
            let n = word.load(Ordering::Relaxed);
            if n == u64::MAX {
                continue;
            }
            let found = i * 64 + n.trailing_ones() as usize;
            if found < self.len {
                return Some(found);
            }
        }
        None
    }

    fn bit_location(&self, index: usize) -> (&AtomicU64, usize) {
        (&self.words[index >> 6], index & 63)
    }
}

#[cfg(test)]
mod tests {
    use super::AtomicBitSet;

    #[test]
    fn test_set_reset_find() {
        let set = AtomicBitSet::new(80);
        assert!(!set.set(0));
        assert!(set.reset(0));
        assert_eq!(set.try_find_unset_index().unwrap(), 0);
        assert!(!set.set(79));
        for i in 0..set.len() {
            set.set(i);
        }
        assert!(set.try_find_unset_index().is_none());
        set.reset(77);
        assert_eq!(set.try_find_unset_index().unwrap(), 77);
        set.reset(30);
        assert_eq!(set.try_find_unset_index().unwrap(), 30);
    }

    #[test]
    fn test_try_claim_bit() {
        let set = AtomicBitSet::new(10);
        assert_eq!(set.try_claim_bit().unwrap(), 0);
        assert_eq!(set.try_claim_bit().unwrap(), 1);
        for _ in 2..10 {
            set.try_claim_bit().unwrap();
        }
        assert!(set.try_claim_bit().is_none());
        set.reset(5);
        assert_eq!(set.try_claim_bit().unwrap(), 5);
    }

    #[test]
    fn test_try_claim_bit_concurrent() {
        use std::sync::{Arc, Barrier};

        let set = Arc::new(AtomicBitSet::new(100));
        let num_threads = 10;
        let barrier = Arc::new(Barrier::new(num_threads));
        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let set = set.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    (0..5).filter_map(|_| set.try_claim_bit()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut claimed = Vec::new();
        for handle in handles {
            claimed.extend(handle.join().unwrap());
        }
        let total = claimed.len();
        claimed.sort();
        claimed.dedup();
        assert_eq!(total, claimed.len(), "duplicate bits were claimed");
        for &index in &claimed {
            assert!(set.get(index, std::sync::atomic::Ordering::Relaxed));
        }
    }
}
