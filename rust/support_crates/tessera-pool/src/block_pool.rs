//! Size-classed storage pool for fixed-capacity element blocks.

use std::sync::Mutex;

/// Tuning knobs for a [`BlockPool`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Smallest block capacity that participates in pooling. Rent requests
    /// below this (or for non-power-of-two capacities) bypass the pool and
    /// allocate directly.
    pub min_pooled_len: usize,
    /// Maximum number of idle blocks retained per size class; recycled
    /// blocks beyond this are dropped.
    pub max_per_class: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            min_pooled_len: 16,
            max_per_class: 1024,
        }
    }
}

/// A store of previously used element blocks, bucketed by power-of-two
/// capacity.
///
/// `rent` hands out a block of at least the requested capacity, reusing a
/// pooled one when its size class has any; `recycle` accepts a block back.
/// Buckets are individually locked, so independent collection instances may
/// rent and recycle against the same pool concurrently.
///
/// The pool never tracks which blocks are outstanding: exactly-once return
/// is the renter's obligation, and the collections in this workspace meet it
/// structurally by removing a block from their block table before recycling
/// it. Recycled blocks must be empty — dropping the elements before return
/// is what keeps pooled storage from retaining element data.
pub struct BlockPool<T> {
    classes: Vec<Mutex<Vec<Vec<T>>>>,
    min_shift: u32,
    max_per_class: usize,
}

impl<T> BlockPool<T> {
    /// Creates a pool with the default configuration.
    pub fn new() -> BlockPool<T> {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a pool with the given configuration.
    ///
    /// `min_pooled_len` is rounded up to a power of two (minimum 2).
    pub fn with_config(config: PoolConfig) -> BlockPool<T> {
        let min_len = config.min_pooled_len.max(2).next_power_of_two();
        let min_shift = min_len.trailing_zeros();
        let num_classes = (usize::BITS - min_shift) as usize;
        BlockPool {
            classes: (0..num_classes).map(|_| Mutex::new(Vec::new())).collect(),
            min_shift,
            max_per_class: config.max_per_class,
        }
    }

    /// Smallest block capacity that participates in pooling.
    pub fn min_pooled_len(&self) -> usize {
        1usize << self.min_shift
    }

    /// Returns an empty block with capacity at least `len`, reusing a pooled
    /// block of the matching size class when one is available.
    pub fn rent(&self, len: usize) -> Vec<T> {
        if let Some(class) = self.class_for_request(len) {
            if let Some(block) = self.classes[class].lock().expect("pool lock").pop() {
                debug_assert!(block.is_empty());
                debug_assert!(block.capacity() >= len);
                return block;
            }
            log::trace!("block pool: allocating fresh block of {len} slots");
        }
        Vec::with_capacity(len)
    }

    /// Accepts a block back into its size class.
    ///
    /// The block must be empty: callers drop (clear) the elements first, so
    /// pooled memory never keeps element data alive. Blocks with
    /// under-minimum or non-power-of-two capacity, and blocks arriving at a
    /// full bucket, are simply dropped.
    pub fn recycle(&self, block: Vec<T>) {
        debug_assert!(block.is_empty(), "blocks must be cleared before recycling");
        let Some(class) = self.class_for_capacity(block.capacity()) else {
            return;
        };
        let mut bucket = self.classes[class].lock().expect("pool lock");
        if bucket.len() < self.max_per_class {
            bucket.push(block);
        } else {
            log::trace!(
                "block pool: size class {} full, dropping recycled block",
                self.min_shift as usize + class
            );
        }
    }

    /// Number of idle blocks currently pooled in the size class serving
    /// `len`-slot requests.
    pub fn pooled_count(&self, len: usize) -> usize {
        self.class_for_request(len)
            .map(|class| self.classes[class].lock().expect("pool lock").len())
            .unwrap_or(0)
    }

    /// Size class for a rent request, or `None` when the request bypasses
    /// pooling.
    fn class_for_request(&self, len: usize) -> Option<usize> {
        if len.is_power_of_two() && len >= self.min_pooled_len() {
            Some((len.trailing_zeros() - self.min_shift) as usize)
        } else {
            None
        }
    }

    /// Size class a block of the given capacity belongs to: the class of the
    /// largest power of two not exceeding the capacity, so every block in a
    /// class can serve that class's rent requests.
    fn class_for_capacity(&self, capacity: usize) -> Option<usize> {
        if capacity < self.min_pooled_len() {
            return None;
        }
        let shift = usize::BITS - 1 - capacity.leading_zeros();
        Some((shift - self.min_shift) as usize)
    }
}

impl<T> Default for BlockPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
