//! The block-segmented list engine.

use std::sync::Arc;

use tessera_bits::BlockLayout;
use tessera_common::{
    Result,
    error::Error,
    result::{index_out_of_range, verify_index, verify_range},
    verify_arg,
};
use tessera_pool::BlockPool;

use crate::iter::Iter;

/// A list whose backing storage is a sequence of fixed-size blocks rented
/// from a shared [`BlockPool`].
///
/// The block size is a power of two fixed at construction, so a logical
/// position `i` splits into block `i >> shift` and offset `i & mask`. The
/// block table holds one `Vec<T>` per block; every block below the last
/// data block is full, and each `Vec`'s length always equals the number of
/// live elements it holds. Growth rents one block at a time; shrinkage
/// recycles a block only once it is the empty tail — interior blocks are
/// never released for being partially empty.
///
/// Indices are `u64` throughout, checked accessors return
/// [`Result`](tessera_common::Result) with range errors, and the panicking
/// `Index`/`IndexMut` pair is available for infallible call sites.
///
/// Every structural mutation bumps an internal version counter, which is
/// what the fail-fast [`cursor`](Self::cursor) enumeration compares
/// against.
pub struct SegmentedList<T> {
    pub(crate) blocks: Vec<Vec<T>>,
    pub(crate) len: u64,
    pub(crate) layout: BlockLayout,
    pub(crate) version: u64,
    pub(crate) pool: Arc<BlockPool<T>>,
}

impl<T> SegmentedList<T> {
    /// Creates an empty list with the default block size and a private pool.
    pub fn new() -> SegmentedList<T> {
        Self::with_layout_and_pool(BlockLayout::default(), Arc::new(BlockPool::new()))
    }

    /// Creates an empty list with blocks of at least `min_block_size`
    /// elements (rounded up to a power of two) and a private pool.
    pub fn with_block_size(min_block_size: usize) -> SegmentedList<T> {
        Self::with_layout_and_pool(BlockLayout::new(min_block_size), Arc::new(BlockPool::new()))
    }

    /// Creates an empty list drawing its blocks from `pool`.
    pub fn with_pool(pool: Arc<BlockPool<T>>) -> SegmentedList<T> {
        Self::with_layout_and_pool(BlockLayout::default(), pool)
    }

    /// Creates an empty list with the given block size, drawing its blocks
    /// from `pool`.
    pub fn with_block_size_and_pool(
        min_block_size: usize,
        pool: Arc<BlockPool<T>>,
    ) -> SegmentedList<T> {
        Self::with_layout_and_pool(BlockLayout::new(min_block_size), pool)
    }

    fn with_layout_and_pool(layout: BlockLayout, pool: Arc<BlockPool<T>>) -> SegmentedList<T> {
        SegmentedList {
            blocks: Vec::new(),
            len: 0,
            layout,
            version: 0,
            pool,
        }
    }

    /// Number of elements in the list.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total element slots currently held, `block count * block size`.
    #[inline]
    pub fn capacity(&self) -> u64 {
        (self.blocks.len() * self.layout.block_size()) as u64
    }

    /// Number of element slots in each block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.layout.block_size()
    }

    /// Index of the highest block containing at least one element, or
    /// `None` when the list is empty.
    pub fn last_block_with_data(&self) -> Option<usize> {
        if self.len == 0 {
            None
        } else {
            Some(self.layout.block_index(self.len - 1))
        }
    }

    /// Returns a reference to the element at `index`.
    pub fn get(&self, index: u64) -> Result<&T> {
        verify_index(index, self.len)?;
        Ok(&self.blocks[self.layout.block_index(index)][self.layout.offset(index)])
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// Writes through the reference do not advance the version counter;
    /// use [`set`](Self::set) when fail-fast cursors must observe the
    /// change.
    pub fn get_mut(&mut self, index: u64) -> Result<&mut T> {
        verify_index(index, self.len)?;
        let block = self.layout.block_index(index);
        let offset = self.layout.offset(index);
        Ok(&mut self.blocks[block][offset])
    }

    /// Replaces the element at `index`.
    pub fn set(&mut self, index: u64, value: T) -> Result<()> {
        verify_index(index, self.len)?;
        let block = self.layout.block_index(index);
        let offset = self.layout.offset(index);
        self.blocks[block][offset] = value;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Appends an element. Amortized O(1); never moves existing elements.
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            self.blocks.push(self.pool.rent(self.layout.block_size()));
        }
        let block = self.layout.block_index(self.len);
        self.blocks[block].push(value);
        self.len += 1;
        self.version = self.version.wrapping_add(1);
    }

    /// Inserts `value` at `index`, shifting the tail up by one.
    /// `index == len` appends.
    pub fn insert(&mut self, index: u64, value: T) -> Result<()> {
        if index > self.len {
            index_out_of_range(index, self.len)?;
        }
        if index == self.len {
            self.push(value);
            return Ok(());
        }
        self.ensure_capacity_for(self.len + 1);
        unsafe {
            self.open_gap(index, 1);
            let block = self.layout.block_index(index);
            let offset = self.layout.offset(index);
            std::ptr::write(self.blocks[block].as_mut_ptr().add(offset), value);
            self.commit_len(self.len + 1);
        }
        self.len += 1;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Inserts a clone of every element of `items` at `index`, shifting the
    /// tail up in block-sized chunks.
    pub fn insert_slice(&mut self, index: u64, items: &[T]) -> Result<()>
    where
        T: Clone,
    {
        // Clones are taken up front so a panicking Clone cannot fire while
        // the tail is half-shifted.
        self.insert_vec(index, items.to_vec())
    }

    /// Inserts every element yielded by `items` at `index`.
    ///
    /// The source is staged into a buffer before any shifting happens:
    /// counted sources (exact `size_hint`) get an exactly sized buffer,
    /// uncounted ones grow it as they go. The staged elements then move
    /// into the opened gap without running caller code mid-shift.
    pub fn insert_from_iter<I>(&mut self, index: u64, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = items.into_iter();
        let staged: Vec<T> = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                let mut staged = Vec::with_capacity(upper);
                staged.extend(iter);
                staged
            }
            _ => iter.collect(),
        };
        self.insert_vec(index, staged)
    }

    fn insert_vec(&mut self, index: u64, mut items: Vec<T>) -> Result<()> {
        if index > self.len {
            index_out_of_range(index, self.len)?;
        }
        if items.is_empty() {
            return Ok(());
        }
        let count = items.len() as u64;
        self.ensure_capacity_for(self.len + count);
        unsafe {
            self.open_gap(index, count);
            let mut src = items.as_ptr();
            let mut pos = index;
            let mut remaining = count;
            while remaining > 0 {
                let block = self.layout.block_index(pos);
                let offset = self.layout.offset(pos);
                let run = (self.layout.remaining_in_block(pos) as u64).min(remaining) as usize;
                std::ptr::copy_nonoverlapping(
                    src,
                    self.blocks[block].as_mut_ptr().add(offset),
                    run,
                );
                src = src.add(run);
                pos += run as u64;
                remaining -= run as u64;
            }
            // The staged elements now live in the gap.
            items.set_len(0);
            self.commit_len(self.len + count);
        }
        self.len += count;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Removes the first element equal to `value`. Returns `true` when an
    /// element was removed.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq + Send + Sync,
    {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Removes and returns the element at `index`, shifting the tail down
    /// by one.
    pub fn remove_at(&mut self, index: u64) -> Result<T> {
        verify_index(index, self.len)?;
        let value = unsafe {
            let block = self.layout.block_index(index);
            let offset = self.layout.offset(index);
            let value = std::ptr::read(self.blocks[block].as_ptr().add(offset));
            self.close_gap(index, 1);
            self.commit_len(self.len - 1);
            value
        };
        self.len -= 1;
        self.release_tail_blocks();
        self.version = self.version.wrapping_add(1);
        Ok(value)
    }

    /// Removes the `count` elements starting at `start`, shifting the tail
    /// down in block-sized chunks.
    pub fn remove_range(&mut self, start: u64, count: u64) -> Result<()> {
        verify_range(start, count, self.len)?;
        if count == 0 {
            return Ok(());
        }
        unsafe {
            self.drop_range(start, count);
            self.close_gap(start, count);
            self.commit_len(self.len - count);
        }
        self.len -= count;
        self.release_tail_blocks();
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Shortens the list to `new_len` elements, dropping the tail. No-op
    /// when `new_len >= len`.
    pub fn truncate(&mut self, new_len: u64) {
        if new_len >= self.len {
            return;
        }
        unsafe {
            self.drop_range(new_len, self.len - new_len);
            self.commit_len(new_len);
        }
        self.len = new_len;
        self.release_tail_blocks();
        self.version = self.version.wrapping_add(1);
    }

    /// Drops all elements and recycles every block. Idempotent: a second
    /// call finds nothing to release.
    pub fn clear(&mut self) {
        for mut block in self.blocks.drain(..) {
            block.clear();
            self.pool.recycle(block);
        }
        self.len = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// Appends clones of the elements of `items`, copying block-bounded
    /// runs at a time.
    pub fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        if items.is_empty() {
            return;
        }
        self.ensure_capacity_for(self.len + items.len() as u64);
        let mut items = items;
        while !items.is_empty() {
            let block = self.layout.block_index(self.len);
            let run = self.layout.remaining_in_block(self.len).min(items.len());
            self.blocks[block].extend_from_slice(&items[..run]);
            self.len += run as u64;
            items = &items[run..];
        }
        self.version = self.version.wrapping_add(1);
    }

    /// Appends clones of every element of another list, block run by
    /// block run.
    pub fn extend_from_list(&mut self, other: &SegmentedList<T>)
    where
        T: Clone,
    {
        self.ensure_capacity_for(self.len + other.len);
        for block in &other.blocks {
            if block.is_empty() {
                break;
            }
            self.extend_from_slice(block);
        }
    }

    /// Clones every element into the front of `dst`, which must hold at
    /// least `len` slots.
    pub fn copy_to_slice(&self, dst: &mut [T]) -> Result<()>
    where
        T: Clone,
    {
        verify_arg!(dst, dst.len() as u64 >= self.len);
        let mut offset = 0usize;
        for block in &self.blocks {
            if block.is_empty() {
                break;
            }
            dst[offset..offset + block.len()].clone_from_slice(block);
            offset += block.len();
        }
        Ok(())
    }

    /// Creates a list holding clones of `items`, acquiring all blocks
    /// eagerly since the count is known.
    pub fn from_slice(items: &[T]) -> SegmentedList<T>
    where
        T: Clone,
    {
        let mut list = SegmentedList::new();
        list.ensure_capacity_for(items.len() as u64);
        list.extend_from_slice(items);
        list
    }

    /// Like [`from_slice`](Self::from_slice), with an explicit block size
    /// and pool.
    pub fn from_slice_in(
        items: &[T],
        min_block_size: usize,
        pool: Arc<BlockPool<T>>,
    ) -> SegmentedList<T>
    where
        T: Clone,
    {
        let mut list = SegmentedList::with_block_size_and_pool(min_block_size, pool);
        list.ensure_capacity_for(items.len() as u64);
        list.extend_from_slice(items);
        list
    }

    /// Forward iterator over the elements in logical order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.blocks, self.len)
    }

    /// Rents blocks until the table can address `required` elements.
    fn ensure_capacity_for(&mut self, required: u64) {
        let needed = self.layout.block_count_for(required);
        while self.blocks.len() < needed {
            self.blocks.push(self.pool.rent(self.layout.block_size()));
        }
    }

    /// Recycles trailing blocks left empty by a shrink. Popping the block
    /// from the table before the pool sees it is what makes a second
    /// return of the same block inexpressible.
    fn release_tail_blocks(&mut self) {
        let needed = self.layout.block_count_for(self.len);
        while self.blocks.len() > needed {
            if let Some(block) = self.blocks.pop() {
                debug_assert!(block.is_empty());
                self.pool.recycle(block);
            }
        }
    }

    /// Moves `[pos, len)` to `[pos + count, len + count)` back-to-front in
    /// maximal runs bounded by both the source and the destination block
    /// boundaries.
    ///
    /// # Safety
    ///
    /// Capacity for `len + count` elements must already be ensured. On
    /// return the slots `[pos, pos + count)` are logically uninitialized;
    /// the caller must write them before committing lengths.
    unsafe fn open_gap(&mut self, pos: u64, count: u64) {
        debug_assert!(pos <= self.len);
        debug_assert!(self.layout.block_count_for(self.len + count) <= self.blocks.len());
        let mask = self.layout.mask();
        let blocks = self.blocks.as_mut_ptr();
        let mut remaining = self.len - pos;
        let mut src_end = self.len;
        let mut dst_end = self.len + count;
        while remaining > 0 {
            let run = remaining
                .min(((src_end - 1) & mask) + 1)
                .min(((dst_end - 1) & mask) + 1);
            let src_start = src_end - run;
            let dst_start = dst_end - run;
            let src_block = self.layout.block_index(src_start);
            let dst_block = self.layout.block_index(dst_start);
            unsafe {
                let src = (*blocks.add(src_block))
                    .as_mut_ptr()
                    .add(self.layout.offset(src_start));
                let dst = (*blocks.add(dst_block))
                    .as_mut_ptr()
                    .add(self.layout.offset(dst_start));
                if src_block == dst_block {
                    std::ptr::copy(src, dst, run as usize);
                } else {
                    std::ptr::copy_nonoverlapping(src, dst, run as usize);
                }
            }
            src_end = src_start;
            dst_end = dst_start;
            remaining -= run;
        }
    }

    /// Moves `[pos + count, len)` down to `[pos, len - count)` front-to-back
    /// in maximal block-bounded runs.
    ///
    /// # Safety
    ///
    /// The slots `[pos, pos + count)` must already be dropped or moved out.
    /// On return the slots `[len - count, len)` are logically uninitialized;
    /// the caller commits the shorter lengths.
    unsafe fn close_gap(&mut self, pos: u64, count: u64) {
        debug_assert!(pos + count <= self.len);
        let blocks = self.blocks.as_mut_ptr();
        let mut remaining = self.len - pos - count;
        let mut src_pos = pos + count;
        let mut dst_pos = pos;
        while remaining > 0 {
            let run = remaining
                .min(self.layout.remaining_in_block(src_pos) as u64)
                .min(self.layout.remaining_in_block(dst_pos) as u64);
            let src_block = self.layout.block_index(src_pos);
            let dst_block = self.layout.block_index(dst_pos);
            unsafe {
                let src = (*blocks.add(src_block))
                    .as_mut_ptr()
                    .add(self.layout.offset(src_pos));
                let dst = (*blocks.add(dst_block))
                    .as_mut_ptr()
                    .add(self.layout.offset(dst_pos));
                if src_block == dst_block {
                    std::ptr::copy(src, dst, run as usize);
                } else {
                    std::ptr::copy_nonoverlapping(src, dst, run as usize);
                }
            }
            src_pos += run;
            dst_pos += run;
            remaining -= run;
        }
    }

    /// Drops the elements at `[pos, pos + count)` in place.
    ///
    /// # Safety
    ///
    /// The slots must hold live elements; afterwards they are logically
    /// uninitialized.
    unsafe fn drop_range(&mut self, pos: u64, count: u64) {
        debug_assert!(pos + count <= self.len);
        let mut cur = pos;
        let mut remaining = count;
        while remaining > 0 {
            let block = self.layout.block_index(cur);
            let offset = self.layout.offset(cur);
            let run = (self.layout.remaining_in_block(cur) as u64).min(remaining) as usize;
            unsafe {
                let ptr = self.blocks[block].as_mut_ptr().add(offset);
                std::ptr::drop_in_place(std::ptr::slice_from_raw_parts_mut(ptr, run));
            }
            cur += run as u64;
            remaining -= run as u64;
        }
    }

    /// Sets every block's `Vec` length to match a total of `new_len` live
    /// elements: full up to the last data block, partial in it, zero past
    /// it.
    ///
    /// # Safety
    ///
    /// The first `new_len` logical slots must hold initialized elements
    /// and every slot past them must be logically uninitialized.
    unsafe fn commit_len(&mut self, new_len: u64) {
        let block_size = self.layout.block_size() as u64;
        for (i, block) in self.blocks.iter_mut().enumerate() {
            let filled = new_len
                .saturating_sub(i as u64 * block_size)
                .min(block_size) as usize;
            unsafe { block.set_len(filled) };
        }
    }
}

impl<T> Default for SegmentedList<T> {
    fn default() -> Self {
        SegmentedList::new()
    }
}

impl<T> Drop for SegmentedList<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for SegmentedList<T> {
    fn clone(&self) -> Self {
        let mut clone = SegmentedList::with_layout_and_pool(self.layout, self.pool.clone());
        clone.extend_from_list(self);
        clone
    }
}

impl<T> Extend<T> for SegmentedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.ensure_capacity_for(self.len + lower as u64);
        for value in iter {
            if self.len == self.capacity() {
                self.blocks.push(self.pool.rent(self.layout.block_size()));
            }
            let block = self.layout.block_index(self.len);
            self.blocks[block].push(value);
            self.len += 1;
        }
        self.version = self.version.wrapping_add(1);
    }
}

impl<T> FromIterator<T> for SegmentedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = SegmentedList::new();
        list.extend(iter);
        list
    }
}

impl<T> std::ops::Index<u64> for SegmentedList<T> {
    type Output = T;

    fn index(&self, index: u64) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T> std::ops::IndexMut<u64> for SegmentedList<T> {
    fn index_mut(&mut self, index: u64) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Ok(value) => value,
            Err(_) => panic!("{}", Error::index_out_of_range(index, len)),
        }
    }
}

impl<T: PartialEq> PartialEq for SegmentedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for SegmentedList<T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for SegmentedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
