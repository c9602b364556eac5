//! Power-of-two block layout: maps logical element positions to
//! `(block index, offset within block)` pairs with shift/mask arithmetic.

/// Addressing parameters of a block-segmented sequence.
///
/// A layout is fixed for the lifetime of the collection that owns it: the
/// block size never changes once chosen. Because the block size is a power
/// of two, a logical position splits into a block index (`pos >> shift`)
/// and an offset within that block (`pos & mask`) without division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    block_size: usize,
    shift: u32,
    mask: u64,
}

impl BlockLayout {
    /// Smallest supported block size.
    pub const MIN_BLOCK_SIZE: usize = 2;

    /// Creates a layout for blocks of at least `min_block_size` elements.
    ///
    /// The requested size is rounded up to the next power of two and clamped
    /// to [`MIN_BLOCK_SIZE`](Self::MIN_BLOCK_SIZE).
    pub fn new(min_block_size: usize) -> BlockLayout {
        let block_size = min_block_size
            .max(Self::MIN_BLOCK_SIZE)
            .next_power_of_two();
        let shift = block_size.trailing_zeros();
        BlockLayout {
            block_size,
            shift,
            mask: (block_size as u64) - 1,
        }
    }

    /// Number of element slots in each block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// `log2(block_size)`.
    #[inline]
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// `block_size - 1`, usable as an offset mask.
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Index of the block containing logical position `pos`.
    #[inline]
    pub fn block_index(&self, pos: u64) -> usize {
        (pos >> self.shift) as usize
    }

    /// Offset of logical position `pos` within its block.
    #[inline]
    pub fn offset(&self, pos: u64) -> usize {
        (pos & self.mask) as usize
    }

    /// Logical position of `(block, offset)`.
    #[inline]
    pub fn position(&self, block: usize, offset: usize) -> u64 {
        ((block as u64) << self.shift) | (offset as u64)
    }

    /// Number of blocks needed to hold `len` elements.
    #[inline]
    pub fn block_count_for(&self, len: u64) -> usize {
        len.div_ceil(self.block_size as u64) as usize
    }

    /// Number of slots from `pos` (inclusive) to the end of its block.
    #[inline]
    pub fn remaining_in_block(&self, pos: u64) -> usize {
        self.block_size - self.offset(pos)
    }
}

impl Default for BlockLayout {
    fn default() -> Self {
        BlockLayout::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_up_to_power_of_two() {
        assert_eq!(BlockLayout::new(0).block_size(), 2);
        assert_eq!(BlockLayout::new(1).block_size(), 2);
        assert_eq!(BlockLayout::new(2).block_size(), 2);
        assert_eq!(BlockLayout::new(3).block_size(), 4);
        assert_eq!(BlockLayout::new(1000).block_size(), 1024);
        assert_eq!(BlockLayout::new(1024).block_size(), 1024);
        assert_eq!(BlockLayout::new(1025).block_size(), 2048);
    }

    #[test]
    fn test_addressing_matches_div_mod() {
        for bs in [2usize, 4, 128, 4096] {
            let layout = BlockLayout::new(bs);
            for pos in [0u64, 1, 7, 127, 128, 129, 5000, 1 << 40] {
                assert_eq!(layout.block_index(pos) as u64, pos / bs as u64);
                assert_eq!(layout.offset(pos) as u64, pos % bs as u64);
                assert_eq!(
                    layout.position(layout.block_index(pos), layout.offset(pos)),
                    pos
                );
            }
        }
    }

    #[test]
    fn test_block_count_for() {
        let layout = BlockLayout::new(128);
        assert_eq!(layout.block_count_for(0), 0);
        assert_eq!(layout.block_count_for(1), 1);
        assert_eq!(layout.block_count_for(128), 1);
        assert_eq!(layout.block_count_for(129), 2);
        assert_eq!(layout.block_count_for(333), 3);
    }

    #[test]
    fn test_remaining_in_block() {
        let layout = BlockLayout::new(8);
        assert_eq!(layout.remaining_in_block(0), 8);
        assert_eq!(layout.remaining_in_block(5), 3);
        assert_eq!(layout.remaining_in_block(7), 1);
        assert_eq!(layout.remaining_in_block(8), 8);
    }
}
