//! Forward iteration over the list's block table.

use crate::SegmentedList;

/// A borrowing iterator over a [`SegmentedList`] in logical order.
///
/// Walks the block table one block slice at a time. The usual Rust
/// aliasing rules make mutation during iteration inexpressible, so no
/// version check is involved; see
/// [`SegmentedList::cursor`](crate::SegmentedList::cursor) for the
/// fail-fast variant.
pub struct Iter<'a, T> {
    blocks: std::slice::Iter<'a, Vec<T>>,
    current: std::slice::Iter<'a, T>,
    remaining: u64,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(blocks: &'a [Vec<T>], len: u64) -> Iter<'a, T> {
        Iter {
            blocks: blocks.iter(),
            current: Default::default(),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(value) = self.current.next() {
                self.remaining -= 1;
                return Some(value);
            }
            if self.remaining == 0 {
                return None;
            }
            self.current = self.blocks.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<'a, T> IntoIterator for &'a SegmentedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::SegmentedList;

    #[test]
    fn test_iter_order_and_size_hint() {
        let mut list = SegmentedList::with_block_size(4);
        list.extend(0..11u32);
        let mut iter = list.iter();
        assert_eq!(iter.size_hint(), (11, Some(11)));
        assert_eq!(iter.next(), Some(&0));
        assert_eq!(iter.size_hint(), (10, Some(10)));
        assert_eq!(iter.by_ref().count(), 10);

        let total: u32 = list.iter().sum();
        assert_eq!(total, (0..11).sum());
    }

    #[test]
    fn test_iter_empty() {
        let list = SegmentedList::<u32>::new();
        assert_eq!(list.iter().next(), None);
    }

    #[test]
    fn test_into_iterator_for_ref() {
        let mut list = SegmentedList::with_block_size(4);
        list.extend(0..10u32);
        let mut expected = 0;
        for value in &list {
            assert_eq!(*value, expected);
            expected += 1;
        }
        assert_eq!(expected, 10);
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut list = SegmentedList::with_block_size(4);
        list.extend(0..10u32);
        let first: Vec<u32> = list.iter().copied().collect();
        let second: Vec<u32> = list.iter().copied().collect();
        assert_eq!(first, second);
    }
}
