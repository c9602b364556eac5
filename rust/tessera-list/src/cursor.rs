//! Fail-fast enumeration via a detached, version-stamped cursor.

use tessera_common::{Result, error::Error};

use crate::SegmentedList;

/// A detached enumeration position over a [`SegmentedList`].
///
/// The cursor snapshots the list's version counter at creation. Each
/// [`advance`](SegmentedList::advance) compares the snapshot against the
/// live counter and fails with a concurrent-modification error when any
/// mutation happened in between, even if the read itself would have been
/// harmless. The cursor holds no borrow of the list, so mutating between
/// `advance` calls is expressible; the version check is what catches it.
#[derive(Debug, Clone, Copy)]
pub struct VersionedCursor {
    position: u64,
    version: u64,
}

impl VersionedCursor {
    /// Logical index of the next element the cursor will yield.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<T> SegmentedList<T> {
    /// Creates a cursor positioned before the first element, stamped with
    /// the list's current version.
    pub fn cursor(&self) -> VersionedCursor {
        VersionedCursor {
            position: 0,
            version: self.version,
        }
    }

    /// Yields the element at the cursor and steps it forward.
    ///
    /// Returns `Ok(None)` once the cursor is exhausted, and a
    /// concurrent-modification error when the list was mutated since the
    /// cursor was created.
    pub fn advance<'a>(&'a self, cursor: &mut VersionedCursor) -> Result<Option<&'a T>> {
        if cursor.version != self.version {
            return Err(Error::concurrent_modification());
        }
        if cursor.position >= self.len {
            return Ok(None);
        }
        let block = self.layout.block_index(cursor.position);
        let offset = self.layout.offset(cursor.position);
        cursor.position += 1;
        Ok(Some(&self.blocks[block][offset]))
    }
}
