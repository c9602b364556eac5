//! A pooled, block-segmented list.
//!
//! [`SegmentedList<T>`] stores its elements in fixed-size power-of-two
//! blocks rented from a shared [`BlockPool`](tessera_pool::BlockPool)
//! instead of one contiguous allocation. Logical positions map to
//! `(block, offset)` pairs with shift/mask arithmetic, appends never move
//! existing elements, and a dropped or cleared list hands every block back
//! to the pool for the next instance to reuse.
//!
//! Beyond the usual list surface (indexed access, append, insert, remove,
//! bulk range operations), the crate provides:
//!
//! - [`cursor`] — fail-fast enumeration through a detached
//!   [`VersionedCursor`] that errors out if the list is mutated between
//!   `advance` calls
//! - [`search`] — equality scans that fan out over the global work pool
//!   once the scanned window passes [`PARALLEL_SEARCH_THRESHOLD`]
//!
//! A single list instance assumes one writer at a time; reads may run
//! concurrently with each other but not with a mutation. The pool itself is
//! safe to share between instances on different threads.

pub mod cursor;
pub mod iter;
pub mod search;
pub mod segmented_list;

pub use cursor::VersionedCursor;
pub use iter::Iter;
pub use search::PARALLEL_SEARCH_THRESHOLD;
pub use segmented_list::SegmentedList;
