//! A shared, size-classed pool of element blocks.
//!
//! Collections in this workspace draw their backing blocks from a
//! [`BlockPool`] instead of allocating per instance: a collection rents
//! blocks as it grows and recycles them when it shrinks or is dropped, so a
//! burst of short-lived collections reuses the same storage. A pool is
//! shared between instances through an `Arc` handle; nothing in the
//! workspace depends on a process-wide singleton.

pub mod block_pool;

pub use block_pool::{BlockPool, PoolConfig};
