//! Parallel execution utilities for the segmented collections.
//!
//! The central piece is [`work_pool::WorkPool`], an eager thread pool: a
//! task runs immediately on an idle worker thread, or synchronously on the
//! caller's thread when every worker is busy. Work is never queued, which
//! makes nested fork-join usage safe — a task that spawns and joins nested
//! tasks cannot deadlock on pool starvation.
//!
//! Supporting pieces:
//!
//! - [`oneshot`] — single-value channel used to hand task results back
//! - [`join_handle`] — handles for waiting on spawned tasks, in `'static`
//!   and scoped flavors
//! - [`data_parallel`] — `for_each`/`map` over an iterator with automatic
//!   sequential fallback for small inputs
//! - [`atomic_bit_set`] — lock-free worker-slot reservation mask

pub mod atomic_bit_set;
pub mod data_parallel;
pub mod join_handle;
pub mod oneshot;
pub mod work_pool;
