//! Handles for waiting on spawned tasks.
//!
//! [`JoinHandle`] is the unrestricted (`'static`) variant; [`ScopedJoinHandle`]
//! carries the scope lifetime so it cannot escape the scope that produced it.
//! Both are thin wrappers over a oneshot receiver.

use crate::oneshot::{self, OneshotReceiver};

/// A handle for waiting on the result of a `'static` task.
pub struct JoinHandle<R>(OneshotReceiver<R>);

impl<R> JoinHandle<R> {
    pub(crate) fn new(rx: OneshotReceiver<R>) -> JoinHandle<R> {
        JoinHandle(rx)
    }

    /// Creates a handle that is already resolved with `res`. Used when a
    /// task ran synchronously on the caller's thread.
    pub fn ready(res: R) -> Self {
        Self(oneshot::ready(res))
    }

    /// Returns `true` once the task has completed.
    pub fn is_ready(&self) -> bool {
        !self.0.is_pending()
    }

    /// Blocks until the task completes and returns its result.
    pub fn join(self) -> R {
        self.0.recv().expect("recv")
    }

    /// Joins every handle, collecting the results in input order.
    pub fn join_all(handles: impl IntoIterator<Item = JoinHandle<R>>) -> Vec<R> {
        handles.into_iter().map(|h| h.join()).collect()
    }
}

/// A handle for waiting on the result of a scoped task.
///
/// The `'scope` lifetime ties the handle to the scope it was spawned in,
/// which is what lets the task borrow from the enclosing environment.
pub struct ScopedJoinHandle<'scope, R>(OneshotReceiver<R>, std::marker::PhantomData<&'scope ()>);

impl<'scope, R> ScopedJoinHandle<'scope, R> {
    pub(crate) fn new(rx: OneshotReceiver<R>) -> ScopedJoinHandle<'scope, R> {
        ScopedJoinHandle(rx, Default::default())
    }

    /// Creates a handle that is already resolved with `res`.
    pub fn ready(res: R) -> Self {
        Self(oneshot::ready(res), Default::default())
    }

    /// Returns `true` once the task has completed.
    pub fn is_ready(&self) -> bool {
        !self.0.is_pending()
    }

    /// Blocks until the task completes and returns its result.
    pub fn join(self) -> R {
        self.0.recv().expect("recv")
    }
}
