//! Eager thread pool with synchronous fallback.
//!
//! [`WorkPool`] never queues: a spawned task either starts immediately on
//! an idle worker thread or runs synchronously on the caller's thread. The
//! caller's thread is always an admissible executor, so a task that spawns
//! and joins nested tasks cannot deadlock on pool starvation.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicU64, AtomicUsize, Ordering},
    mpsc::{Receiver, SyncSender},
};

use crate::{
    atomic_bit_set::AtomicBitSet,
    join_handle::{JoinHandle, ScopedJoinHandle},
    oneshot,
};

/// Creates a scope for non-`'static` tasks on the global pool. All tasks
/// spawned within the scope complete before this function returns.
pub fn scope<'env, F, R>(f: F) -> R
where
    F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> R,
{
    WorkPool::global().scope(f)
}

/// Runs a `'static` closure on the global pool, falling back to the
/// caller's thread when all workers are busy.
pub fn spawn<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    WorkPool::global().spawn(f)
}

/// Runs two closures concurrently and returns both results.
pub fn join<A, B, RA, RB>(fn_a: A, fn_b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    scope(|scope| {
        let res_a = scope.spawn(fn_a);
        let res_b = scope.spawn(fn_b);
        (res_a.join(), res_b.join())
    })
}

/// An eager thread pool.
///
/// Spawning checks the worker availability mask: if an idle worker slot can
/// be claimed the task is dispatched to that worker, otherwise it runs
/// synchronously on the caller's thread and the returned handle is already
/// resolved. Work is never queued or rejected.
///
/// Non-`'static` closures go through [`scope`](Self::scope) or
/// [`restricted_scope`](Self::restricted_scope), which block until every
/// task spawned inside them has completed.
///
/// Dropping the pool signals the workers to exit; in-flight tasks finish.
#[derive(Clone)]
pub struct WorkPool(Arc<WorkerSet>);

impl WorkPool {
    /// Creates a pool with `num_threads` worker threads.
    pub fn new(num_threads: usize) -> WorkPool {
        WorkPool(WorkerSet::new(num_threads))
    }

    /// Sets the thread count used when the global pool is lazily created.
    /// Only effective before the first call to [`global`](Self::global).
    pub fn configure_global_pool_size(pool_size: usize) {
        GLOBAL_POOL_SIZE.store(pool_size.max(1), Ordering::SeqCst);
    }

    /// Returns the lazily initialized global pool.
    ///
    /// The size comes from [`configure_global_pool_size`] when set,
    /// otherwise `(available_parallelism * 3 + 1) / 2`, with a fallback of
    /// 8 threads.
    ///
    /// [`configure_global_pool_size`]: Self::configure_global_pool_size
    pub fn global() -> &'static WorkPool {
        static POOL: OnceLock<WorkPool> = OnceLock::new();
        POOL.get_or_init(|| WorkPool::new(Self::get_global_pool_size()))
    }

    /// Runs a `'static` closure on an idle worker, or synchronously on the
    /// caller's thread when none is available.
    pub fn spawn<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if let Some(index) = self.0.try_reserve() {
            let (tx, rx) = oneshot::channel::<R>();
            let job_fn = move || {
                let res = f();
                let _ = tx.send(res);
            };
            self.0.dispatch(index, Box::new(job_fn));
            JoinHandle::new(rx)
        } else {
            let res = f();
            JoinHandle::ready(res)
        }
    }

    /// Creates a scope for tasks that borrow from the caller's environment.
    /// Returns only after every spawned task has completed.
    pub fn scope<'env, F, R>(&self, f: F) -> R
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> R,
    {
        let scope = Scope {
            workers: self.0.clone(),
            state: ScopeState::new(),
            scope: std::marker::PhantomData,
            env: std::marker::PhantomData,
        };
        let res = f(&scope);
        scope.state.wait();
        res
    }

    /// Like [`scope`](Self::scope), but at most `max_parallel_tasks` tasks
    /// run concurrently; spawns beyond the limit execute synchronously on
    /// the caller's thread.
    pub fn restricted_scope<'env, F, R>(&self, max_parallel_tasks: usize, f: F) -> R
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> R,
    {
        // The caller's thread always counts as one executor, so the worker
        // budget is one less than the requested parallelism.
        let max_parallel_tasks = std::cmp::max(max_parallel_tasks, 1) - 1;
        let scope = Scope {
            workers: self.0.clone(),
            state: ScopeState::restricted(max_parallel_tasks),
            scope: std::marker::PhantomData,
            env: std::marker::PhantomData,
        };
        let res = f(&scope);
        scope.state.wait();
        res
    }

    /// Cumulative count of tasks dispatched to worker threads (tasks that
    /// ran synchronously are not counted). Useful in tests.
    pub fn spawn_counter(&self) -> usize {
        self.0.spawn_counter.load(Ordering::Relaxed)
    }

    fn get_global_pool_size() -> usize {
        let size = GLOBAL_POOL_SIZE.load(Ordering::SeqCst);
        if size == 0 {
            std::thread::available_parallelism()
                .map(|n| (n.get() * 3 + 1) / 2)
                .unwrap_or(8)
        } else {
            size
        }
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// A fork-join scope over a [`WorkPool`].
///
/// Spawning inside the scope first reserves a slot against the scope's
/// parallelism limit, then a worker; if either reservation fails, the task
/// runs synchronously on the caller's thread. Every spawned task completes
/// before the enclosing `scope` call returns, which is what makes borrowing
/// from `'env` sound.
pub struct Scope<'scope, 'env: 'scope> {
    workers: Arc<WorkerSet>,
    state: Arc<ScopeState>,
    scope: std::marker::PhantomData<&'scope mut &'scope ()>,
    env: std::marker::PhantomData<&'env mut &'env ()>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    /// Runs a closure on an idle worker within the scope's limits, or
    /// synchronously on the caller's thread.
    pub fn spawn<F, R>(&'scope self, f: F) -> ScopedJoinHandle<'scope, R>
    where
        F: FnOnce() -> R + Send + 'scope,
        R: Send + 'scope,
    {
        if self.state.try_reserve() {
            if let Some(index) = self.workers.try_reserve() {
                let state = self.state.clone();
                state.task_spawned();
                let (tx, rx) = oneshot::channel::<R>();
                let job_fn = move || {
                    let res = f();
                    let _ = tx.send(res);
                    state.task_completed();
                };
                let job_fn: Box<dyn FnOnce() + Send + 'scope> = Box::new(job_fn);
                // casting away the 'scope lifetime, pretending our F is 'static.
                let job_fn = unsafe {
                    std::mem::transmute::<
                        Box<dyn FnOnce() + Send + 'scope>,
                        Box<dyn FnOnce() + Send + 'static>,
                    >(job_fn)
                };
                self.workers.dispatch(index, job_fn);
                return ScopedJoinHandle::new(rx);
            }
            self.state.undo_reserve();
        }

        let res = f();
        ScopedJoinHandle::ready(res)
    }
}

static GLOBAL_POOL_SIZE: AtomicUsize = AtomicUsize::new(0);

type JobFn = Box<dyn FnOnce() + Send + 'static>;

struct WorkerSet {
    threads: Vec<Worker>,
    mask: AtomicBitSet,
    spawn_counter: AtomicUsize,
}

impl WorkerSet {
    fn new(num_threads: usize) -> Arc<WorkerSet> {
        let (threads, channels) = (0..num_threads)
            .map(|_| Worker::new())
            .unzip::<_, _, Vec<_>, Vec<_>>();
        let this = Arc::new(WorkerSet {
            threads,
            mask: AtomicBitSet::new(num_threads),
            spawn_counter: AtomicUsize::new(0),
        });
        channels.into_iter().enumerate().for_each(|(i, rx)| {
            let this = this.clone();
            std::thread::spawn(move || Self::thread_fn(this, i, rx));
        });
        this
    }

    fn try_reserve(&self) -> Option<usize> {
        self.mask.try_claim_bit()
    }

    fn dispatch(&self, reserved_index: usize, job: JobFn) {
        assert!(self.mask.get(reserved_index, Ordering::SeqCst));
        self.spawn_counter.fetch_add(1, Ordering::Relaxed);
        self.threads[reserved_index]
            .tx
            .send(Job::Run(job))
            .expect("send");
    }

    fn stop(&self) {
        self.threads.iter().for_each(|t| {
            let _ = t.tx.send(Job::Stop);
        });
    }

    fn thread_fn(workers: Arc<WorkerSet>, index: usize, rx: Receiver<Job>) {
        loop {
            let job = rx.recv().expect("recv");
            match job {
                Job::Run(f) => {
                    f();
                    workers.mask.reset(index);
                }
                Job::Stop => return,
            }
        }
    }
}

struct Worker {
    tx: SyncSender<Job>,
}

impl Worker {
    fn new() -> (Worker, Receiver<Job>) {
        let (tx, rx) = std::sync::mpsc::sync_channel::<Job>(4);
        (Worker { tx }, rx)
    }
}

enum Job {
    Run(JobFn),
    Stop,
}

struct ScopeState {
    /// Counter of running tasks combined with the `WAIT_STATE` flag.
    state: AtomicU64,
    /// Completion "event".
    completion: OnceLock<()>,
    /// Counter of running (parallel) tasks for the `max_tasks` enforcement.
    current_tasks: AtomicUsize,
    /// Max number of running (parallel) tasks.
    max_tasks: usize,
}

impl ScopeState {
    const WAIT_STATE: u64 = 0x8000000000000000;

    fn new() -> Arc<ScopeState> {
        Self::restricted(usize::MAX)
    }

    fn restricted(max_tasks: usize) -> Arc<ScopeState> {
        Arc::new(ScopeState {
            state: AtomicU64::new(0),
            completion: OnceLock::new(),
            current_tasks: AtomicUsize::new(0),
            max_tasks,
        })
    }

    fn try_reserve(&self) -> bool {
        if self.current_tasks.fetch_add(1, Ordering::Relaxed) + 1 > self.max_tasks {
            self.current_tasks.fetch_sub(1, Ordering::Relaxed);
            false
        } else {
            true
        }
    }

    fn undo_reserve(&self) {
        self.current_tasks.fetch_sub(1, Ordering::Relaxed);
    }

    fn task_spawned(&self) {
        let prev_state = self.state.fetch_add(1, Ordering::SeqCst);
        assert!(prev_state < Self::WAIT_STATE);
    }

    fn task_completed(&self) {
        self.current_tasks.fetch_sub(1, Ordering::Relaxed);
        let prev_state = self.state.fetch_sub(1, Ordering::SeqCst);
        assert_ne!(prev_state, 0);
        assert_ne!(prev_state, Self::WAIT_STATE);
        if prev_state > Self::WAIT_STATE && prev_state - Self::WAIT_STATE == 1 {
            let _ = self.completion.set(());
        }
    }

    fn wait(&self) {
        let prev_state = self.state.fetch_add(Self::WAIT_STATE, Ordering::SeqCst);
        assert!(prev_state < Self::WAIT_STATE);
        if prev_state == 0 {
            return;
        }
        self.completion.wait();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::WorkPool;
    use crate::join_handle::JoinHandle;

    #[test]
    fn test_work_pool() {
        let pool = WorkPool::new(4);
        let current_id = std::thread::current().id();
        let worker_id = pool.spawn(|| std::thread::current().id()).join();
        assert_ne!(current_id, worker_id);

        let h = (0..4)
            .map(|_| pool.spawn(|| std::thread::sleep(Duration::from_millis(50))))
            .collect::<Vec<_>>();
        let worker_id = pool.spawn(|| std::thread::current().id()).join();
        JoinHandle::join_all(h);
        assert_eq!(worker_id, current_id);

        pool.scope(|scope| {
            let h0 = scope.spawn(|| std::thread::sleep(Duration::from_millis(50)));
            let h1 = scope.spawn(|| std::thread::sleep(Duration::from_millis(50)));
            h0.join();
            h1.join();
        });

        let a = vec![10u32; 50];
        let mut b = vec![0u32; 100];
        pool.scope(|scope| {
            let (b0, b1) = b.split_at_mut(50);
            scope.spawn(|| b0.copy_from_slice(&a));
            scope.spawn(|| b1.copy_from_slice(&a));
        });
        assert_eq!(&a, &b[0..50]);
        assert_eq!(&a, &b[50..100]);

        let prev_spawned = pool.spawn_counter();
        pool.restricted_scope(2, |scope| {
            scope.spawn(|| std::thread::sleep(Duration::from_millis(50)));
            scope.spawn(|| std::thread::sleep(Duration::from_millis(50)));
        });
        let spawned = pool.spawn_counter();
        assert_eq!(spawned - prev_spawned, 1);
    }

    #[test]
    fn test_join() {
        let (a, b) = super::join(|| 1 + 1, || "two");
        assert_eq!(a, 2);
        assert_eq!(b, "two");
    }
}
