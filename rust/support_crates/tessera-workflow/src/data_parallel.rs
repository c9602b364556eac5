//! Data-parallel iteration over the global work pool.
//!
//! [`for_each`] and [`map`] process an iterator's items on the global
//! [`WorkPool`](crate::work_pool::WorkPool), running sequentially when the
//! input is trivially small or the requested degree of parallelism is 1.

use crate::work_pool::WorkPool;

/// Applies `f` to every item, in parallel when worthwhile.
///
/// `max_degree` caps the number of concurrently running tasks; `None`
/// means no cap beyond pool capacity, and a value of 1 or less forces
/// sequential execution.
pub fn for_each<T, F>(max_degree: Option<usize>, items: impl IntoIterator<Item = T>, f: F)
where
    F: Fn(T) + Send + Sync,
    T: Send,
{
    let items = items.into_iter();
    if items.size_hint().1.map(|hint| hint <= 1).unwrap_or(false)
        || max_degree.unwrap_or(usize::MAX) <= 1
    {
        for item in items {
            f(item);
        }
    } else {
        WorkPool::global().restricted_scope(max_degree.unwrap_or(usize::MAX), |scope| {
            for item in items {
                scope.spawn(|| f(item));
            }
        });
    }
}

/// Maps `f` over the items, in parallel when worthwhile, yielding results
/// in input order.
///
/// `max_degree` behaves as in [`for_each`]. In the parallel path all
/// results are collected before the returned iterator yields anything.
pub fn map<T, F, R>(
    max_degree: Option<usize>,
    items: impl IntoIterator<Item = T>,
    f: F,
) -> impl Iterator<Item = R>
where
    F: Fn(T) -> R + Send + Sync,
    T: Send,
    R: Send,
{
    let items = items.into_iter();
    if items.size_hint().1.map(|hint| hint <= 1).unwrap_or(false)
        || max_degree.unwrap_or(usize::MAX) <= 1
    {
        items.map(f).collect::<Vec<_>>().into_iter()
    } else {
        WorkPool::global().restricted_scope(max_degree.unwrap_or(usize::MAX), |scope| {
            let deferred = items.map(|item| scope.spawn(|| f(item))).collect::<Vec<_>>();
            deferred
                .into_iter()
                .map(|d| d.join())
                .collect::<Vec<_>>()
                .into_iter()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_for_each() {
        let counter = AtomicUsize::new(0);
        super::for_each(None, 0..100usize, |i| {
            counter.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 99 * 100 / 2);
    }

    #[test]
    fn test_for_each_sequential_degree() {
        let counter = AtomicUsize::new(0);
        super::for_each(Some(1), 0..10usize, |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_map_preserves_order() {
        let results = super::map(None, 0..1000usize, |i| i * 2).collect::<Vec<_>>();
        assert_eq!(results.len(), 1000);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(*r, i * 2);
        }
    }

    #[test]
    fn test_map_single_item() {
        let results = super::map(None, std::iter::once(5usize), |i| i + 1).collect::<Vec<_>>();
        assert_eq!(results, vec![6]);
    }
}
