//! Ordered aggregation of concurrently resolving results
//!
//! Fan-outs (a directory's children, a combinator's per-file callbacks)
//! resolve in whatever order the queue lets them finish. Results are placed
//! by index so the caller always sees them in submission order.

use crate::error::Result;
use crate::walker::queue::TaskQueue;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Per-fan-out aggregation record
///
/// One slot per task plus a completion counter.
#[derive(Debug)]
pub(crate) struct Aggregation<T> {
    slots: Vec<Option<T>>,
    completed: usize,
}

impl<T> Aggregation<T> {
    pub fn new(expected: usize) -> Self {
        Self {
            slots: (0..expected).map(|_| None).collect(),
            completed: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.slots.len()
    }

    /// Store the result of task `index`
    pub fn fill(&mut self, index: usize, value: T) {
        debug_assert!(self.slots[index].is_none(), "slot {index} filled twice");
        if self.slots[index].replace(value).is_none() {
            self.completed += 1;
        }
    }

    /// Results in submission order, or `None` while slots are still empty
    pub fn finish(self) -> Option<Vec<T>> {
        if !self.is_complete() {
            return None;
        }
        self.slots.into_iter().collect()
    }
}

/// Await every task and return the outputs in submission order
///
/// The first error wins: pending queue work is drained, the remaining tasks
/// are dropped and the error is returned.
pub(crate) async fn collect_in_order<T, Fut, I>(queue: &TaskQueue, tasks: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T>>,
{
    let mut pending: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| async move { (index, task.await) })
        .collect();

    let mut aggregation = Aggregation::new(pending.len());

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => aggregation.fill(index, value),
            Err(e) => {
                queue.drain();
                return Err(e);
            }
        }
    }

    Ok(aggregation.finish().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use futures::FutureExt;
    use std::time::Duration;

    #[test]
    fn test_aggregation_orders_by_index() {
        let mut agg = Aggregation::new(3);
        agg.fill(2, "c");
        agg.fill(0, "a");
        assert!(!agg.is_complete());
        agg.fill(1, "b");
        assert_eq!(agg.finish(), Some(vec!["a", "b", "c"]));

        let partial: Aggregation<u8> = Aggregation::new(1);
        assert_eq!(partial.finish(), None);

        let empty: Aggregation<u8> = Aggregation::new(0);
        assert_eq!(empty.finish(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_collect_restores_submission_order() {
        let queue = TaskQueue::new(4).unwrap();
        let tasks = [30u64, 5, 20, 0].into_iter().map(|delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, CrawlError>(delay)
        });

        let out = collect_in_order(&queue, tasks).await.unwrap();
        assert_eq!(out, vec![30, 5, 20, 0]);
    }

    #[tokio::test]
    async fn test_collect_first_error_drains_queue() {
        let queue = TaskQueue::new(1).unwrap();
        let _slot = queue.acquire().await.unwrap();

        // A waiter parked in the queue, discarded when the error drains it
        let parked = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert_eq!(queue.pending(), 1);

        let tasks = vec![
            futures::future::ready(Ok(1)).boxed(),
            futures::future::ready(Err(CrawlError::EmptyReduction)).boxed(),
        ];
        let err = collect_in_order(&queue, tasks).await.unwrap_err();
        assert!(matches!(err, CrawlError::EmptyReduction));
        assert_eq!(queue.pending(), 0);
        assert!(matches!(parked.await.unwrap(), Err(CrawlError::Drained)));
    }
}
