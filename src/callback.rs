//! Error-first callback surface
//!
//! Spawns an operation on the tokio runtime and hands its single
//! `Result` to a callback. The callback fires exactly once: with the
//! operation's result, with [`CrawlError::CallbackPanicked`] if the
//! operation panicked, or with [`CrawlError::Interrupted`] if the task was
//! aborted or the runtime shut down before it finished.

use crate::error::{BoxError, CrawlError, Result};
use crate::once::Once;
use crate::walker::Crawler;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

type Deliver<T> = Box<dyn FnOnce(Result<T>) + Send>;

/// Hands a result to its callback at most once
///
/// Dropping an undelivered `Delivery` reports [`CrawlError::Interrupted`].
struct Delivery<T> {
    callback: Once<Deliver<T>>,
}

impl<T> Delivery<T> {
    fn new(callback: Deliver<T>) -> Self {
        Self {
            callback: Once::new(callback),
        }
    }

    fn deliver(&self, result: Result<T>) {
        self.callback.call(result);
    }
}

impl<T> Drop for Delivery<T> {
    fn drop(&mut self) {
        self.deliver(Err(CrawlError::Interrupted));
    }
}

/// Spawn `operation` and deliver its result to `callback`
///
/// Must be called from within a tokio runtime.
pub fn spawn_with_callback<T, Fut, C>(operation: Fut, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
{
    let delivery = Delivery::new(Box::new(callback));

    tokio::spawn(async move {
        let result = match AssertUnwindSafe(operation).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(CrawlError::CallbackPanicked {
                path: PathBuf::new(),
                message: crate::walker::panic_message(payload.as_ref()),
            }),
        };
        delivery.deliver(result);
    })
}

impl Crawler {
    /// [`crawl_all`](Crawler::crawl_all), delivering to `callback`
    pub fn crawl_all_then<C>(self: &Arc<Self>, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<PathBuf>>) + Send + 'static,
    {
        let crawler = Arc::clone(self);
        spawn_with_callback(async move { crawler.crawl_all().await }, callback)
    }

    /// [`for_each`](Crawler::for_each), delivering to `callback`
    pub fn for_each_then<F, Fut, E, C>(self: &Arc<Self>, action: F, callback: C) -> JoinHandle<()>
    where
        F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
        C: FnOnce(Result<()>) + Send + 'static,
    {
        let crawler = Arc::clone(self);
        spawn_with_callback(async move { crawler.for_each(action).await }, callback)
    }

    /// [`map`](Crawler::map), delivering to `callback`
    pub fn map_then<F, Fut, T, E, C>(self: &Arc<Self>, transform: F, callback: C) -> JoinHandle<()>
    where
        F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        C: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        let crawler = Arc::clone(self);
        spawn_with_callback(async move { crawler.map(transform).await }, callback)
    }

    /// [`filter`](Crawler::filter), delivering to `callback`
    pub fn filter_then<F, Fut, E, C>(
        self: &Arc<Self>,
        predicate: F,
        callback: C,
    ) -> JoinHandle<()>
    where
        F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<bool, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
        C: FnOnce(Result<Vec<PathBuf>>) + Send + 'static,
    {
        let crawler = Arc::clone(self);
        spawn_with_callback(async move { crawler.filter(predicate).await }, callback)
    }

    /// [`reduce`](Crawler::reduce), delivering to `callback`
    pub fn reduce_then<F, Fut, A, E, C>(
        self: &Arc<Self>,
        seed: Option<A>,
        reducer: F,
        callback: C,
    ) -> JoinHandle<()>
    where
        F: Fn(Option<A>, PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<A, E>> + Send + 'static,
        A: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        C: FnOnce(Result<A>) + Send + 'static,
    {
        let crawler = Arc::clone(self);
        spawn_with_callback(async move { crawler.reduce(seed, reducer).await }, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_result_delivered_once() {
        let (tx, rx) = oneshot::channel();
        let handle = spawn_with_callback(async { Ok::<_, CrawlError>(5) }, move |result| {
            let _ = tx.send(result);
        });
        handle.await.unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let (tx, rx) = oneshot::channel::<Result<()>>();
        fn explode() -> Result<()> {
            panic!("operation exploded")
        }

        spawn_with_callback(
            async { explode() },
            move |result| {
                let _ = tx.send(result);
            },
        );

        match rx.await.unwrap() {
            Err(CrawlError::CallbackPanicked { message, .. }) => {
                assert_eq!(message, "operation exploded");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_abort_reports_interrupted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let handle = spawn_with_callback(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, CrawlError>(())
            },
            move |result| sink.lock().push(result),
        );
        tokio::task::yield_now().await;
        handle.abort();
        let _ = handle.await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], Err(CrawlError::Interrupted)));
    }
}
