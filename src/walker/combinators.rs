//! Combinators over crawl results
//!
//! Each combinator crawls first, then schedules one callback per file on the
//! crawler's queue, so the concurrency bound covers user work too. A
//! callback is only invoked once its slot is granted.
//!
//! Callback failures surface as [`CrawlError::Callback`] and panics as
//! [`CrawlError::CallbackPanicked`]. Either one drains the queue and the
//! operation resolves with that error alone.

use super::crawl::Crawler;
use crate::error::{BoxError, CrawlError, Result};
use crate::walker::aggregate::collect_in_order;
use crate::walker::queue::TaskQueue;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{debug, info};

impl Crawler {
    /// Run `action` on every file
    pub async fn for_each<F, Fut, E>(&self, action: F) -> Result<()>
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<BoxError>,
    {
        let files = self.crawl_all().await?;
        let tasks = files
            .iter()
            .cloned()
            .map(|path| self.run_callback(path, &action));
        collect_in_order(self.queue(), tasks).await?;

        info!(files = files.len(), "for_each complete");
        Ok(())
    }

    /// Transform every file, keeping crawl order in the output
    pub async fn map<F, Fut, T, E>(&self, transform: F) -> Result<Vec<T>>
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        let files = self.crawl_all().await?;
        let tasks = files
            .iter()
            .cloned()
            .map(|path| self.run_callback(path, &transform));
        let results = collect_in_order(self.queue(), tasks).await?;

        info!(files = files.len(), "map complete");
        Ok(results)
    }

    /// Keep the files for which `predicate` resolves to `true`
    pub async fn filter<F, Fut, E>(&self, predicate: F) -> Result<Vec<PathBuf>>
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = std::result::Result<bool, E>>,
        E: Into<BoxError>,
    {
        let files = self.crawl_all().await?;
        let total = files.len();
        let tasks = files
            .iter()
            .cloned()
            .map(|path| self.run_callback(path, &predicate));
        let verdicts = collect_in_order(self.queue(), tasks).await?;

        let kept: Vec<PathBuf> = files
            .into_iter()
            .zip(verdicts)
            .filter_map(|(path, keep)| keep.then_some(path))
            .collect();

        info!(files = total, kept = kept.len(), "filter complete");
        Ok(kept)
    }

    /// Fold every file into an accumulator, strictly in crawl order
    ///
    /// The queue runs at concurrency 1 while the reducer chain runs and gets
    /// its previous limit back afterwards, on success or failure. Without a
    /// `seed` the first call receives `None` and its result seeds the
    /// accumulator.
    pub async fn reduce<F, Fut, A, E>(&self, seed: Option<A>, reducer: F) -> Result<A>
    where
        F: Fn(Option<A>, PathBuf) -> Fut,
        Fut: Future<Output = std::result::Result<A, E>>,
        E: Into<BoxError>,
    {
        let files = self.crawl_all().await?;
        if files.is_empty() {
            return seed.ok_or(CrawlError::EmptyReduction);
        }

        let _serial = SerialGuard::new(self.queue());
        let mut accumulator = seed;

        for path in &files {
            let previous = accumulator.take();
            let next = self
                .run_callback(path.clone(), |path| reducer(previous, path))
                .await?;
            accumulator = Some(next);
        }

        info!(files = files.len(), "reduce complete");
        accumulator.ok_or(CrawlError::EmptyReduction)
    }

    /// Invoke a user callback inside a queue slot
    async fn run_callback<C, Fut, T, E>(&self, path: PathBuf, call: C) -> Result<T>
    where
        C: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        let arg = path.clone();
        let outcome = self
            .queue()
            .run(AssertUnwindSafe(async move { call(arg).await }).catch_unwind())
            .await?;

        let err = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => CrawlError::Callback {
                path,
                source: e.into(),
            },
            Err(payload) => CrawlError::CallbackPanicked {
                path,
                message: panic_message(payload.as_ref()),
            },
        };

        debug!(error = %err, "Callback failed, draining queue");
        self.queue().drain();
        Err(err)
    }
}

/// Forces a queue to concurrency 1 until dropped
struct SerialGuard<'a> {
    queue: &'a TaskQueue,
    previous: usize,
}

impl<'a> SerialGuard<'a> {
    fn new(queue: &'a TaskQueue) -> Self {
        let previous = queue.concurrency();
        // 1 is always a valid limit
        let _ = queue.set_concurrency(1);
        Self { queue, previous }
    }
}

impl Drop for SerialGuard<'_> {
    fn drop(&mut self) {
        let _ = self.queue.set_concurrency(self.previous);
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
