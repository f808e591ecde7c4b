//! Recursive crawl engine
//!
//! Visits the tree under the configured root with a remaining-depth budget.
//! Each visited path costs one queue slot, covering its `stat` and, for
//! directories, its `read_dir`. The slot is released before the children
//! are awaited, so a parent never holds a slot its descendants are waiting
//! for.
//!
//! Per path:
//! 1. `stat`. Permission errors are skipped unless `strict`.
//! 2. A directory past the depth budget is pruned without being listed.
//! 3. A path matching an ignore pattern is pruned with its subtree.
//! 4. A leaf is kept if it matches the glob patterns.
//! 5. A directory is listed and every entry is visited with `budget - 1`.
//!    Child results are concatenated in entry order.

use crate::config::{CrawlConfig, CrawlOptions};
use crate::error::{FsError, FsOp, Result};
use crate::fs::{FileSystem, LocalFs};
use crate::walker::aggregate::collect_in_order;
use crate::walker::queue::TaskQueue;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Statistics collected while crawling
///
/// Cumulative across every operation run on the same [`Crawler`].
#[derive(Debug, Default)]
pub struct CrawlStats {
    /// Directories successfully listed
    pub dirs_listed: AtomicU64,

    /// Leaves kept after glob matching
    pub files_found: AtomicU64,

    /// Paths pruned by the depth limit or an ignore pattern
    pub skipped: AtomicU64,

    /// Paths skipped on permission errors (non-strict only)
    pub denied: AtomicU64,
}

impl CrawlStats {
    pub fn record_dir(&self) {
        self.dirs_listed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self) {
        self.files_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dirs(&self) -> u64 {
        self.dirs_listed.load(Ordering::Relaxed)
    }

    pub fn files(&self) -> u64 {
        self.files_found.load(Ordering::Relaxed)
    }
}

/// Outcome of the I/O done for one path inside its slot
enum Probe {
    Leaf,
    Pruned,
    Listed(Vec<OsString>),
}

/// Bounded-concurrency recursive crawler
///
/// Owns the [`TaskQueue`] every filesystem call and every combinator
/// callback goes through.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    fs: Arc<dyn FileSystem>,
    queue: TaskQueue,
    stats: Arc<CrawlStats>,
}

impl Crawler {
    /// Create a crawler over the local disk
    pub fn new(config: CrawlConfig) -> Result<Self> {
        Self::with_fs(config, Arc::new(LocalFs))
    }

    /// Create a crawler over an arbitrary [`FileSystem`]
    pub fn with_fs(config: CrawlConfig, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let queue = TaskQueue::new(config.concurrency)?;
        Ok(Self {
            config: Arc::new(config),
            fs,
            queue,
            stats: Arc::new(CrawlStats::default()),
        })
    }

    /// Validate `options` and create a crawler over the local disk
    pub fn from_options(options: CrawlOptions) -> Result<Self> {
        Self::new(CrawlConfig::from_options(options)?)
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// The queue shared by the crawl and the combinators
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Get a handle to the crawl statistics
    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    /// Crawl the tree and return every kept file, in directory-entry order
    pub async fn crawl_all(&self) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        let budget = self.config.depth_budget();

        if budget.is_none() {
            warn!(
                root = %self.config.root.display(),
                "No max depth set, crawling the entire tree"
            );
        }

        info!(
            root = %self.config.root.display(),
            concurrency = self.queue.concurrency(),
            strict = self.config.strict,
            max_depth = ?self.config.max_depth,
            patterns = ?self.config.matcher.patterns(),
            "Starting crawl"
        );

        let files = match self.visit(self.config.root.clone(), budget).await {
            Ok(files) => files,
            Err(e) => {
                self.queue.drain();
                return Err(e);
            }
        };

        info!(
            files = files.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Crawl complete"
        );
        Ok(files)
    }

    fn visit(&self, path: PathBuf, budget: Option<i64>) -> BoxFuture<'_, Result<Vec<PathBuf>>> {
        async move {
            let probe = self.queue.run(self.probe(&path, budget)).await??;
            let names = match probe {
                Probe::Leaf => return Ok(self.keep_leaf(path)),
                Probe::Pruned => return Ok(Vec::new()),
                Probe::Listed(names) => names,
            };

            let child_budget = budget.map(|d| d - 1);
            let children = names
                .into_iter()
                .map(|name| self.visit(path.join(name), child_budget));

            let nested = collect_in_order(&self.queue, children).await?;
            Ok(nested.into_iter().flatten().collect())
        }
        .boxed()
    }

    async fn probe(&self, path: &Path, budget: Option<i64>) -> Result<Probe> {
        let kind = match self.fs.stat(path).await {
            Ok(kind) => kind,
            Err(e) => return self.skip_or_fail(FsError::from_io(FsOp::Stat, path, e)),
        };

        if kind.is_dir() && budget.is_some_and(|d| d < 0) {
            debug!(path = %path.display(), "Depth limit reached, not descending");
            self.stats.record_skip();
            return Ok(Probe::Pruned);
        }

        if self.config.is_ignored(path) {
            debug!(path = %path.display(), "Skipping ignored path");
            self.stats.record_skip();
            return Ok(Probe::Pruned);
        }

        if kind.is_leaf() {
            return Ok(Probe::Leaf);
        }

        match self.fs.read_dir(path).await {
            Ok(names) => {
                self.stats.record_dir();
                debug!(path = %path.display(), entries = names.len(), "Listed directory");
                Ok(Probe::Listed(names))
            }
            Err(e) => self.skip_or_fail(FsError::from_io(FsOp::ReadDir, path, e)),
        }
    }

    fn skip_or_fail(&self, err: FsError) -> Result<Probe> {
        if err.is_permission_denied() && !self.config.strict {
            debug!(path = %err.path().display(), error = %err, "Skipping unreadable path");
            self.stats.record_denied();
            return Ok(Probe::Pruned);
        }
        Err(err.into())
    }

    fn keep_leaf(&self, path: PathBuf) -> Vec<PathBuf> {
        if !self.config.matcher.is_match(&path) {
            return Vec::new();
        }
        self.stats.record_file();
        vec![path]
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
