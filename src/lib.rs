//! fs-crawler - Bounded-Concurrency Directory Crawler
//!
//! Recursively enumerates the files under a root directory while bounding
//! the number of concurrent filesystem operations, and runs asynchronous
//! `for_each` / `map` / `filter` / `reduce` callbacks over the results.
//!
//! # Features
//!
//! - **Bounded Concurrency**: one FIFO task queue gates every stat, every
//!   readdir and every user callback, so at most `concurrency` of them are
//!   in flight at any time.
//!
//! - **Ordered Results**: files come back in directory-entry order and
//!   `map`/`filter` preserve that order however their callbacks interleave.
//!
//! - **Pruning**: depth limits, regex ignore patterns (`node_modules` by
//!   default) and glob match patterns.
//!
//! - **Single Outcome**: every operation resolves with exactly one value or
//!   one error; the first failure drains pending work.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Crawler                                  │
//! │   crawl_all ─► for_each / map / filter / reduce                  │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        TaskQueue                                 │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │ Slot 1  │  │ Slot 2  │  │ Slot 3  │  ...    │ Slot N  │     │
//! │  │stat+list│  │callback │  │stat+list│         │callback │     │
//! │  └────┬────┘  └─────────┘  └────┬────┘         └─────────┘     │
//! │       │                         │                               │
//! │       └────────────┬────────────┘                               │
//! │                    ▼                                            │
//! │            ┌──────────────────────────┐                         │
//! │            │   dyn FileSystem         │                         │
//! │            │  (LocalFs: tokio::fs)    │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fs_crawler::{CrawlOptions, Crawler};
//!
//! # async fn demo() -> fs_crawler::Result<()> {
//! let crawler = Crawler::from_options(
//!     CrawlOptions::new("./src").match_patterns(["*.rs"]).concurrency(8),
//! )?;
//!
//! let lines = crawler
//!     .map(|path| async move {
//!         let text = tokio::fs::read_to_string(&path).await?;
//!         Ok::<_, std::io::Error>(text.lines().count())
//!     })
//!     .await?;
//! println!("{} lines", lines.iter().sum::<usize>());
//! # Ok(())
//! # }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod fs;
pub mod glob;
pub mod once;
pub mod progress;
pub mod walker;

pub use callback::spawn_with_callback;
pub use config::{CliArgs, CrawlConfig, CrawlOptions, DEFAULT_IGNORE_PATTERN};
pub use error::{ConfigError, CrawlError, FsError, Result};
pub use once::{once, Once};
pub use walker::{Completion, CrawlStats, Crawler, TaskQueue, DEFAULT_CONCURRENCY};
