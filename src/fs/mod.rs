//! Filesystem access module
//!
//! The crawl engine only needs two primitives, `stat` and `read_dir`, both
//! asynchronous and independently failable. They sit behind the
//! [`FileSystem`] trait so the engine can run against the local disk
//! ([`LocalFs`]) or an in-memory tree in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Crawler                         │
//! │  - one stat (+ readdir for directories) per slot    │
//! └──────────────────────────┬──────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                 dyn FileSystem                       │
//! │  - LocalFs: tokio::fs on the blocking pool          │
//! │  - test doubles: injected errors and delays         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fs_crawler::fs::{FileSystem, LocalFs};
//! use std::path::Path;
//!
//! # async fn demo() -> std::io::Result<()> {
//! let fs = LocalFs;
//! if fs.stat(Path::new("/etc")).await?.is_dir() {
//!     for name in fs.read_dir(Path::new("/etc")).await? {
//!         println!("{}", name.to_string_lossy());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod local;
pub mod types;

pub use local::LocalFs;
pub use types::EntryKind;

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Asynchronous filesystem primitives used by the crawl engine
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Report whether `path` is a directory (following symlinks)
    async fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// List the entry names of the directory at `path`
    ///
    /// Names are returned without the parent path; the crawl engine joins
    /// them and preserves the returned order.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;
}
