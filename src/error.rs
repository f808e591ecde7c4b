//! Error types for fs-crawler
//!
//! This module defines the error hierarchy that covers:
//! - Configuration errors (missing root, invalid concurrency, bad patterns)
//! - Filesystem errors raised by stat/readdir during a crawl
//! - Errors and panics raised by user callbacks in the combinators
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Carry the offending path so failures are actionable
//! - Preserve the underlying `io::Error` where it adds information

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed error returned by user callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for crawl operations
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem errors during traversal
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    /// A user callback reported an error
    #[error("Callback failed for '{}': {source}", path.display())]
    Callback {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A user callback panicked
    #[error("Callback panicked for '{}': {message}", path.display())]
    CallbackPanicked { path: PathBuf, message: String },

    /// Reduce without a seed over an empty file list
    #[error("Reduce of an empty file list with no seed value")]
    EmptyReduction,

    /// Work was discarded from the task queue before it could run
    #[error("Task was drained from the queue before it started")]
    Drained,

    /// Operation interrupted (signal or runtime shutdown)
    #[error("Operation interrupted")]
    Interrupted,
}

impl CrawlError {
    /// Returns the path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            CrawlError::Fs(e) => Some(e.path()),
            CrawlError::Callback { path, .. } | CrawlError::CallbackPanicked { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No root path supplied
    #[error("Invalid configuration: root path is required")]
    MissingRoot,

    /// Root path could not be made absolute
    #[error("Invalid root path '{}': {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// Concurrency below one
    #[error("Invalid concurrency {value}: must be greater than zero")]
    InvalidConcurrency { value: usize },

    /// Glob pattern failed to compile
    #[error("Invalid match pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// Ignore pattern failed to compile
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern { pattern: String, reason: String },
}

/// Filesystem primitive that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Stat,
    ReadDir,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsOp::Stat => f.write_str("stat"),
            FsOp::ReadDir => f.write_str("readdir"),
        }
    }
}

/// Filesystem errors raised while crawling
#[derive(Error, Debug)]
pub enum FsError {
    /// Permission denied
    #[error("Permission denied ({op}): '{}'", path.display())]
    PermissionDenied { path: PathBuf, op: FsOp },

    /// Path not found
    #[error("Path not found ({op}): '{}'", path.display())]
    NotFound { path: PathBuf, op: FsOp },

    /// Stat failed for another reason
    #[error("Failed to stat '{}': {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory listing failed for another reason
    #[error("Failed to read directory '{}': {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an `io::Error` raised by `op` on `path`
    pub fn from_io(op: FsOp, path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path, op },
            io::ErrorKind::NotFound => FsError::NotFound { path, op },
            _ => match op {
                FsOp::Stat => FsError::StatFailed { path, source: err },
                FsOp::ReadDir => FsError::ReadDirFailed { path, source: err },
            },
        }
    }

    /// Check if this is a permission failure (skippable in non-strict mode)
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FsError::PermissionDenied { .. })
    }

    /// Returns the path associated with this error
    pub fn path(&self) -> &Path {
        match self {
            FsError::PermissionDenied { path, .. }
            | FsError::NotFound { path, .. }
            | FsError::StatFailed { path, .. }
            | FsError::ReadDirFailed { path, .. } => path,
        }
    }
}

/// Result type alias for CrawlError
pub type Result<T> = std::result::Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_classification() {
        let denied = FsError::from_io(
            FsOp::Stat,
            Path::new("/secret"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(denied.is_permission_denied());

        let missing = FsError::from_io(
            FsOp::ReadDir,
            Path::new("/missing"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(!missing.is_permission_denied());
        assert!(matches!(missing, FsError::NotFound { op: FsOp::ReadDir, .. }));

        let other = FsError::from_io(
            FsOp::ReadDir,
            Path::new("/broken"),
            io::Error::new(io::ErrorKind::Other, "device error"),
        );
        assert!(!other.is_permission_denied());
        assert!(matches!(other, FsError::ReadDirFailed { .. }));
        assert_eq!(other.path(), Path::new("/broken"));
    }

    #[test]
    fn test_error_conversion() {
        let fs_err = FsError::NotFound {
            path: "/missing".into(),
            op: FsOp::Stat,
        };
        let crawl_err: CrawlError = fs_err.into();
        assert!(matches!(crawl_err, CrawlError::Fs(_)));
        assert_eq!(crawl_err.path(), Some(Path::new("/missing")));

        let config_err: CrawlError = ConfigError::InvalidConcurrency { value: 0 }.into();
        assert!(config_err.to_string().contains("must be greater than zero"));
        assert_eq!(config_err.path(), None);
    }
}
