//! Configuration types for fs-crawler
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Library-facing crawl options with defaults
//! - Validated runtime configuration (compiled globs and ignore patterns)

use crate::error::ConfigError;
use crate::glob::GlobMatcher;
use crate::walker::queue::DEFAULT_CONCURRENCY;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Ignore pattern used when none is configured: any `node_modules` segment
pub const DEFAULT_IGNORE_PATTERN: &str = r"(^|[/\\])node_modules([/\\]|$)";

/// Bounded-concurrency file crawler
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fs-crawler",
    version,
    about = "Crawl a directory tree with bounded concurrency",
    long_about = "Recursively enumerates files under ROOT while bounding the number of\n\
                  concurrent filesystem operations, then runs the chosen operation over\n\
                  every file found.\n\n\
                  Files under node_modules are ignored unless --ignore or\n\
                  --no-default-ignore is given.",
    after_help = "EXAMPLES:\n    \
        fs-crawler list ./src -m '*.rs'\n    \
        fs-crawler du /var/log -c 16 --max-depth 2\n    \
        fs-crawler larger-than 1048576 ~/Downloads --ignore '\\.cache'\n    \
        fs-crawler check /data --strict"
)]
pub struct CliArgs {
    /// Operation to run over the crawled files
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode - suppress header, progress and summary
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Print every file under ROOT
    List {
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Print every file with its size
    Sizes {
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Print files of at least BYTES bytes
    LargerThan {
        /// Minimum size in bytes
        #[arg(value_name = "BYTES")]
        bytes: u64,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Sum the size of every file, in crawl order
    Du {
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Check that every file can be opened for reading
    Check {
        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

impl Command {
    /// Crawl arguments shared by every subcommand
    pub fn crawl_args(&self) -> &CrawlArgs {
        match self {
            Command::List { crawl }
            | Command::Sizes { crawl }
            | Command::LargerThan { crawl, .. }
            | Command::Du { crawl }
            | Command::Check { crawl } => crawl,
        }
    }

    /// Subcommand name for display
    pub fn name(&self) -> &'static str {
        match self {
            Command::List { .. } => "list",
            Command::Sizes { .. } => "sizes",
            Command::LargerThan { .. } => "larger-than",
            Command::Du { .. } => "du",
            Command::Check { .. } => "check",
        }
    }
}

/// Crawl options accepted by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Root directory to crawl
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Maximum number of concurrent filesystem operations and callbacks
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY, value_name = "NUM")]
    pub concurrency: usize,

    /// Abort on permission errors instead of skipping the path
    #[arg(long)]
    pub strict: bool,

    /// Only keep files matching this glob (can be repeated)
    #[arg(short = 'm', long = "match", value_name = "GLOB", action = clap::ArgAction::Append)]
    pub match_patterns: Vec<String>,

    /// Prune paths matching this regex (can be repeated; replaces the default)
    #[arg(long = "ignore", value_name = "REGEX", action = clap::ArgAction::Append)]
    pub ignore_paths: Vec<String>,

    /// Do not ignore node_modules by default
    #[arg(long)]
    pub no_default_ignore: bool,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,
}

impl CrawlArgs {
    /// Convert to library options
    pub fn to_options(&self) -> CrawlOptions {
        let ignore_paths = if !self.ignore_paths.is_empty() {
            self.ignore_paths.clone()
        } else if self.no_default_ignore {
            Vec::new()
        } else {
            vec![DEFAULT_IGNORE_PATTERN.to_string()]
        };

        CrawlOptions {
            root: Some(self.root.clone()),
            concurrency: self.concurrency,
            strict: self.strict,
            match_patterns: self.match_patterns.clone(),
            ignore_paths,
            max_depth: self.max_depth,
        }
    }
}

/// Unvalidated crawl options
///
/// ```
/// use fs_crawler::CrawlOptions;
///
/// let options = CrawlOptions::new("/srv/www")
///     .concurrency(8)
///     .match_patterns(["*.html"])
///     .max_depth(3);
/// assert_eq!(options.concurrency, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Traversal start point (required)
    pub root: Option<PathBuf>,

    /// Maximum in-flight async operations
    pub concurrency: usize,

    /// Abort on permission errors instead of skipping
    pub strict: bool,

    /// Glob patterns; empty matches every file
    pub match_patterns: Vec<String>,

    /// Regular expressions pruning matching paths and their descendants
    pub ignore_paths: Vec<String>,

    /// Recursion limit; `None` is unbounded
    pub max_depth: Option<usize>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            root: None,
            concurrency: DEFAULT_CONCURRENCY,
            strict: false,
            match_patterns: Vec::new(),
            ignore_paths: vec![DEFAULT_IGNORE_PATTERN.to_string()],
            max_depth: None,
        }
    }
}

impl CrawlOptions {
    /// Options rooted at `root`, everything else default
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn match_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ignore patterns (including the `node_modules` default)
    pub fn ignore_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Absolute traversal start point
    pub root: PathBuf,

    /// Maximum in-flight async operations
    pub concurrency: usize,

    /// Abort on permission errors
    pub strict: bool,

    /// Compiled match patterns
    pub matcher: GlobMatcher,

    /// Compiled ignore patterns
    pub ignore_patterns: Vec<Regex>,

    /// Recursion limit
    pub max_depth: Option<usize>,
}

impl CrawlConfig {
    /// Create and validate configuration from options
    pub fn from_options(options: CrawlOptions) -> Result<Self, ConfigError> {
        let root = options.root.ok_or(ConfigError::MissingRoot)?;
        if root.as_os_str().is_empty() {
            return Err(ConfigError::MissingRoot);
        }

        let root = std::path::absolute(&root).map_err(|e| ConfigError::InvalidRoot {
            path: root.clone(),
            reason: e.to_string(),
        })?;

        if options.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: options.concurrency,
            });
        }

        let matcher = GlobMatcher::new(options.match_patterns)?;

        let ignore_patterns = options
            .ignore_paths
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidIgnorePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root,
            concurrency: options.concurrency,
            strict: options.strict,
            matcher,
            ignore_patterns,
            max_depth: options.max_depth,
        })
    }

    /// Check if a path should be pruned
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.ignore_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.ignore_patterns.iter().any(|re| re.is_match(&path))
    }

    /// Remaining-depth budget the root is visited with
    pub fn depth_budget(&self) -> Option<i64> {
        self.max_depth
            .map(|depth| i64::try_from(depth).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::from_options(CrawlOptions::new("/data")).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.concurrency, 4);
        assert!(!config.strict);
        assert!(config.matcher.is_empty());
        assert_eq!(config.max_depth, None);
        assert_eq!(config.depth_budget(), None);
    }

    #[test]
    fn test_missing_root() {
        let err = CrawlConfig::from_options(CrawlOptions::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingRoot);

        let err = CrawlConfig::from_options(CrawlOptions::new("")).unwrap_err();
        assert_eq!(err, ConfigError::MissingRoot);
    }

    #[test]
    fn test_invalid_concurrency() {
        let err = CrawlConfig::from_options(CrawlOptions::new("/data").concurrency(0)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidConcurrency { value: 0 });
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let config = CrawlConfig::from_options(CrawlOptions::new("some/dir")).unwrap();
        assert!(config.root.is_absolute());
        assert!(config.root.ends_with("some/dir"));
    }

    #[test]
    fn test_default_ignore_matches_segments() {
        let config = CrawlConfig::from_options(CrawlOptions::new("/data")).unwrap();
        assert!(config.is_ignored(Path::new("/data/node_modules")));
        assert!(config.is_ignored(Path::new("/data/node_modules/pkg/index.js")));
        assert!(!config.is_ignored(Path::new("/data/my_node_modules_backup")));
        assert!(!config.is_ignored(Path::new("/data/src/index.js")));
    }

    #[test]
    fn test_custom_ignore_patterns() {
        let config = CrawlConfig::from_options(
            CrawlOptions::new("/data").ignore_paths([r"\.snapshot", r"/tmp$"]),
        )
        .unwrap();
        assert!(config.is_ignored(Path::new("/data/.snapshot/hourly.0")));
        assert!(config.is_ignored(Path::new("/data/tmp")));
        assert!(!config.is_ignored(Path::new("/data/node_modules")));

        let none = CrawlConfig::from_options(
            CrawlOptions::new("/data").ignore_paths(Vec::<String>::new()),
        )
        .unwrap();
        assert!(!none.is_ignored(Path::new("/data/node_modules")));
    }

    #[test]
    fn test_invalid_patterns() {
        let err = CrawlConfig::from_options(CrawlOptions::new("/data").ignore_paths(["(unclosed"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIgnorePattern { .. }));

        let err = CrawlConfig::from_options(CrawlOptions::new("/data").match_patterns(["[z-a]"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { .. }));
    }

    #[test]
    fn test_cli_args_to_options() {
        let args = CliArgs::try_parse_from([
            "fs-crawler",
            "list",
            "/srv",
            "-c",
            "8",
            "-m",
            "*.js",
            "-m",
            "*.ts",
            "--max-depth",
            "2",
            "--strict",
        ])
        .unwrap();

        assert_eq!(args.command.name(), "list");
        let options = args.command.crawl_args().to_options();
        assert_eq!(options.root, Some(PathBuf::from("/srv")));
        assert_eq!(options.concurrency, 8);
        assert!(options.strict);
        assert_eq!(options.match_patterns, vec!["*.js", "*.ts"]);
        assert_eq!(options.ignore_paths, vec![DEFAULT_IGNORE_PATTERN]);
        assert_eq!(options.max_depth, Some(2));
    }

    #[test]
    fn test_cli_ignore_overrides_default() {
        let args = CliArgs::try_parse_from([
            "fs-crawler",
            "larger-than",
            "1024",
            "/srv",
            "--ignore",
            "cache",
        ])
        .unwrap();

        match &args.command {
            Command::LargerThan { bytes, crawl } => {
                assert_eq!(*bytes, 1024);
                assert_eq!(crawl.to_options().ignore_paths, vec!["cache"]);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let args =
            CliArgs::try_parse_from(["fs-crawler", "du", "/srv", "--no-default-ignore"]).unwrap();
        assert!(args.command.crawl_args().to_options().ignore_paths.is_empty());
    }
}
