//! Glob matching for crawl results
//!
//! A thin wrapper over a compiled [`GlobSet`]. An empty pattern list matches
//! every path. Wildcards cross directory separators (`*.js` matches
//! `/abs/dir/a.js`), so patterns can be written without anchoring them to
//! the crawl root.

use crate::error::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Compiled set of match patterns
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl GlobMatcher {
    /// Compile `patterns`; an empty list matches everything
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Ok(Self::match_all());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .build()
                .map_err(|e| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|e| ConfigError::InvalidGlob {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self {
            patterns,
            set: Some(set),
        })
    }

    /// Matcher that accepts every path
    pub fn match_all() -> Self {
        Self {
            patterns: Vec::new(),
            set: None,
        }
    }

    /// True when no patterns are configured
    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    /// Source patterns, in configuration order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a single path against the patterns
    pub fn is_match(&self, path: &Path) -> bool {
        self.set.as_ref().map_or(true, |set| set.is_match(path))
    }
}

impl Default for GlobMatcher {
    fn default() -> Self {
        Self::match_all()
    }
}
