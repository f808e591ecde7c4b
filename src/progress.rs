//! Progress reporting for the crawler
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::Crawler;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Point-in-time view of a running crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlProgress {
    pub dirs: u64,
    pub files: u64,
    pub denied: u64,
    /// Queue slots handed out so far (stats, listings and callbacks)
    pub operations: u64,
    pub running: usize,
    pub pending: usize,
    pub concurrency: usize,
    pub elapsed: Duration,
}

impl CrawlProgress {
    /// Sample the crawler's statistics and queue
    pub fn capture(crawler: &Crawler, started: Instant) -> Self {
        let stats = crawler.stats();
        let queue = crawler.queue();
        Self {
            dirs: stats.dirs(),
            files: stats.files(),
            denied: stats.denied.load(Ordering::Relaxed),
            operations: queue.stats().dispatched_count(),
            running: queue.running(),
            pending: queue.pending(),
            concurrency: queue.concurrency(),
            elapsed: started.elapsed(),
        }
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files as f64 / secs
        } else {
            0.0
        }
    }
}

/// Progress reporter that displays crawl status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &CrawlProgress) {
        let msg = format!(
            "Dirs: {} | Files: {} | Rate: {:.0}/s | Queue: {} | Slots: {}/{}",
            format_number(progress.dirs),
            format_number(progress.files),
            progress.files_per_second(),
            progress.pending,
            progress.running,
            progress.concurrency,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Format a byte count for humans
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Print a summary of the crawl results
pub fn print_summary(command: &str, progress: &CrawlProgress, results: u64, bytes: Option<u64>) {
    let duration_secs = progress.elapsed.as_secs_f64();

    println!();
    println!(
        "{} {}",
        style("Crawl Complete").green().bold(),
        style(format!("({command})")).dim()
    );
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(progress.dirs)
    );
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(progress.files)
    );
    println!("  {} {}", style("Results:").bold(), format_number(results));
    println!(
        "  {} {}",
        style("Operations:").bold(),
        format_number(progress.operations)
    );
    if let Some(bytes) = bytes {
        println!("  {} {}", style("Total Size:").bold(), format_bytes(bytes));
    }
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        progress.files_per_second()
    );
    if progress.denied > 0 {
        println!(
            "  {} {}",
            style("Skipped (permission denied):").yellow().bold(),
            format_number(progress.denied)
        );
    }
    println!();
}

/// Print a header at the start of the crawl
pub fn print_header(root: &Path, concurrency: usize, command: &str) {
    println!();
    println!(
        "{} {}",
        style("fs-crawler").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root.display());
    println!("  {} {}", style("Concurrency:").bold(), concurrency);
    println!("  {} {}", style("Command:").bold(), command);
    println!();
}
