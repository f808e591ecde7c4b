//! fs-crawler - bounded-concurrency directory crawler
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use fs_crawler::config::{CliArgs, Command};
use fs_crawler::progress::{
    format_bytes, print_header, print_summary, CrawlProgress, ProgressReporter,
};
use fs_crawler::{CrawlError, Crawler};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose, args.quiet)?;

    // Validate and create crawler
    let options = args.command.crawl_args().to_options();
    let crawler = Arc::new(Crawler::from_options(options).context("Invalid configuration")?);

    // Setup signal handler: refuse new work, let running slots finish
    {
        let queue = crawler.queue().clone();
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupt received, shutting down...");
            queue.shutdown();
        })
        .context("Failed to set signal handler")?;
    }

    // Single-threaded runtime; filesystem calls go to the blocking pool
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(execute(crawler, &args))
}

async fn execute(crawler: Arc<Crawler>, args: &CliArgs) -> Result<()> {
    let command = args.command.name();
    let show_progress = !args.quiet;

    if show_progress {
        print_header(
            &crawler.config().root,
            crawler.config().concurrency,
            command,
        );
    }

    let started = Instant::now();
    let progress = show_progress.then(ProgressReporter::new);
    let ticker = progress.clone().map(|reporter| {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(200));
            loop {
                interval.tick().await;
                reporter.update(&CrawlProgress::capture(&crawler, started));
            }
        })
    });

    if let Some(ref p) = progress {
        p.set_status("Crawling...");
    }

    let outcome = match run_command(&crawler, &args.command).await {
        Err(_) if crawler.queue().is_shut_down() => Err(CrawlError::Interrupted),
        other => other,
    };

    if let Some(ticker) = ticker {
        ticker.abort();
    }

    // Finish progress
    if let Some(ref p) = progress {
        match &outcome {
            Ok(_) => p.finish_and_clear(),
            Err(CrawlError::Interrupted) => p.finish("Crawl interrupted"),
            Err(_) => p.finish("Crawl failed"),
        }
    }

    let (results, bytes) = outcome.with_context(|| format!("{command} failed"))?;

    if show_progress {
        print_summary(
            command,
            &CrawlProgress::capture(&crawler, started),
            results,
            bytes,
        );
    }

    info!(command, results, "Done");
    Ok(())
}

/// Run the selected subcommand, printing its results
///
/// Returns the number of results and, for size-aware commands, the total
/// number of bytes.
async fn run_command(
    crawler: &Crawler,
    command: &Command,
) -> fs_crawler::Result<(u64, Option<u64>)> {
    match command {
        Command::List { .. } => {
            let files = crawler.crawl_all().await?;
            for file in &files {
                println!("{}", file.display());
            }
            Ok((files.len() as u64, None))
        }

        Command::Sizes { .. } => {
            let sizes = crawler
                .map(|path| async move {
                    let len = tokio::fs::metadata(&path).await?.len();
                    Ok::<_, io::Error>((path, len))
                })
                .await?;

            let mut total = 0u64;
            for (path, len) in &sizes {
                total += len;
                println!("{:>12}  {}", format_bytes(*len), path.display());
            }
            Ok((sizes.len() as u64, Some(total)))
        }

        Command::LargerThan { bytes, .. } => {
            let min = *bytes;
            let files = crawler
                .filter(move |path| async move {
                    let len = tokio::fs::metadata(&path).await?.len();
                    Ok::<_, io::Error>(len >= min)
                })
                .await?;

            for file in &files {
                println!("{}", file.display());
            }
            Ok((files.len() as u64, None))
        }

        Command::Du { .. } => {
            let total = crawler
                .reduce(Some(0u64), |acc, path| async move {
                    let len = tokio::fs::metadata(&path).await?.len();
                    Ok::<_, io::Error>(acc.unwrap_or_default() + len)
                })
                .await?;

            println!("{}\t{}", total, crawler.config().root.display());
            Ok((crawler.stats().files(), Some(total)))
        }

        Command::Check { .. } => {
            crawler
                .for_each(|path| async move {
                    tokio::fs::File::open(&path).await.map(drop)
                })
                .await?;

            let files = crawler.stats().files();
            println!("{} files readable", files);
            Ok((files, None))
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("fs_crawler=debug,warn")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new("fs_crawler=info,warn")
    };

    // Logs go to stderr so results on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
