//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `crawlstats` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crawlstats::config::{Cli, Command};
use crawlstats::error_handling::ProcessingStats;
use crawlstats::features::FeatureRegistry;
use crawlstats::initialization::init_logger_with;
use crawlstats::resolve::UrlIdsResolver;
use crawlstats::streams::LocalStreamSource;
use crawlstats::tasks;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting CRAWLSTATS_LOCATION in .env without exporting it manually
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let stats = Arc::new(ProcessingStats::new());
    let result = run(cli.command, Arc::clone(&stats)).await;
    stats.log_summary();

    if let Err(e) = result {
        eprintln!("crawlstats error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, stats: Arc<ProcessingStats>) -> Result<()> {
    match command {
        Command::BadLinks {
            streams,
            first_part_id_size,
            part_id_size,
        } => {
            let written = tokio::task::spawn_blocking(move || {
                tasks::make_bad_link_file(
                    &LocalStreamSource,
                    &streams,
                    first_part_id_size,
                    part_id_size,
                    &stats,
                )
            })
            .await??;
            report(&written);
        }
        Command::BadLinkCounters {
            streams,
            part_ids,
            max_concurrency,
        } => {
            let written = tasks::make_bad_link_counter_files(
                Arc::new(LocalStreamSource),
                streams,
                part_ids,
                max_concurrency,
                stats,
            )
            .await?;
            report(&written);
        }
        Command::TopDomains {
            streams,
            nb_top_domains,
        } => {
            let written = tokio::task::spawn_blocking(move || {
                let scratch = streams.tmp_dir.clone().unwrap_or_else(|| streams.location.clone());
                let resolver = UrlIdsResolver::new(
                    &LocalStreamSource,
                    streams.location.to_string_lossy(),
                    scratch,
                    streams.force_fetch,
                );
                tasks::make_top_domains_files(
                    &LocalStreamSource,
                    &resolver,
                    &streams,
                    nb_top_domains,
                    &stats,
                )
            })
            .await??;
            report(&written);
        }
        Command::Consolidate {
            batches,
            flatten,
            output,
            insights,
        } => {
            let registry = FeatureRegistry::builtin();
            tasks::consolidate_batches(
                &batches,
                flatten,
                output.as_deref(),
                insights.then_some(&registry),
                &stats,
            )?;
        }
        Command::Features => {
            let registry = FeatureRegistry::builtin();
            for feature in registry.features() {
                println!("{} ({}): {}", feature.name, feature.identifier, feature.description);
                for stream in feature.get_streams_def() {
                    println!("  stream {}: {}", stream.name, stream.fields.join(", "));
                }
                for insight in feature.get_insights(&stats) {
                    println!("  insight {}: {}", insight.identifier, insight.metric);
                }
            }
        }
    }
    Ok(())
}

fn report(written: &[std::path::PathBuf]) {
    println!(
        "Wrote {} file{}",
        written.len(),
        if written.len() == 1 { "" } else { "s" }
    );
    for path in written {
        println!("  {}", path.display());
    }
}
