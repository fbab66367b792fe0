//! crawlstats library: crawl statistics aggregation
//!
//! This library turns the per-page streams of a website crawl into compact
//! summaries: links pointing at erroring pages, per-page bad link counters,
//! the most linked external domains, and consolidated cross-property metrics
//! merged from partition batches.
//!
//! # Example
//!
//! ```no_run
//! use crawlstats::config::StreamOptions;
//! use crawlstats::error_handling::ProcessingStats;
//! use crawlstats::streams::LocalStreamSource;
//! use crawlstats::tasks::{make_bad_link_counter_file, make_bad_link_file};
//!
//! # fn main() -> anyhow::Result<()> {
//! let opts = StreamOptions::new("/data/crawl-42");
//! let stats = ProcessingStats::new();
//!
//! make_bad_link_file(&LocalStreamSource, &opts, 500_000, 500_000, &stats)?;
//! let written = make_bad_link_counter_file(&LocalStreamSource, &opts, 0, &stats)?;
//! println!("Wrote {} counter part(s)", written.len());
//! stats.log_summary();
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! [`tasks::make_bad_link_counter_files`] requires a Tokio runtime; every
//! other entry point is synchronous.

pub mod config;
pub mod consolidate;
pub mod domain;
pub mod error_handling;
pub mod features;
pub mod initialization;
pub mod links;
pub mod models;
pub mod resolve;
pub mod streams;
pub mod tasks;

// Re-export public API
pub use config::{Cli, Command, LogFormat, LogLevel, StreamOptions};
pub use consolidate::{
    consolidate, ConsolidatedMetrics, ConsolidatedView, CounterTree, CrossPropertyKey,
    CrossPropertyRecord, MetricsConsolidator,
};
pub use error_handling::ProcessingStats;
pub use features::FeatureRegistry;
pub use models::{BadLink, BadLinkCount, DomainStat, Outlink, PageStatus};
