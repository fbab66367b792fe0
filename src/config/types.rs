//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_FIRST_PART_SIZE, DEFAULT_MAX_CONCURRENCY, DEFAULT_NB_TOP_DOMAINS, DEFAULT_PART_SIZE,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Where a task reads its streams from and where it works.
#[derive(Debug, Clone, Args)]
pub struct StreamOptions {
    /// Directory holding the crawl's stream parts (also the output location)
    #[arg(long, env = "CRAWLSTATS_LOCATION")]
    pub location: PathBuf,

    /// Scratch directory for fetched parts (a temporary one is created if omitted)
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Fetch parts again even if present in the scratch directory
    #[arg(long)]
    pub force_fetch: bool,
}

impl StreamOptions {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            tmp_dir: None,
            force_fetch: false,
        }
    }

    pub(crate) fn location_str(&self) -> String {
        self.location.to_string_lossy().into_owned()
    }
}

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "crawlstats", version, about)]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List links pointing at erroring pages
    #[command(name = "bad-links")]
    BadLinks {
        #[command(flatten)]
        streams: StreamOptions,

        /// Url ids covered by the first output part
        #[arg(long, default_value_t = DEFAULT_FIRST_PART_SIZE)]
        first_part_id_size: u64,

        /// Url ids covered by each following output part
        #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
        part_id_size: u64,
    },

    /// Count bad links per source page and http code
    #[command(name = "bad-link-counters")]
    BadLinkCounters {
        #[command(flatten)]
        streams: StreamOptions,

        /// Parts to process
        #[arg(long = "part-id", required = true, num_args = 1..)]
        part_ids: Vec<u32>,

        /// Parts processed at the same time
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
        max_concurrency: usize,
    },

    /// Rank the most linked external domains
    #[command(name = "top-domains")]
    TopDomains {
        #[command(flatten)]
        streams: StreamOptions,

        /// Number of domains in each ranking
        #[arg(long, default_value_t = DEFAULT_NB_TOP_DOMAINS)]
        nb_top_domains: usize,
    },

    /// Merge partition metric batches
    #[command(name = "consolidate")]
    Consolidate {
        /// Batch files (JSON arrays of cross-property records)
        #[arg(required = true)]
        batches: Vec<PathBuf>,

        /// Emit dotted counter paths instead of nested counters
        #[arg(long)]
        flatten: bool,

        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Log the value of every feature insight
        #[arg(long)]
        insights: bool,
    },

    /// List features with their streams and insights
    #[command(name = "features")]
    Features,
}
