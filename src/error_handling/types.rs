//! Error type definitions.
//!
//! This module defines all error, warning, and info types used throughout the application.

use std::path::PathBuf;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error creating the scratch directory for a task.
    #[error("Scratch directory error: {0}")]
    ScratchDirError(#[from] std::io::Error),
}

/// Error types for reading, writing and caching record streams.
#[derive(Error, Debug)]
pub enum StreamError {
    /// I/O failure on a stream file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line could not be decoded into a typed record.
    #[error("Malformed {stream} record at {path}:{line}: {reason}")]
    Decode {
        /// Stream name (e.g. `urlinfos`)
        stream: &'static str,
        /// File the line came from
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// No part file exists for the requested stream.
    #[error("No {stream} part found in {location}")]
    MissingPart {
        /// Stream name
        stream: &'static str,
        /// Location that was searched
        location: PathBuf,
    },
}

impl StreamError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StreamError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error types for partition metric consolidation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsolidationError {
    /// The same metric path is a scalar in one batch and a branch in another.
    ///
    /// Partitions disagree on the counter schema; the run is aborted rather
    /// than coercing one side.
    #[error("Schema mismatch at metric path '{path}': scalar counter merged with nested counters")]
    SchemaMismatch {
        /// Dotted metric path where the mismatch was found
        path: String,
    },

    /// Two distinct counters flatten to the same dotted path.
    ///
    /// Happens when a metric name itself contains the path separator.
    #[error("Flattened metric path '{path}' is produced by more than one counter")]
    PathCollision {
        /// Dotted path produced twice
        path: String,
    },
}

/// Error types for sample URL resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The resolution backend could not be read.
    #[error("URL resolution backend unavailable: {0}")]
    Unavailable(String),

    /// Reading the url id stream failed.
    #[error("URL resolution failed: {0}")]
    Stream(#[from] StreamError),
}

/// Types of warnings that can occur while aggregating.
///
/// Warnings are non-fatal: the record or value is dropped or kept raw, and
/// the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    InvalidDestinationUrl, // External link whose URL has no usable domain
    SampleUrlUnresolved,   // Sample url id could not be turned into a URL
    MissingInsights,       // Feature declares no insights
}

/// Types of informational metrics tracked while aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    InternalLinkSkipped, // Link pointing inside the crawled site (top domains)
    BadLinkFound,
    BadLinkCountEmitted,
    ConsolidatedKey,
}

impl std::fmt::Display for WarningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::InvalidDestinationUrl => "Invalid destination URL",
            WarningType::SampleUrlUnresolved => "Unresolved sample URL",
            WarningType::MissingInsights => "Missing feature insights",
        }
    }
}

impl std::fmt::Display for InfoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::InternalLinkSkipped => "Internal link skipped",
            InfoType::BadLinkFound => "Bad link found",
            InfoType::BadLinkCountEmitted => "Bad link counter emitted",
            InfoType::ConsolidatedKey => "Consolidated cross-property key",
        }
    }
}
