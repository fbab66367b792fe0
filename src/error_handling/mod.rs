//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for each concern (streams, consolidation, resolution)
//! - Processing statistics tracking (warnings and info metrics)
//!
//! Fatal conditions are `Result` errors. Non-fatal conditions (dropped
//! records, unresolved samples) are counted as **warnings**; notable volumes
//! are counted as **info**.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ConsolidationError, InfoType, InitializationError, ResolveError, StreamError, WarningType,
};
