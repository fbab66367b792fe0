//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (part sizes, ranking size, concurrency)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Cli, Command, LogFormat, LogLevel, StreamOptions};
