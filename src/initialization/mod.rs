//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - Concurrency limit for partition jobs
//! - Scratch directory for a task
//!
//! All initialization functions return proper error types for error handling.

mod logger;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::Semaphore;

use crate::error_handling::InitializationError;

// Re-export public API
pub use logger::init_logger_with;

/// Initializes a semaphore for controlling concurrency.
///
/// # Arguments
///
/// * `count` - Maximum number of concurrent partition jobs allowed
///
/// # Returns
///
/// An `Arc<Semaphore>` that can be shared across multiple tasks.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}

/// Scratch directory of one task.
///
/// Either a caller-provided directory, left in place, or a temporary one
/// removed when this value is dropped.
#[derive(Debug)]
pub enum ScratchDir {
    Provided(PathBuf),
    Temporary(TempDir),
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        match self {
            ScratchDir::Provided(path) => path,
            ScratchDir::Temporary(dir) => dir.path(),
        }
    }
}

/// Uses `tmp_dir` when given (creating it if needed), or a new temporary
/// directory otherwise.
///
/// # Errors
///
/// Returns `InitializationError::ScratchDirError` if the directory cannot be
/// created.
pub fn init_scratch_dir(tmp_dir: Option<&Path>) -> Result<ScratchDir, InitializationError> {
    match tmp_dir {
        Some(path) => {
            std::fs::create_dir_all(path)?;
            Ok(ScratchDir::Provided(path.to_path_buf()))
        }
        None => Ok(ScratchDir::Temporary(
            tempfile::Builder::new().prefix("crawlstats").tempdir()?,
        )),
    }
}
