//! Tasks: one entry point per produced artifact.
//!
//! A task loads its input streams through a [`StreamSource`], runs one
//! aggregation pipeline and persists the result next to the inputs. A task
//! either writes all of its artifacts or none of them.
//!
//! [`StreamSource`]: crate::streams::StreamSource

mod bad_links;
mod consolidate;
mod top_domains;

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;
use tempfile::NamedTempFile;

pub use bad_links::{make_bad_link_counter_file, make_bad_link_counter_files, make_bad_link_file};
pub use consolidate::consolidate_batches;
pub use top_domains::make_top_domains_files;

/// JSON document written to a temporary file, not yet in place.
struct PendingJson {
    file: NamedTempFile,
    target: PathBuf,
}

impl PendingJson {
    fn write<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<Self> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        let mut writer = io::BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, value)
            .with_context(|| format!("Failed to serialize {}", target.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", target.display()))?;
        drop(writer);

        Ok(Self {
            file,
            target: target.to_path_buf(),
        })
    }

    fn commit(self) -> Result<PathBuf> {
        self.file
            .persist(&self.target)
            .with_context(|| format!("Failed to write {}", self.target.display()))?;
        Ok(self.target)
    }

    /// Commits every document, or none: on failure the documents already in
    /// place are removed and the others are discarded.
    fn commit_all(pending: Vec<PendingJson>) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(pending.len());
        for doc in pending {
            match doc.commit() {
                Ok(path) => committed.push(path),
                Err(e) => {
                    for path in &committed {
                        if let Err(remove_err) = fs::remove_file(path) {
                            warn!("Could not roll back {}: {}", path.display(), remove_err);
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(committed)
    }
}

/// Writer that treats a closed downstream pipe as success.
pub(crate) struct IgnoreBrokenPipe<W: Write> {
    inner: W,
}

impl<W: Write> IgnoreBrokenPipe<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for IgnoreBrokenPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                Ok(buf.len())
            } else {
                Err(e)
            }
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                Ok(())
            } else {
                Err(e)
            }
        })
    }
}
