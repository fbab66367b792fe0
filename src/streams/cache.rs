//! Replay cache for streams that must be scanned more than once.
//!
//! A source stream may be expensive to re-read or filter, so it is written
//! once to a local temporary file and replayed from there. The file is
//! deleted when the cache is dropped, whatever the outcome of the passes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use super::{RecordLines, StreamDef};
use crate::error_handling::StreamError;

/// Local, replayable copy of a stream.
pub struct StreamCache<D> {
    file: NamedTempFile,
    len: usize,
    _def: PhantomData<D>,
}

/// One replay pass over a [`StreamCache`].
pub type CachedStream<D> = RecordLines<D, BufReader<File>>;

impl<D: StreamDef> StreamCache<D> {
    /// Materializes `records` into a new cache file under `dir`.
    pub fn cache<I>(records: I, dir: &Path) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = D::Record>,
    {
        let file = NamedTempFile::new_in(dir).map_err(|e| StreamError::io(dir, e))?;
        let path = file.path().to_path_buf();
        let mut writer = BufWriter::new(file.as_file());
        let mut len = 0;
        for record in records {
            writeln!(writer, "{}", D::encode_line(&record)).map_err(|e| StreamError::io(&path, e))?;
            len += 1;
        }
        writer.flush().map_err(|e| StreamError::io(&path, e))?;
        drop(writer);

        debug!(
            "Cached {} {} record(s) in {}",
            len,
            D::DESCRIPTOR.name,
            path.display()
        );
        Ok(Self {
            file,
            len,
            _def: PhantomData,
        })
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Opens an independent pass from the first cached record.
    pub fn get_stream(&self) -> Result<CachedStream<D>, StreamError> {
        let path: PathBuf = self.file.path().to_path_buf();
        let handle = self.file.reopen().map_err(|e| StreamError::io(&path, e))?;
        Ok(RecordLines::new(path, BufReader::new(handle)))
    }
}
