//! Stream sources: where part files come from.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::BufReader;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;

use super::{RecordLines, StreamDef};
use crate::error_handling::StreamError;

/// File name of one part of a stream.
pub fn part_file_name(prefix: &str, part_id: u32) -> String {
    format!("{prefix}.txt.{part_id}.gz")
}

/// Part id encoded in a file name, when the name belongs to `prefix`.
fn parse_part_id(prefix: &str, file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(prefix)?
        .strip_prefix(".txt.")?
        .strip_suffix(".gz")?
        .parse()
        .ok()
}

/// Supplies local copies of stream part files.
pub trait StreamSource {
    /// Makes the requested parts available in `scratch_dir` and returns their
    /// local paths in part-id order.
    ///
    /// Parts already present in `scratch_dir` are reused unless
    /// `force_fetch` is set.
    fn fetch(
        &self,
        location: &str,
        prefix: &str,
        part_id: Option<u32>,
        scratch_dir: &Path,
        force_fetch: bool,
    ) -> Result<Vec<PathBuf>, StreamError>;
}

/// Source reading parts from a directory on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStreamSource;

impl LocalStreamSource {
    fn list_parts(
        location: &Path,
        prefix: &str,
        part_id: Option<u32>,
    ) -> Result<Vec<(u32, PathBuf)>, StreamError> {
        let entries = fs::read_dir(location).map_err(|e| StreamError::io(location, e))?;
        let mut parts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StreamError::io(location, e))?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| parse_part_id(prefix, n)) else {
                continue;
            };
            if part_id.map_or(true, |wanted| wanted == id) {
                parts.push((id, entry.path()));
            }
        }
        parts.sort_by_key(|(id, _)| *id);
        Ok(parts)
    }
}

impl StreamSource for LocalStreamSource {
    fn fetch(
        &self,
        location: &str,
        prefix: &str,
        part_id: Option<u32>,
        scratch_dir: &Path,
        force_fetch: bool,
    ) -> Result<Vec<PathBuf>, StreamError> {
        let location = Path::new(location);
        let parts = Self::list_parts(location, prefix, part_id)?;

        let mut local = Vec::with_capacity(parts.len());
        for (id, remote) in parts {
            let target = scratch_dir.join(part_file_name(prefix, id));
            if target == remote {
                local.push(target);
                continue;
            }
            if force_fetch || !target.exists() {
                debug!("Fetching {} into {}", remote.display(), target.display());
                fs::copy(&remote, &target).map_err(|e| StreamError::io(&remote, e))?;
            } else {
                debug!("Reusing cached {}", target.display());
            }
            local.push(target);
        }
        Ok(local)
    }
}

type GzLines<D> = RecordLines<D, BufReader<GzDecoder<File>>>;

/// Lazy reader over the gzip part files of one stream, in order.
pub struct StreamReader<D> {
    pending: VecDeque<PathBuf>,
    current: Option<GzLines<D>>,
    _def: PhantomData<D>,
}

impl<D: StreamDef> StreamReader<D> {
    pub(crate) fn new(files: Vec<PathBuf>) -> Self {
        Self {
            pending: files.into(),
            current: None,
            _def: PhantomData,
        }
    }

    fn open_next(&mut self) -> Option<Result<(), StreamError>> {
        let path = self.pending.pop_front()?;
        match File::open(&path) {
            Ok(file) => {
                let reader = BufReader::new(GzDecoder::new(file));
                self.current = Some(RecordLines::new(path, reader));
                Some(Ok(()))
            }
            Err(e) => Some(Err(StreamError::io(path, e))),
        }
    }
}

impl<D: StreamDef> Iterator for StreamReader<D> {
    type Item = Result<D::Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lines) = self.current.as_mut() {
                if let Some(item) = lines.next() {
                    return Some(item);
                }
                self.current = None;
            }
            if let Err(e) = self.open_next()? {
                return Some(Err(e));
            }
        }
    }
}
