//! Partitioned persistence of record streams.
//!
//! Records are routed to parts by their url id. Parts are first written under
//! temporary names and only renamed into place by [`PendingParts::commit`],
//! so a failed run leaves no partial artifact behind.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};

use super::{part_file_name, StreamDef};
use crate::config::{DEFAULT_FIRST_PART_SIZE, DEFAULT_PART_SIZE};
use crate::error_handling::StreamError;
use crate::models::UrlId;

/// How records are spread over part files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Part 0 holds ids in `[0, first_part_size)`
    pub first_part_size: u64,
    /// Every later part spans this many ids
    pub part_size: u64,
    /// Write everything to this part instead of routing by id
    pub part_id: Option<u32>,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            first_part_size: DEFAULT_FIRST_PART_SIZE,
            part_size: DEFAULT_PART_SIZE,
            part_id: None,
        }
    }
}

impl PartitionOptions {
    /// Options writing every record to one part.
    pub fn single_part(part_id: u32) -> Self {
        Self {
            part_id: Some(part_id),
            ..Self::default()
        }
    }

    /// Part a url id belongs to.
    pub fn part_for(&self, id: UrlId) -> u32 {
        if let Some(part_id) = self.part_id {
            return part_id;
        }
        if id < self.first_part_size {
            return 0;
        }
        let part_size = self.part_size.max(1);
        let offset = (id - self.first_part_size) / part_size;
        u32::try_from(offset + 1).unwrap_or(u32::MAX)
    }
}

type PartWriter = GzEncoder<BufWriter<File>>;

/// Part files written under temporary names, awaiting commit.
///
/// Dropping without committing removes the temporary files.
#[derive(Debug)]
pub struct PendingParts {
    parts: Vec<(PathBuf, PathBuf)>,
    records: usize,
}

impl PendingParts {
    /// Number of records written across all parts.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Renames every part into place and returns the final paths.
    ///
    /// When a rename fails, the parts already renamed are removed again and
    /// the remaining temporary files are dropped, so none of the stream is
    /// left at its final location.
    pub fn commit(mut self) -> Result<Vec<PathBuf>, StreamError> {
        let mut committed = Vec::with_capacity(self.parts.len());
        while let Some((tmp, target)) = self.parts.pop() {
            if let Err(e) = fs::rename(&tmp, &target) {
                self.parts.push((tmp, target.clone()));
                remove_committed(&committed);
                return Err(StreamError::io(target, e));
            }
            committed.push(target);
        }
        committed.reverse();
        Ok(committed)
    }
}

fn remove_committed(committed: &[PathBuf]) {
    for target in committed {
        if let Err(e) = fs::remove_file(target) {
            warn!("Could not roll back part {}: {}", target.display(), e);
        }
    }
}

impl Drop for PendingParts {
    fn drop(&mut self) {
        for (tmp, _) in &self.parts {
            if let Err(e) = fs::remove_file(tmp) {
                debug!("Could not remove pending part {}: {}", tmp.display(), e);
            }
        }
    }
}

fn open_part(tmp: &Path) -> Result<PartWriter, StreamError> {
    let file = File::create(tmp).map_err(|e| StreamError::io(tmp, e))?;
    Ok(GzEncoder::new(BufWriter::new(file), Compression::default()))
}

fn finish_part(writer: PartWriter, tmp: &Path) -> Result<(), StreamError> {
    let mut inner = writer.finish().map_err(|e| StreamError::io(tmp, e))?;
    inner.flush().map_err(|e| StreamError::io(tmp, e))
}

/// Writes `records` as part files under `location`, without committing.
///
/// Part files are opened lazily as records reach them. When the stream is
/// empty, an empty first part is still written so that readers find the
/// stream.
pub fn write_parts<D, I>(
    records: I,
    location: &Path,
    options: &PartitionOptions,
) -> Result<PendingParts, StreamError>
where
    D: StreamDef,
    I: IntoIterator<Item = D::Record>,
{
    let prefix = D::DESCRIPTOR.name;
    let mut pending = PendingParts {
        parts: Vec::new(),
        records: 0,
    };
    let mut writers: BTreeMap<u32, (PathBuf, PartWriter)> = BTreeMap::new();

    for record in records {
        let part_id = options.part_for(D::partition_key(&record));
        if !writers.contains_key(&part_id) {
            let target = location.join(part_file_name(prefix, part_id));
            let tmp = location.join(format!(".{}.tmp", part_file_name(prefix, part_id)));
            let writer = open_part(&tmp)?;
            pending.parts.push((tmp.clone(), target));
            writers.insert(part_id, (tmp, writer));
        }
        if let Some((tmp, writer)) = writers.get_mut(&part_id) {
            writeln!(writer, "{}", D::encode_line(&record)).map_err(|e| StreamError::io(&*tmp, e))?;
        }
        pending.records += 1;
    }

    if writers.is_empty() {
        let part_id = options.part_id.unwrap_or(0);
        let target = location.join(part_file_name(prefix, part_id));
        let tmp = location.join(format!(".{}.tmp", part_file_name(prefix, part_id)));
        let writer = open_part(&tmp)?;
        pending.parts.push((tmp.clone(), target));
        writers.insert(part_id, (tmp, writer));
    }

    for (_, (tmp, writer)) in writers {
        finish_part(writer, &tmp)?;
    }

    info!(
        "Wrote {} {} record(s) into {} part(s)",
        pending.records,
        prefix,
        pending.parts.len()
    );
    Ok(pending)
}

/// Writes and commits `records` as part files under `location`.
pub fn persist<D, I>(
    records: I,
    location: &Path,
    options: &PartitionOptions,
) -> Result<Vec<PathBuf>, StreamError>
where
    D: StreamDef,
    I: IntoIterator<Item = D::Record>,
{
    write_parts::<D, I>(records, location, options)?.commit()
}
