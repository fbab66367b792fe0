//! Typed record streams.
//!
//! Every stream type is described by a [`StreamDef`]: its file prefix, its
//! ordered field names, its declared sort key, and a codec between one
//! tab-separated line and a typed record. Positional field access happens
//! only inside those codecs.
//!
//! On disk a stream is split into parts named `<prefix>.txt.<part_id>.gz`.

mod cache;
mod defs;
mod persist;
mod source;

use std::io::BufRead;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error_handling::StreamError;
use crate::models::UrlId;

pub use cache::{CachedStream, StreamCache};
pub use defs::{
    BadLinksCountersStreamDef, BadLinksStreamDef, InfosStreamDef, OutlinksStreamDef,
    UrlIdsStreamDef,
};
pub use persist::{persist, write_parts, PartitionOptions, PendingParts};
pub use source::{part_file_name, LocalStreamSource, StreamReader, StreamSource};

/// Static description of a stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Stream name, also the file prefix
    pub name: &'static str,
    /// Field names in wire order
    pub fields: &'static [&'static str],
    /// Field the producer sorts records by
    pub sort_key: &'static str,
}

impl StreamDescriptor {
    /// Position of a field on the wire.
    pub fn field_idx(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }
}

/// Codec and metadata for one stream type.
pub trait StreamDef {
    /// Typed in-memory record
    type Record;

    const DESCRIPTOR: StreamDescriptor;

    /// Builds a record from the fields of one line.
    fn decode(fields: &FieldReader<'_>) -> Result<Self::Record, String>;

    /// Renders a record as its wire fields, in descriptor order.
    fn encode(record: &Self::Record) -> Vec<String>;

    /// Url id used to route a record to a partition.
    fn partition_key(record: &Self::Record) -> UrlId;

    /// Decodes one tab-separated line.
    fn decode_line(line: &str) -> Result<Self::Record, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        let expected = Self::DESCRIPTOR.fields.len();
        if fields.len() != expected {
            return Err(format!(
                "expected {} fields, found {}",
                expected,
                fields.len()
            ));
        }
        Self::decode(&FieldReader {
            descriptor: &Self::DESCRIPTOR,
            fields: &fields,
        })
    }

    /// Encodes one record as a tab-separated line, without terminator.
    fn encode_line(record: &Self::Record) -> String {
        Self::encode(record).join("\t")
    }

    /// Loads the stream lazily from `location` through `source`.
    ///
    /// Parts are fetched into `scratch_dir` first; with `part_id` set only that
    /// part is read, otherwise every part in part-id order.
    fn load<S: StreamSource + ?Sized>(
        source: &S,
        location: &str,
        scratch_dir: &Path,
        part_id: Option<u32>,
        force_fetch: bool,
    ) -> Result<StreamReader<Self>, StreamError>
    where
        Self: Sized,
    {
        let files = source.fetch(
            location,
            Self::DESCRIPTOR.name,
            part_id,
            scratch_dir,
            force_fetch,
        )?;
        if files.is_empty() {
            return Err(StreamError::MissingPart {
                stream: Self::DESCRIPTOR.name,
                location: PathBuf::from(location),
            });
        }
        Ok(StreamReader::new(files))
    }
}

/// Named, positional view over the fields of one line.
pub struct FieldReader<'a> {
    descriptor: &'a StreamDescriptor,
    fields: &'a [&'a str],
}

impl<'a> FieldReader<'a> {
    /// Raw text of a field.
    pub fn raw(&self, field: &str) -> Result<&'a str, String> {
        self.descriptor
            .field_idx(field)
            .and_then(|idx| self.fields.get(idx).copied())
            .ok_or_else(|| format!("no field '{field}' in {}", self.descriptor.name))
    }

    /// Parses a field into `T`.
    pub fn parse<T>(&self, field: &str) -> Result<T, String>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.raw(field)?;
        raw.parse()
            .map_err(|e| format!("field '{field}' = '{raw}': {e}"))
    }

    /// Parses an id field where a negative value means "none".
    pub fn optional_id(&self, field: &str) -> Result<Option<UrlId>, String> {
        let value: i64 = self.parse(field)?;
        Ok(u64::try_from(value).ok())
    }

    /// Text field where the empty string means "none".
    pub fn optional_text(&self, field: &str) -> Result<Option<String>, String> {
        let raw = self.raw(field)?;
        Ok((!raw.is_empty()).then(|| raw.to_string()))
    }
}

/// Decodes the lines of one file into records.
pub struct RecordLines<D, R> {
    path: PathBuf,
    lines: std::io::Lines<R>,
    line_no: usize,
    _def: PhantomData<D>,
}

impl<D: StreamDef, R: BufRead> RecordLines<D, R> {
    pub(crate) fn new(path: PathBuf, reader: R) -> Self {
        Self {
            path,
            lines: reader.lines(),
            line_no: 0,
            _def: PhantomData,
        }
    }
}

impl<D: StreamDef, R: BufRead> Iterator for RecordLines<D, R> {
    type Item = Result<D::Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(StreamError::io(&self.path, e))),
            };
            self.line_no += 1;
            if line.is_empty() {
                continue;
            }
            return Some(D::decode_line(&line).map_err(|reason| StreamError::Decode {
                stream: D::DESCRIPTOR.name,
                path: self.path.clone(),
                line: self.line_no,
                reason,
            }));
        }
    }
}

/// Iterator adapter yielding the `Ok` values of a fallible stream and
/// parking the first error.
pub struct ResultShunt<'a, I, E> {
    iter: I,
    error: &'a mut Option<E>,
}

impl<I, T, E> Iterator for ResultShunt<'_, I, E>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.error.is_some() {
            return None;
        }
        match self.iter.next()? {
            Ok(value) => Some(value),
            Err(e) => {
                *self.error = Some(e);
                None
            }
        }
    }
}

/// Runs `f` over the successful records of `iter`.
///
/// The stream stops at the first error, which is then returned instead of
/// `f`'s result. Lets the infallible aggregation algorithms consume
/// fallible file streams.
pub fn process_results<I, T, E, F, R>(iter: I, f: F) -> Result<R, E>
where
    I: IntoIterator<Item = Result<T, E>>,
    F: FnOnce(ResultShunt<'_, I::IntoIter, E>) -> R,
{
    let mut error = None;
    let result = f(ResultShunt {
        iter: iter.into_iter(),
        error: &mut error,
    });
    match error {
        Some(e) => Err(e),
        None => Ok(result),
    }
}
