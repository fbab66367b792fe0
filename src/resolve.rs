//! Resolution of crawl url ids into URLs, for top-domain samples.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::debug;

use crate::error_handling::ResolveError;
use crate::models::UrlId;
use crate::streams::{process_results, StreamDef, StreamSource, UrlIdsStreamDef};

/// Turns url ids into URLs.
///
/// Implementations may return fewer entries than requested; missing ids are
/// treated as unresolved by callers.
pub trait SampleUrlResolver {
    fn resolve(&self, url_ids: &[UrlId]) -> Result<HashMap<UrlId, String>, ResolveError>;
}

/// Resolver scanning the crawl's `urlids` stream.
pub struct UrlIdsResolver<'a, S: ?Sized> {
    source: &'a S,
    location: String,
    scratch_dir: PathBuf,
    force_fetch: bool,
}

impl<'a, S: StreamSource + ?Sized> UrlIdsResolver<'a, S> {
    pub fn new(
        source: &'a S,
        location: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
        force_fetch: bool,
    ) -> Self {
        Self {
            source,
            location: location.into(),
            scratch_dir: scratch_dir.into(),
            force_fetch,
        }
    }
}

impl<S: StreamSource + ?Sized> SampleUrlResolver for UrlIdsResolver<'_, S> {
    fn resolve(&self, url_ids: &[UrlId]) -> Result<HashMap<UrlId, String>, ResolveError> {
        let wanted: HashSet<UrlId> = url_ids.iter().copied().collect();
        let stream = UrlIdsStreamDef::load(
            self.source,
            &self.location,
            &self.scratch_dir,
            None,
            self.force_fetch,
        )?;

        let urls: HashMap<UrlId, String> = process_results(stream, |records| {
            records
                .filter(|record| wanted.contains(&record.url_id))
                .map(|record| (record.url_id, record.url()))
                .collect()
        })?;
        debug!("Resolved {}/{} sample url(s)", urls.len(), wanted.len());
        Ok(urls)
    }
}

/// Resolver backed by an in-memory table.
impl SampleUrlResolver for HashMap<UrlId, String> {
    fn resolve(&self, url_ids: &[UrlId]) -> Result<HashMap<UrlId, String>, ResolveError> {
        Ok(url_ids
            .iter()
            .filter_map(|id| self.get(id).map(|url| (*id, url.clone())))
            .collect())
    }
}
