//! Top external domain rankings.

use std::convert::identity;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use super::PendingJson;
use crate::config::{StreamOptions, TOP_FULL_DOMAINS_FILE, TOP_SECOND_LEVEL_DOMAINS_FILE};
use crate::error_handling::ProcessingStats;
use crate::initialization::init_scratch_dir;
use crate::links::{analyze, resolve_sample_url_id};
use crate::resolve::SampleUrlResolver;
use crate::streams::{process_results, OutlinksStreamDef, StreamDef, StreamSource};

/// Computes the `nb_top_domains` most linked external full domains and
/// second level domains, and writes both rankings as JSON arrays into the
/// stream location.
///
/// Sample url ids are turned into URLs through `resolver`; a failed
/// resolution leaves `sample_url` empty without failing the task. Both
/// files are written or neither is.
pub fn make_top_domains_files<S, R>(
    source: &S,
    resolver: &R,
    opts: &StreamOptions,
    nb_top_domains: usize,
    stats: &ProcessingStats,
) -> Result<Vec<PathBuf>>
where
    S: StreamSource + ?Sized,
    R: SampleUrlResolver + ?Sized,
{
    let scratch = init_scratch_dir(opts.tmp_dir.as_deref())?;
    let location = opts.location_str();

    let outlinks =
        OutlinksStreamDef::load(source, &location, scratch.path(), None, opts.force_fetch)
            .context("Failed to load outlinks")?;

    info!("Preprocessing and caching stream.");
    let mut top = process_results(outlinks, |links| {
        analyze(links, nb_top_domains, scratch.path(), stats)
    })
    .and_then(identity)
    .context("Failed to rank external domains")?;

    resolve_sample_url_id(resolver, &mut top.full_domains, stats);
    resolve_sample_url_id(resolver, &mut top.second_level_domains, stats);

    let full = PendingJson::write(&opts.location.join(TOP_FULL_DOMAINS_FILE), &top.full_domains)?;
    let second_level = PendingJson::write(
        &opts.location.join(TOP_SECOND_LEVEL_DOMAINS_FILE),
        &top.second_level_domains,
    )?;
    PendingJson::commit_all(vec![full, second_level])
}
