//! Bad link and bad link counter files.

use std::convert::identity;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::info;

use crate::config::StreamOptions;
use crate::error_handling::{InfoType, ProcessingStats};
use crate::initialization::{init_scratch_dir, init_semaphore};
use crate::links::{get_bad_link_counters, get_bad_links};
use crate::streams::{
    process_results, write_parts, BadLinksCountersStreamDef, BadLinksStreamDef, InfosStreamDef,
    OutlinksStreamDef, PartitionOptions, StreamDef, StreamSource,
};

/// Writes the bad link stream of a crawl:
///
/// ```text
/// url_src_id  url_dest_id  error_http_code
/// ```
///
/// ordered on `url_src_id` and partitioned by source url id.
pub fn make_bad_link_file<S: StreamSource + ?Sized>(
    source: &S,
    opts: &StreamOptions,
    first_part_id_size: u64,
    part_id_size: u64,
    stats: &ProcessingStats,
) -> Result<Vec<PathBuf>> {
    let scratch = init_scratch_dir(opts.tmp_dir.as_deref())?;
    let location = opts.location_str();

    let infos = InfosStreamDef::load(source, &location, scratch.path(), None, opts.force_fetch)
        .context("Failed to load page statuses")?;
    let outlinks =
        OutlinksStreamDef::load(source, &location, scratch.path(), None, opts.force_fetch)
            .context("Failed to load outlinks")?;

    let partitions = PartitionOptions {
        first_part_size: first_part_id_size,
        part_size: part_id_size,
        part_id: None,
    };
    let pending = process_results(infos, |infos| {
        process_results(outlinks, |outlinks| {
            let bad_links = get_bad_links(infos, outlinks);
            info!("{} erroring page(s) in crawl", bad_links.bad_page_count());
            let bad_links = bad_links.inspect(|_| stats.increment_info(InfoType::BadLinkFound));
            write_parts::<BadLinksStreamDef, _>(bad_links, &opts.location, &partitions)
        })
        .and_then(identity)
    })
    .and_then(identity)
    .context("Failed to compute bad links")?;

    pending.commit().context("Failed to persist bad links")
}

/// Writes the bad link counters of one part:
///
/// ```text
/// url_src_id  http_code  count
/// ```
///
/// ordered on `url_src_id` and `http_code`. Reads the part written by
/// [`make_bad_link_file`].
pub fn make_bad_link_counter_file<S: StreamSource + ?Sized>(
    source: &S,
    opts: &StreamOptions,
    part_id: u32,
    stats: &ProcessingStats,
) -> Result<Vec<PathBuf>> {
    let scratch = init_scratch_dir(opts.tmp_dir.as_deref())?;
    let location = opts.location_str();

    let stream = BadLinksStreamDef::load(
        source,
        &location,
        scratch.path(),
        Some(part_id),
        opts.force_fetch,
    )
    .with_context(|| format!("Failed to load bad links of part {}", part_id))?;

    let pending = process_results(stream, |bad_links| {
        let counters = get_bad_link_counters(bad_links)
            .inspect(|_| stats.increment_info(InfoType::BadLinkCountEmitted));
        write_parts::<BadLinksCountersStreamDef, _>(
            counters,
            &opts.location,
            &PartitionOptions::single_part(part_id),
        )
    })
    .and_then(identity)
    .with_context(|| format!("Failed to count bad links of part {}", part_id))?;

    pending
        .commit()
        .with_context(|| format!("Failed to persist bad link counters of part {}", part_id))
}

/// Runs [`make_bad_link_counter_file`] for several parts, at most
/// `max_concurrency` at a time on the blocking thread pool.
///
/// Parts share no state. The first failing part fails the whole call, but
/// parts already committed stay in place.
pub async fn make_bad_link_counter_files<S>(
    source: Arc<S>,
    opts: StreamOptions,
    part_ids: Vec<u32>,
    max_concurrency: usize,
    stats: Arc<ProcessingStats>,
) -> Result<Vec<PathBuf>>
where
    S: StreamSource + Send + Sync + 'static,
{
    let semaphore = init_semaphore(max_concurrency);
    let mut tasks = FuturesUnordered::new();

    for part_id in part_ids {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Concurrency limiter closed")?;
        let source = Arc::clone(&source);
        let opts = opts.clone();
        let stats = Arc::clone(&stats);
        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            info!("Counting bad links of part {}", part_id);
            make_bad_link_counter_file(source.as_ref(), &opts, part_id, &stats)
        }));
    }

    let mut written = Vec::new();
    while let Some(joined) = tasks.next().await {
        let files = joined.context("Partition job panicked")??;
        written.extend(files);
    }
    written.sort();
    Ok(written)
}
