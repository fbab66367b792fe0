//! Top-K ranking of the domains external links point to.
//!
//! The outlink stream is filtered once (external links with a usable
//! destination domain), cached locally, and replayed for two independent
//! rankings: by full domain (URL host) and by second-level (registrable)
//! domain.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use log::{debug, info, warn};

use crate::domain::{extract_full_domain, extract_second_level_domain};
use crate::error_handling::{InfoType, ProcessingStats, StreamError, WarningType};
use crate::models::{DomainStat, Outlink, UrlId};
use crate::resolve::SampleUrlResolver;
use crate::streams::{process_results, OutlinksStreamDef, StreamCache};

/// Keeps links leaving the crawled site.
pub fn filter_external_outlinks<'a, I>(
    outlinks: I,
    stats: &'a ProcessingStats,
) -> impl Iterator<Item = Outlink> + 'a
where
    I: IntoIterator<Item = Outlink>,
    I::IntoIter: 'a,
{
    outlinks.into_iter().filter(move |link| {
        let external = link.is_external() && link.external_url.is_some();
        if !external {
            stats.increment_info(InfoType::InternalLinkSkipped);
        }
        external
    })
}

/// Drops links whose destination URL has no registrable domain, or holds a
/// tab or line break that the line-based stream format cannot carry.
pub fn filter_invalid_destination_urls<'a, I>(
    outlinks: I,
    stats: &'a ProcessingStats,
) -> impl Iterator<Item = Outlink> + 'a
where
    I: IntoIterator<Item = Outlink>,
    I::IntoIter: 'a,
{
    outlinks.into_iter().filter(move |link| {
        let Some(url) = link.external_url.as_deref() else {
            return false;
        };
        if url.contains(['\t', '\r', '\n']) {
            debug!("Dropping link from {}: control character in URL", link.src_url_id);
            stats.increment_warning(WarningType::InvalidDestinationUrl);
            return false;
        }
        match extract_second_level_domain(url) {
            Ok(_) => true,
            Err(e) => {
                debug!("Dropping link from {}: {:#}", link.src_url_id, e);
                stats.increment_warning(WarningType::InvalidDestinationUrl);
                false
            }
        }
    })
}

/// Exact occurrence counts per domain, with the first sample seen.
#[derive(Debug, Default)]
pub struct DomainCounter {
    counts: HashMap<String, (u64, UrlId)>,
}

impl DomainCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one link to `domain` found on page `sample_url_id`.
    pub fn add(&mut self, domain: String, sample_url_id: UrlId) {
        self.counts
            .entry(domain)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, sample_url_id));
    }

    pub fn count(&self, domain: &str) -> u64 {
        self.counts.get(domain).map_or(0, |(count, _)| *count)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent domains.
    ///
    /// Sorted by descending count; equal counts are ordered by ascending
    /// domain name.
    pub fn top(self, n: usize) -> Vec<DomainStat> {
        let mut stats: Vec<DomainStat> = self
            .counts
            .into_iter()
            .map(|(domain, (count, sample))| DomainStat::new(domain, count, sample))
            .collect();

        if n == 0 {
            return Vec::new();
        }
        if stats.len() > n {
            stats.select_nth_unstable_by(n - 1, rank_order);
            stats.truncate(n);
        }
        stats.sort_by(rank_order);
        stats
    }
}

fn rank_order(a: &DomainStat, b: &DomainStat) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.domain.cmp(&b.domain))
}

fn compute_top_domains<I, F>(outlinks: I, n: usize, domain_of: F) -> Vec<DomainStat>
where
    I: IntoIterator<Item = Outlink>,
    F: Fn(&str) -> Result<String>,
{
    let mut counter = DomainCounter::new();
    for link in outlinks {
        let Some(url) = link.external_url.as_deref() else {
            continue;
        };
        if let Ok(domain) = domain_of(url) {
            counter.add(domain, link.src_url_id);
        }
    }
    counter.top(n)
}

/// Ranks full domains (URL hosts) by number of links.
pub fn compute_top_full_domains<I>(outlinks: I, n: usize) -> Vec<DomainStat>
where
    I: IntoIterator<Item = Outlink>,
{
    compute_top_domains(outlinks, n, extract_full_domain)
}

/// Ranks second-level (registrable) domains by number of links.
pub fn compute_top_second_level_domains<I>(outlinks: I, n: usize) -> Vec<DomainStat>
where
    I: IntoIterator<Item = Outlink>,
{
    compute_top_domains(outlinks, n, extract_second_level_domain)
}

/// Both rankings of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopDomains {
    pub full_domains: Vec<DomainStat>,
    pub second_level_domains: Vec<DomainStat>,
}

/// Filters `outlinks`, caches them under `cache_dir` and computes both
/// top-`n` rankings from the cache.
///
/// The cache file is removed before returning, on success and on error.
pub fn analyze<I>(
    outlinks: I,
    n: usize,
    cache_dir: &Path,
    stats: &ProcessingStats,
) -> Result<TopDomains, StreamError>
where
    I: IntoIterator<Item = Outlink>,
{
    let filtered = filter_invalid_destination_urls(filter_external_outlinks(outlinks, stats), stats);
    let cache = StreamCache::<OutlinksStreamDef>::cache(filtered, cache_dir)?;
    info!("Cached {} external link(s)", cache.len());

    info!("Computing top {} full domains.", n);
    let full_domains =
        process_results(cache.get_stream()?, |links| compute_top_full_domains(links, n))?;

    info!("Computing top {} second level domains.", n);
    let second_level_domains = process_results(cache.get_stream()?, |links| {
        compute_top_second_level_domains(links, n)
    })?;

    Ok(TopDomains {
        full_domains,
        second_level_domains,
    })
}

/// Fills `sample_url` of each stat through `resolver`.
///
/// Resolution problems never fail the ranking: unresolved stats keep their
/// raw `sample_url_id` and a warning is logged and counted.
pub fn resolve_sample_url_id<R>(resolver: &R, domain_stats: &mut [DomainStat], stats: &ProcessingStats)
where
    R: SampleUrlResolver + ?Sized,
{
    if domain_stats.is_empty() {
        return;
    }
    let ids: Vec<UrlId> = domain_stats.iter().map(|s| s.sample_url_id).collect();
    let urls = match resolver.resolve(&ids) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Could not resolve sample urls, keeping url ids: {}", e);
            stats.add_warning(WarningType::SampleUrlUnresolved, domain_stats.len());
            return;
        }
    };

    for stat in domain_stats.iter_mut() {
        match urls.get(&stat.sample_url_id) {
            Some(url) => stat.sample_url = Some(url.clone()),
            None => {
                warn!(
                    "No url found for sample url id {} ({})",
                    stat.sample_url_id, stat.domain
                );
                stats.increment_warning(WarningType::SampleUrlUnresolved);
            }
        }
    }
}
