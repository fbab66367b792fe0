//! Detection and counting of links pointing at erroring pages.

use std::collections::{btree_map, BTreeMap, HashMap};
use std::iter::Peekable;

use crate::models::{BadLink, BadLinkCount, HttpCode, Outlink, PageStatus, UrlId};

/// Lazy join of outlinks against erroring pages. See [`get_bad_links`].
pub struct BadLinks<I> {
    bad_codes: HashMap<UrlId, HttpCode>,
    outlinks: I,
}

impl<I> BadLinks<I> {
    /// Number of erroring pages in the lookup table.
    pub fn bad_page_count(&self) -> usize {
        self.bad_codes.len()
    }
}

impl<I: Iterator<Item = Outlink>> Iterator for BadLinks<I> {
    type Item = BadLink;

    fn next(&mut self) -> Option<BadLink> {
        for outlink in self.outlinks.by_ref() {
            if !outlink.is_anchor() {
                continue;
            }
            let Some(dst_url_id) = outlink.dst_url_id else {
                continue;
            };
            if let Some(&http_code) = self.bad_codes.get(&dst_url_id) {
                return Some(BadLink {
                    src_url_id: outlink.src_url_id,
                    dst_url_id,
                    http_code,
                });
            }
        }
        None
    }
}

/// Yields every anchor link whose destination page has `http_code >= 300`.
///
/// All page statuses are read up front into a `url_id -> http_code` table
/// holding erroring pages only; its size grows with the number of erroring
/// pages in the partition. Outlinks are then scanned lazily, once, and bad
/// links come out in outlink order. Feed outlinks sorted by source id to get
/// source-sorted output.
pub fn get_bad_links<S, O>(page_statuses: S, outlinks: O) -> BadLinks<O::IntoIter>
where
    S: IntoIterator<Item = PageStatus>,
    O: IntoIterator<Item = Outlink>,
{
    let bad_codes = page_statuses
        .into_iter()
        .filter(PageStatus::is_bad)
        .map(|status| (status.url_id, status.http_code))
        .collect();
    BadLinks {
        bad_codes,
        outlinks: outlinks.into_iter(),
    }
}

/// Lazy per-source, per-code tally of bad links. See [`get_bad_link_counters`].
pub struct BadLinkCounters<I: Iterator<Item = BadLink>> {
    bad_links: Peekable<I>,
    current: Option<(UrlId, btree_map::IntoIter<HttpCode, u64>)>,
}

impl<I: Iterator<Item = BadLink>> Iterator for BadLinkCounters<I> {
    type Item = BadLinkCount;

    fn next(&mut self) -> Option<BadLinkCount> {
        loop {
            if let Some((src_url_id, codes)) = self.current.as_mut() {
                if let Some((http_code, count)) = codes.next() {
                    return Some(BadLinkCount {
                        src_url_id: *src_url_id,
                        http_code,
                        count,
                    });
                }
            }

            let first = self.bad_links.next()?;
            let mut counts = BTreeMap::new();
            *counts.entry(first.http_code).or_insert(0) += 1;
            while let Some(link) = self
                .bad_links
                .next_if(|link| link.src_url_id == first.src_url_id)
            {
                *counts.entry(link.http_code).or_insert(0) += 1;
            }
            self.current = Some((first.src_url_id, counts.into_iter()));
        }
    }
}

/// Counts bad links per source page and http code.
///
/// The input must be grouped by `src_url_id` (e.g. sorted on it): each
/// maximal run of equal source ids is tallied on its own and emits one
/// count per code, in ascending code order. The grouping is not checked; a
/// source id split over two runs yields two partial counts.
pub fn get_bad_link_counters<I>(bad_links: I) -> BadLinkCounters<I::IntoIter>
where
    I: IntoIterator<Item = BadLink>,
{
    BadLinkCounters {
        bad_links: bad_links.into_iter().peekable(),
        current: None,
    }
}
