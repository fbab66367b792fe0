// Shared test helpers for writing crawl streams and reading task output.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::path::Path;

use crawlstats::models::{LinkType, Outlink, PageStatus, UrlIdRecord};
use crawlstats::streams::{
    persist, InfosStreamDef, LocalStreamSource, OutlinksStreamDef, PartitionOptions, StreamDef,
    UrlIdsStreamDef,
};

/// Writes page statuses as a single-part `urlinfos` stream.
#[allow(dead_code)] // Used by other test files
pub fn write_infos(location: &Path, statuses: &[(u64, u16)]) {
    let records = statuses.iter().map(|&(url_id, http_code)| PageStatus { url_id, http_code });
    persist::<InfosStreamDef, _>(records, location, &PartitionOptions::single_part(0))
        .expect("Failed to write urlinfos");
}

/// Writes outlinks as a single-part `urllinks` stream.
#[allow(dead_code)] // Used by other test files
pub fn write_outlinks(location: &Path, outlinks: Vec<Outlink>) {
    persist::<OutlinksStreamDef, _>(outlinks, location, &PartitionOptions::single_part(0))
        .expect("Failed to write urllinks");
}

/// Writes `(url_id, protocol, host, path, query_string)` rows as a `urlids` stream.
#[allow(dead_code)] // Used by other test files
pub fn write_url_ids(location: &Path, rows: &[(u64, &str, &str, &str, &str)]) {
    let records = rows.iter().map(|&(url_id, protocol, host, path, query_string)| UrlIdRecord {
        url_id,
        protocol: protocol.to_string(),
        host: host.to_string(),
        path: path.to_string(),
        query_string: query_string.to_string(),
    });
    persist::<UrlIdsStreamDef, _>(records, location, &PartitionOptions::single_part(0))
        .expect("Failed to write urlids");
}

#[allow(dead_code)] // Used by other test files
pub fn anchor(src_url_id: u64, dst_url_id: u64) -> Outlink {
    Outlink {
        src_url_id,
        link_type: LinkType::Anchor,
        bitmask: 0,
        dst_url_id: Some(dst_url_id),
        external_url: None,
    }
}

#[allow(dead_code)] // Used by other test files
pub fn external(src_url_id: u64, url: &str) -> Outlink {
    Outlink {
        src_url_id,
        link_type: LinkType::Anchor,
        bitmask: 0,
        dst_url_id: None,
        external_url: Some(url.to_string()),
    }
}

/// Reads every record of one stream (or one of its parts) from `location`.
#[allow(dead_code)] // Used by other test files
pub fn read_stream<D: StreamDef>(location: &Path, part_id: Option<u32>) -> Vec<D::Record> {
    D::load(
        &LocalStreamSource,
        &location.to_string_lossy(),
        location,
        part_id,
        false,
    )
    .expect("Failed to load stream")
    .collect::<Result<Vec<_>, _>>()
    .expect("Failed to decode stream")
}
