//! Stream definitions for the crawl files this crate reads and writes.

use super::{FieldReader, StreamDef, StreamDescriptor};
use crate::models::{BadLink, BadLinkCount, Outlink, PageStatus, UrlId, UrlIdRecord};

/// Per-page fetch status: `id`, `http_code`. Sorted by `id`.
pub struct InfosStreamDef;

impl StreamDef for InfosStreamDef {
    type Record = PageStatus;

    const DESCRIPTOR: StreamDescriptor = StreamDescriptor {
        name: "urlinfos",
        fields: &["id", "http_code"],
        sort_key: "id",
    };

    fn decode(fields: &FieldReader<'_>) -> Result<PageStatus, String> {
        Ok(PageStatus {
            url_id: fields.parse("id")?,
            http_code: fields.parse("http_code")?,
        })
    }

    fn encode(record: &PageStatus) -> Vec<String> {
        vec![record.url_id.to_string(), record.http_code.to_string()]
    }

    fn partition_key(record: &PageStatus) -> UrlId {
        record.url_id
    }
}

/// Outgoing links: `id`, `link_type`, `bitmask`, `dst_url_id`, `external_url`.
///
/// `dst_url_id` is `-1` and `external_url` non-empty for links leaving the
/// crawled site. Sorted by source `id`.
pub struct OutlinksStreamDef;

impl StreamDef for OutlinksStreamDef {
    type Record = Outlink;

    const DESCRIPTOR: StreamDescriptor = StreamDescriptor {
        name: "urllinks",
        fields: &["id", "link_type", "bitmask", "dst_url_id", "external_url"],
        sort_key: "id",
    };

    fn decode(fields: &FieldReader<'_>) -> Result<Outlink, String> {
        Ok(Outlink {
            src_url_id: fields.parse("id")?,
            link_type: fields.parse("link_type")?,
            bitmask: fields.parse("bitmask")?,
            dst_url_id: fields.optional_id("dst_url_id")?,
            external_url: fields.optional_text("external_url")?,
        })
    }

    fn encode(record: &Outlink) -> Vec<String> {
        vec![
            record.src_url_id.to_string(),
            record.link_type.to_string(),
            record.bitmask.to_string(),
            record
                .dst_url_id
                .map_or_else(|| "-1".to_string(), |id| id.to_string()),
            record.external_url.clone().unwrap_or_default(),
        ]
    }

    fn partition_key(record: &Outlink) -> UrlId {
        record.src_url_id
    }
}

/// Links to erroring pages: `id`, `dst_url_id`, `http_code`. Sorted by `id`.
pub struct BadLinksStreamDef;

impl StreamDef for BadLinksStreamDef {
    type Record = BadLink;

    const DESCRIPTOR: StreamDescriptor = StreamDescriptor {
        name: "urlbadlinks",
        fields: &["id", "dst_url_id", "http_code"],
        sort_key: "id",
    };

    fn decode(fields: &FieldReader<'_>) -> Result<BadLink, String> {
        Ok(BadLink {
            src_url_id: fields.parse("id")?,
            dst_url_id: fields.parse("dst_url_id")?,
            http_code: fields.parse("http_code")?,
        })
    }

    fn encode(record: &BadLink) -> Vec<String> {
        vec![
            record.src_url_id.to_string(),
            record.dst_url_id.to_string(),
            record.http_code.to_string(),
        ]
    }

    fn partition_key(record: &BadLink) -> UrlId {
        record.src_url_id
    }
}

/// Bad link counts: `id`, `http_code`, `score`. Sorted by (`id`, `http_code`).
pub struct BadLinksCountersStreamDef;

impl StreamDef for BadLinksCountersStreamDef {
    type Record = BadLinkCount;

    const DESCRIPTOR: StreamDescriptor = StreamDescriptor {
        name: "urlbadlinks_counters",
        fields: &["id", "http_code", "score"],
        sort_key: "id",
    };

    fn decode(fields: &FieldReader<'_>) -> Result<BadLinkCount, String> {
        Ok(BadLinkCount {
            src_url_id: fields.parse("id")?,
            http_code: fields.parse("http_code")?,
            count: fields.parse("score")?,
        })
    }

    fn encode(record: &BadLinkCount) -> Vec<String> {
        vec![
            record.src_url_id.to_string(),
            record.http_code.to_string(),
            record.count.to_string(),
        ]
    }

    fn partition_key(record: &BadLinkCount) -> UrlId {
        record.src_url_id
    }
}

/// Url components by id: `id`, `protocol`, `host`, `path`, `query_string`.
pub struct UrlIdsStreamDef;

impl StreamDef for UrlIdsStreamDef {
    type Record = UrlIdRecord;

    const DESCRIPTOR: StreamDescriptor = StreamDescriptor {
        name: "urlids",
        fields: &["id", "protocol", "host", "path", "query_string"],
        sort_key: "id",
    };

    fn decode(fields: &FieldReader<'_>) -> Result<UrlIdRecord, String> {
        Ok(UrlIdRecord {
            url_id: fields.parse("id")?,
            protocol: fields.raw("protocol")?.to_string(),
            host: fields.raw("host")?.to_string(),
            path: fields.raw("path")?.to_string(),
            query_string: fields.raw("query_string")?.to_string(),
        })
    }

    fn encode(record: &UrlIdRecord) -> Vec<String> {
        vec![
            record.url_id.to_string(),
            record.protocol.clone(),
            record.host.clone(),
            record.path.clone(),
            record.query_string.clone(),
        ]
    }

    fn partition_key(record: &UrlIdRecord) -> UrlId {
        record.url_id
    }
}
