//! Typed crawl records exchanged between pipeline stages.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Crawl-assigned identifier of a page.
pub type UrlId = u64;

/// HTTP status code observed for a page.
pub type HttpCode = u16;

/// Status codes from this value up mark a page as erroring.
pub const BAD_HTTP_CODE_THRESHOLD: HttpCode = 300;

/// Fetch outcome of one crawled page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStatus {
    pub url_id: UrlId,
    pub http_code: HttpCode,
}

impl PageStatus {
    /// True for redirects, client errors and server errors.
    pub fn is_bad(&self) -> bool {
        self.http_code >= BAD_HTTP_CODE_THRESHOLD
    }
}

/// Kind of an outgoing link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// Normal `<a href>` anchor
    Anchor,
    /// `<link rel="canonical">`
    Canonical,
    /// HTTP redirect with its status code
    Redirect(HttpCode),
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Anchor => f.write_str("a"),
            LinkType::Canonical => f.write_str("canonical"),
            LinkType::Redirect(code) => write!(f, "r{code}"),
        }
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(LinkType::Anchor),
            "canonical" => Ok(LinkType::Canonical),
            _ => s
                .strip_prefix('r')
                .and_then(|code| code.parse().ok())
                .map(LinkType::Redirect)
                .ok_or_else(|| format!("unknown link type '{s}'")),
        }
    }
}

/// One outgoing link of a crawled page.
///
/// Links to pages of the crawled site carry `dst_url_id`; links leaving the
/// site carry the destination as `external_url` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlink {
    pub src_url_id: UrlId,
    pub link_type: LinkType,
    /// Follow/nofollow flags as produced by the crawler
    pub bitmask: u32,
    pub dst_url_id: Option<UrlId>,
    pub external_url: Option<String>,
}

impl Outlink {
    pub fn is_anchor(&self) -> bool {
        self.link_type == LinkType::Anchor
    }

    /// True when the destination lies outside the crawled site.
    pub fn is_external(&self) -> bool {
        self.dst_url_id.is_none()
    }
}

/// An anchor link whose destination page has an erroring status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadLink {
    pub src_url_id: UrlId,
    pub dst_url_id: UrlId,
    pub http_code: HttpCode,
}

/// Number of bad links from one source page to pages with one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadLinkCount {
    pub src_url_id: UrlId,
    pub http_code: HttpCode,
    pub count: u64,
}

/// Components of a crawled page URL, keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlIdRecord {
    pub url_id: UrlId,
    pub protocol: String,
    pub host: String,
    pub path: String,
    pub query_string: String,
}

impl UrlIdRecord {
    /// Rebuilds the absolute URL.
    pub fn url(&self) -> String {
        format!(
            "{}://{}{}{}",
            self.protocol, self.host, self.path, self.query_string
        )
    }
}

/// Frequency of one domain among external links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainStat {
    pub domain: String,
    pub count: u64,
    /// Crawl id of the page holding the first link seen to this domain
    pub sample_url_id: UrlId,
    /// Filled in after ranking by a sample URL resolver
    pub sample_url: Option<String>,
}

impl DomainStat {
    pub fn new(domain: impl Into<String>, count: u64, sample_url_id: UrlId) -> Self {
        Self {
            domain: domain.into(),
            count,
            sample_url_id,
            sample_url: None,
        }
    }
}
