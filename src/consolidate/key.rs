//! Cross-property keys identifying aggregation buckets.

use serde::{Deserialize, Serialize};

use crate::models::HttpCode;

/// Wire form: a 7-element JSON array.
type KeyTuple = (String, String, String, u32, HttpCode, bool, bool);

/// Fixed set of dimensions one aggregation bucket is keyed by.
///
/// Serialized as an array, e.g.
/// `["my.site.com", "product", "text/html", 0, 200, true, true]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "KeyTuple", into = "KeyTuple")]
pub struct CrossPropertyKey {
    pub host: String,
    pub resource_type: String,
    pub content_type: String,
    pub depth: u32,
    pub http_code: HttpCode,
    pub index: bool,
    pub follow: bool,
}

impl From<KeyTuple> for CrossPropertyKey {
    fn from(
        (host, resource_type, content_type, depth, http_code, index, follow): KeyTuple,
    ) -> Self {
        Self {
            host,
            resource_type,
            content_type,
            depth,
            http_code,
            index,
            follow,
        }
    }
}

impl From<CrossPropertyKey> for KeyTuple {
    fn from(key: CrossPropertyKey) -> Self {
        (
            key.host,
            key.resource_type,
            key.content_type,
            key.depth,
            key.http_code,
            key.index,
            key.follow,
        )
    }
}

impl CrossPropertyKey {
    pub fn new(
        host: impl Into<String>,
        resource_type: impl Into<String>,
        content_type: impl Into<String>,
        depth: u32,
        http_code: HttpCode,
        index: bool,
        follow: bool,
    ) -> Self {
        Self {
            host: host.into(),
            resource_type: resource_type.into(),
            content_type: content_type.into(),
            depth,
            http_code,
            index,
            follow,
        }
    }
}
