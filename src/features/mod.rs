//! Static feature registry.
//!
//! A feature groups the streams a crawl produces for one concern (page
//! statuses, links, ...) together with the insights computed from its
//! consolidated metrics. The registry is built once and passed to whoever
//! needs it; it is never mutated afterwards.

use log::warn;
use serde::Serialize;

use crate::consolidate::ConsolidatedMetrics;
use crate::error_handling::{ProcessingStats, WarningType};
use crate::streams::{
    BadLinksCountersStreamDef, BadLinksStreamDef, InfosStreamDef, OutlinksStreamDef,
    StreamDef, StreamDescriptor, UrlIdsStreamDef,
};

/// Group of fields shown together for a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureGroup {
    pub id: &'static str,
    pub name: &'static str,
}

/// A single number derived from consolidated metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub identifier: &'static str,
    pub name: &'static str,
    /// Dotted counter path summed over every cross-property key
    pub metric: &'static str,
}

impl Insight {
    /// Sum of the insight's counter over all keys; keys without it add zero.
    pub fn evaluate(&self, metrics: &ConsolidatedMetrics) -> u64 {
        metrics
            .iter()
            .filter_map(|(_, counters)| counters.count_at(self.metric))
            .fold(0u64, u64::saturating_add)
    }
}

/// One feature and everything it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub identifier: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub groups: Vec<FeatureGroup>,
    /// Position among features (smaller first)
    pub order: u32,
    streams: Vec<StreamDescriptor>,
    insights: Vec<Insight>,
}

impl Feature {
    /// Stream definitions produced by this feature.
    pub fn get_streams_def(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /// Insights of this feature.
    ///
    /// A feature without insights is not an error: a warning is logged and
    /// counted, and the list is empty.
    pub fn get_insights(&self, stats: &ProcessingStats) -> &[Insight] {
        if self.insights.is_empty() {
            warn!("Could not find insights for feature '{}'", self.identifier);
            stats.increment_warning(WarningType::MissingInsights);
        }
        &self.insights
    }
}

/// Immutable, ordered set of features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
}

impl FeatureRegistry {
    /// Builds a registry, sorting features by `order`.
    pub fn new(mut features: Vec<Feature>) -> Self {
        features.sort_by_key(|f| f.order);
        Self { features }
    }

    /// Features shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(vec![
            Feature {
                identifier: "links",
                name: "Links",
                description: "Outgoing links, bad links and linked domains",
                groups: vec![
                    FeatureGroup {
                        id: "outlinks_internal",
                        name: "Internal Outlinks",
                    },
                    FeatureGroup {
                        id: "inlinks",
                        name: "Inlinks",
                    },
                ],
                order: 2,
                streams: vec![
                    OutlinksStreamDef::DESCRIPTOR,
                    BadLinksStreamDef::DESCRIPTOR,
                    BadLinksCountersStreamDef::DESCRIPTOR,
                ],
                insights: vec![
                    Insight {
                        identifier: "inlinks_internal_total",
                        name: "Internal inlinks",
                        metric: "inlinks_internal_nb.total",
                    },
                    Insight {
                        identifier: "inlinks_internal_nofollow",
                        name: "Nofollow internal inlinks",
                        metric: "inlinks_internal_nb.nofollow",
                    },
                ],
            },
            Feature {
                identifier: "main",
                name: "Main",
                description: "Fetch status and identity of crawled pages",
                groups: vec![FeatureGroup {
                    id: "main",
                    name: "Main",
                }],
                order: 1,
                streams: vec![InfosStreamDef::DESCRIPTOR, UrlIdsStreamDef::DESCRIPTOR],
                insights: vec![Insight {
                    identifier: "pages",
                    name: "Pages",
                    metric: "pages_nb",
                }],
            },
            Feature {
                identifier: "semantic_metadata",
                name: "HTML Tags",
                description: "Title, description and heading metadata",
                groups: vec![FeatureGroup {
                    id: "metadata",
                    name: "HTML Tags",
                }],
                order: 3,
                streams: Vec::new(),
                insights: Vec::new(),
            },
        ])
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, identifier: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.identifier == identifier)
    }

    /// Looks up a stream descriptor by stream name across features.
    pub fn stream(&self, name: &str) -> Option<&StreamDescriptor> {
        self.features
            .iter()
            .flat_map(|f| f.streams.iter())
            .find(|s| s.name == name)
    }

    /// Evaluates every insight of every feature.
    pub fn evaluate_insights(
        &self,
        metrics: &ConsolidatedMetrics,
        stats: &ProcessingStats,
    ) -> Vec<(&Insight, u64)> {
        self.features
            .iter()
            .flat_map(|f| f.get_insights(stats))
            .map(|insight| (insight, insight.evaluate(metrics)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{CounterTree, CrossPropertyKey, CrossPropertyRecord};

    fn metrics() -> ConsolidatedMetrics {
        let mut metrics = ConsolidatedMetrics::new();
        for (host, pages, total) in [("a.com", 3, 5), ("b.com", 4, 7)] {
            let counters: CounterTree = [
                ("pages_nb", CounterTree::Count(pages)),
                (
                    "inlinks_internal_nb",
                    [("total", CounterTree::Count(total))].into_iter().collect(),
                ),
            ]
            .into_iter()
            .collect();
            metrics
                .add(CrossPropertyRecord::new(
                    CrossPropertyKey::new(host, "page", "text/html", 0, 200, true, true),
                    counters,
                ))
                .unwrap();
        }
        metrics
    }

    #[test]
    fn test_builtin_registry_is_ordered() {
        let registry = FeatureRegistry::builtin();
        let ids: Vec<&str> = registry.features().iter().map(|f| f.identifier).collect();
        assert_eq!(ids, vec!["main", "links", "semantic_metadata"]);
    }

    #[test]
    fn test_stream_lookup() {
        let registry = FeatureRegistry::builtin();
        let descriptor = registry.stream("urlbadlinks").unwrap();
        assert_eq!(descriptor.fields, &["id", "dst_url_id", "http_code"]);
        assert!(registry.stream("unknown").is_none());
        assert_eq!(
            registry.get("main").unwrap().get_streams_def().len(),
            2
        );
    }

    #[test]
    fn test_missing_insights_warns_and_returns_empty() {
        let stats = ProcessingStats::new();
        let registry = FeatureRegistry::builtin();
        let insights = registry.get("semantic_metadata").unwrap().get_insights(&stats);
        assert!(insights.is_empty());
        assert_eq!(stats.get_warning_count(WarningType::MissingInsights), 1);
    }

    #[test]
    fn test_insight_sums_over_keys() {
        let stats = ProcessingStats::new();
        let registry = FeatureRegistry::builtin();
        let values: Vec<(&str, u64)> = registry
            .evaluate_insights(&metrics(), &stats)
            .into_iter()
            .map(|(insight, value)| (insight.identifier, value))
            .collect();
        assert_eq!(
            values,
            vec![
                ("pages", 7),
                ("inlinks_internal_total", 12),
                ("inlinks_internal_nofollow", 0),
            ]
        );
    }
}
