//! Consolidation of partition-level metric batches.
//!
//! Each partition job produces a batch of records, one per cross-property
//! key, holding hierarchical counters. Consolidation merges every batch into
//! a single mapping with exactly one entry per key: counts on the same path
//! are summed, and metric families present in only some batches are carried
//! over unchanged.
//!
//! The merge is commutative and associative, so the result does not depend on
//! batch order or on how records were spread over batches.

mod counter_tree;
mod key;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::error_handling::ConsolidationError;

pub use counter_tree::{CounterTree, PATH_SEPARATOR};
pub use key::CrossPropertyKey;

/// One bucket of one batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct CrossPropertyRecord {
    pub cross_properties: CrossPropertyKey,
    pub counters: CounterTree,
}

impl CrossPropertyRecord {
    pub fn new(cross_properties: CrossPropertyKey, counters: CounterTree) -> Self {
        Self {
            cross_properties,
            counters,
        }
    }
}

/// Merged counters, one entry per cross-property key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedMetrics {
    entries: BTreeMap<CrossPropertyKey, CounterTree>,
}

impl ConsolidatedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one record into its key's entry.
    pub fn add(&mut self, record: CrossPropertyRecord) -> Result<(), ConsolidationError> {
        let entry = self.entries.entry(record.cross_properties).or_default();
        entry.merge(record.counters)
    }

    /// Merges another consolidation into this one.
    pub fn merge(&mut self, other: ConsolidatedMetrics) -> Result<(), ConsolidationError> {
        for (key, counters) in other.entries {
            self.add(CrossPropertyRecord::new(key, counters))?;
        }
        Ok(())
    }

    pub fn get(&self, key: &CrossPropertyKey) -> Option<&CounterTree> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CrossPropertyKey, &CounterTree)> {
        self.entries.iter()
    }

    /// Flattened projection: each key's counters keyed by dotted path.
    ///
    /// # Errors
    ///
    /// Fails with [`ConsolidationError::PathCollision`] rather than dropping
    /// a counter whose path is produced twice.
    pub fn flatten(&self) -> Result<FlatMetrics, ConsolidationError> {
        let entries = self
            .entries
            .iter()
            .map(|(key, counters)| Ok((key.clone(), counters.flatten()?)))
            .collect::<Result<BTreeMap<_, _>, ConsolidationError>>()?;
        Ok(FlatMetrics { entries })
    }

    /// Back to batch records, in key order.
    pub fn into_records(self) -> Vec<CrossPropertyRecord> {
        self.entries
            .into_iter()
            .map(|(key, counters)| CrossPropertyRecord::new(key, counters))
            .collect()
    }
}

impl Serialize for ConsolidatedMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|(key, counters)| KeyedCounters {
            cross_properties: key,
            counters,
        }))
    }
}

/// Counters of each key as `dotted.path -> count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMetrics {
    entries: BTreeMap<CrossPropertyKey, BTreeMap<String, u64>>,
}

impl FlatMetrics {
    pub fn get(&self, key: &CrossPropertyKey) -> Option<&BTreeMap<String, u64>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FlatMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|(key, counters)| KeyedCounters {
            cross_properties: key,
            counters,
        }))
    }
}

#[derive(serde::Serialize)]
struct KeyedCounters<'a, C> {
    cross_properties: &'a CrossPropertyKey,
    counters: &'a C,
}

/// Result of [`consolidate`]: nested trees or their flattened projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidatedView {
    Nested(ConsolidatedMetrics),
    Flat(FlatMetrics),
}

impl Serialize for ConsolidatedView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConsolidatedView::Nested(metrics) => metrics.serialize(serializer),
            ConsolidatedView::Flat(metrics) => metrics.serialize(serializer),
        }
    }
}

/// Merges partition batches into one [`ConsolidatedMetrics`].
///
/// This is a barrier: every batch must be supplied before a result exists.
pub struct MetricsConsolidator<B> {
    batches: B,
}

impl<B, R> MetricsConsolidator<B>
where
    B: IntoIterator<Item = R>,
    R: IntoIterator<Item = CrossPropertyRecord>,
{
    pub fn new(batches: B) -> Self {
        Self { batches }
    }

    /// Merges all batches.
    ///
    /// # Errors
    ///
    /// Fails on the first schema mismatch; no partial result is returned.
    pub fn consolidate(self) -> Result<ConsolidatedMetrics, ConsolidationError> {
        let mut metrics = ConsolidatedMetrics::new();
        for (idx, batch) in self.batches.into_iter().enumerate() {
            let mut records = 0usize;
            for record in batch {
                metrics.add(record)?;
                records += 1;
            }
            debug!("Merged batch {} ({} record(s))", idx, records);
        }
        Ok(metrics)
    }
}

/// Merges `batches`, returning the flattened projection when `flatten` is set.
pub fn consolidate<B, R>(batches: B, flatten: bool) -> Result<ConsolidatedView, ConsolidationError>
where
    B: IntoIterator<Item = R>,
    R: IntoIterator<Item = CrossPropertyRecord>,
{
    let metrics = MetricsConsolidator::new(batches).consolidate()?;
    Ok(if flatten {
        ConsolidatedView::Flat(metrics.flatten()?)
    } else {
        ConsolidatedView::Nested(metrics)
    })
}

/// Reads one batch: a JSON array of records.
pub fn read_batch(path: &Path) -> Result<Vec<CrossPropertyRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open batch {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse batch {}", path.display()))
}
