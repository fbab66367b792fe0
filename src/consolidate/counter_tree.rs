//! Hierarchical counters.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error_handling::ConsolidationError;

/// Separator joining metric names into a flattened path.
pub const PATH_SEPARATOR: char = '.';

/// A scalar count, or named sub-counters.
///
/// Serialized as a bare JSON number or a JSON object, e.g.
/// `{"total": 12, "nofollow_combinations": {"link": 10}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CounterTree {
    Count(u64),
    Node(BTreeMap<String, CounterTree>),
}

impl Default for CounterTree {
    fn default() -> Self {
        CounterTree::Node(BTreeMap::new())
    }
}

impl From<u64> for CounterTree {
    fn from(count: u64) -> Self {
        CounterTree::Count(count)
    }
}

impl<K: Into<String>> FromIterator<(K, CounterTree)> for CounterTree {
    fn from_iter<T: IntoIterator<Item = (K, CounterTree)>>(iter: T) -> Self {
        CounterTree::Node(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl CounterTree {
    /// Adds `other` into `self`.
    ///
    /// Counts are summed, nodes are merged key by key, and a key present on
    /// one side only is kept as is.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::SchemaMismatch`] when one side has a
    /// count where the other has sub-counters. `self` may be partially
    /// merged at that point and should be discarded.
    pub fn merge(&mut self, other: CounterTree) -> Result<(), ConsolidationError> {
        let mut path = Vec::new();
        self.merge_at(other, &mut path)
    }

    fn merge_at(
        &mut self,
        other: CounterTree,
        path: &mut Vec<String>,
    ) -> Result<(), ConsolidationError> {
        match (self, other) {
            (CounterTree::Count(total), CounterTree::Count(n)) => {
                *total = total.saturating_add(n);
                Ok(())
            }
            (CounterTree::Node(children), CounterTree::Node(others)) => {
                for (name, value) in others {
                    match children.entry(name) {
                        Entry::Vacant(slot) => {
                            slot.insert(value);
                        }
                        Entry::Occupied(mut slot) => {
                            path.push(slot.key().clone());
                            slot.get_mut().merge_at(value, path)?;
                            path.pop();
                        }
                    }
                }
                Ok(())
            }
            _ => Err(ConsolidationError::SchemaMismatch {
                path: if path.is_empty() {
                    "(root)".to_string()
                } else {
                    path.join(".")
                },
            }),
        }
    }

    /// Sub-tree at a dotted path (`""` is the tree itself).
    pub fn get(&self, path: &str) -> Option<&CounterTree> {
        if path.is_empty() {
            return Some(self);
        }
        path.split(PATH_SEPARATOR)
            .try_fold(self, |tree, name| match tree {
                CounterTree::Node(children) => children.get(name),
                CounterTree::Count(_) => None,
            })
    }

    /// Count at a dotted path, if the path ends on a count.
    pub fn count_at(&self, path: &str) -> Option<u64> {
        match self.get(path)? {
            CounterTree::Count(n) => Some(*n),
            CounterTree::Node(_) => None,
        }
    }

    /// Every count keyed by its dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::PathCollision`] when two counters map to
    /// the same path, e.g. `{"a.b": 1, "a": {"b": 2}}`.
    pub fn flatten(&self) -> Result<BTreeMap<String, u64>, ConsolidationError> {
        let mut flat = BTreeMap::new();
        self.flatten_into(&mut String::new(), &mut flat)?;
        Ok(flat)
    }

    fn flatten_into(
        &self,
        prefix: &mut String,
        flat: &mut BTreeMap<String, u64>,
    ) -> Result<(), ConsolidationError> {
        match self {
            CounterTree::Count(n) => match flat.entry(prefix.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(*n);
                    Ok(())
                }
                Entry::Occupied(slot) => Err(ConsolidationError::PathCollision {
                    path: slot.key().clone(),
                }),
            },
            CounterTree::Node(children) => {
                for (name, child) in children {
                    let len = prefix.len();
                    if !prefix.is_empty() {
                        prefix.push(PATH_SEPARATOR);
                    }
                    prefix.push_str(name);
                    child.flatten_into(prefix, flat)?;
                    prefix.truncate(len);
                }
                Ok(())
            }
        }
    }
}
