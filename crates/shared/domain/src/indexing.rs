//! Collection indexing policy.
//!
//! The policy decides which property paths the service can answer from an
//! index. Predicates on paths the policy does not serve need a scan query.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NUMBER_PRECISION, ID_FIELD, INDEX_ALL_PATHS};

/// Kind of value an index covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Number,
    String,
}

/// A single index on an included path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "PascalCase")]
pub enum Index {
    /// Ordered index, serves equality and range predicates
    #[serde(rename_all = "camelCase")]
    Range { data_type: DataType, precision: i8 },
    /// Hash index, serves equality predicates only
    #[serde(rename_all = "camelCase")]
    Hash { data_type: DataType, precision: i8 },
}

impl Index {
    pub fn data_type(&self) -> DataType {
        match self {
            Index::Range { data_type, .. } | Index::Hash { data_type, .. } => *data_type,
        }
    }

    fn serves(&self, data_type: DataType, range: bool) -> bool {
        match self {
            Index::Range { .. } => self.data_type() == data_type,
            Index::Hash { .. } => !range && self.data_type() == data_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingMode {
    #[default]
    Consistent,
    Lazy,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludedPath {
    pub path: String,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPath {
    pub path: String,
}

/// Indexing policy of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    pub automatic: bool,
    pub indexing_mode: IndexingMode,
    #[serde(default)]
    pub included_paths: Vec<IncludedPath>,
    #[serde(default)]
    pub excluded_paths: Vec<ExcludedPath>,
}

impl Default for IndexingPolicy {
    /// Policy applied to collections created by the repository: every path
    /// gets a numeric range index.
    fn default() -> Self {
        Self {
            automatic: true,
            indexing_mode: IndexingMode::Consistent,
            included_paths: vec![IncludedPath {
                path: INDEX_ALL_PATHS.to_string(),
                indexes: vec![Index::Range {
                    data_type: DataType::Number,
                    precision: DEFAULT_NUMBER_PRECISION,
                }],
            }],
            excluded_paths: Vec::new(),
        }
    }
}

impl IndexingPolicy {
    /// A policy that indexes nothing; every predicate except on `id` needs a scan.
    pub fn none() -> Self {
        Self {
            automatic: false,
            indexing_mode: IndexingMode::None,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }

    /// Add an included path with its indexes.
    pub fn include(mut self, path: impl Into<String>, indexes: Vec<Index>) -> Self {
        self.included_paths.push(IncludedPath {
            path: path.into(),
            indexes,
        });
        self
    }

    /// Add an excluded path.
    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.excluded_paths.push(ExcludedPath { path: path.into() });
        self
    }

    /// Check whether a predicate on the dotted property `field` comparing
    /// values of `data_type` can be answered from an index.
    ///
    /// `range` selects ordered predicates (`<`, `>=`, prefix match), which
    /// only a range index serves. The `id` property is always served.
    pub fn serves(&self, field: &str, data_type: DataType, range: bool) -> bool {
        if field == ID_FIELD {
            return true;
        }
        if self.indexing_mode == IndexingMode::None {
            return false;
        }

        let segments: Vec<&str> = field.split('.').collect();
        if self
            .excluded_paths
            .iter()
            .any(|excluded| path_matches(&excluded.path, &segments))
        {
            return false;
        }

        self.included_paths.iter().any(|included| {
            path_matches(&included.path, &segments)
                && included.indexes.iter().any(|index| index.serves(data_type, range))
        })
    }
}

/// Match a policy path pattern (`/*`, `/a/?`, `/a/b/*`) against property segments.
///
/// `?` terminates a pattern for a scalar at exactly that depth; `*` covers the
/// property and everything below it.
fn path_matches(pattern: &str, segments: &[&str]) -> bool {
    let parts: Vec<&str> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();

    let Some((last, prefix)) = parts.split_last() else {
        return false;
    };

    let prefix_matches = |len: usize| {
        prefix.len() <= len && prefix.iter().zip(segments).all(|(p, s)| unquote(p) == *s)
    };

    match *last {
        "*" => prefix_matches(segments.len()),
        "?" => prefix.len() == segments.len() && prefix_matches(segments.len()),
        _ => false,
    }
}

fn unquote(part: &str) -> &str {
    part.trim_matches('"')
}
