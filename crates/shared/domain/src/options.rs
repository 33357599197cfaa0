//! Per-call options for queries and writes.

use serde::{Deserialize, Serialize};

/// Read consistency requested for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    Strong,
    BoundedStaleness,
    Session,
    Eventual,
    ConsistentPrefix,
}

/// Query execution options.
///
/// Unset fields leave the decision to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Allow predicates on paths the indexing policy does not serve
    pub enable_scan_in_query: Option<bool>,
    /// Maximum number of documents per result page
    pub max_item_count: Option<u32>,
    pub consistency_level: Option<ConsistencyLevel>,
}

impl QueryOptions {
    /// Options used by filter-based reads: scans permitted.
    pub fn scan() -> Self {
        Self {
            enable_scan_in_query: Some(true),
            ..Self::default()
        }
    }

    pub fn with_scan(mut self, enabled: bool) -> Self {
        self.enable_scan_in_query = Some(enabled);
        self
    }

    pub fn with_max_item_count(mut self, count: u32) -> Self {
        self.max_item_count = Some(count);
        self
    }

    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = Some(level);
        self
    }

    /// Whether a scan was explicitly permitted
    pub fn allows_scan(&self) -> bool {
        self.enable_scan_in_query.unwrap_or(false)
    }
}

/// Options attached to provisioning and write requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Throughput tier for a new collection
    pub offer_type: Option<String>,
    /// Entity tag the target document must still carry
    pub if_match: Option<String>,
}

impl RequestOptions {
    pub fn offer_type(offer_type: impl Into<String>) -> Self {
        Self {
            offer_type: Some(offer_type.into()),
            ..Self::default()
        }
    }

    pub fn if_match(etag: impl Into<String>) -> Self {
        Self {
            if_match: Some(etag.into()),
            ..Self::default()
        }
    }
}
