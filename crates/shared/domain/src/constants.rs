//! Domain-level constants.
//!
//! Names and defaults shared by the query translator, the repository facade
//! and the in-memory document service.

// =============================================================================
// Document Properties
// =============================================================================

/// Identity field every stored document carries
pub const ID_FIELD: &str = "id";

/// Self-link system property
pub const SELF_LINK_FIELD: &str = "_self";

/// Entity tag system property used for optimistic concurrency
pub const ETAG_FIELD: &str = "_etag";

/// Last-modified timestamp system property (seconds since epoch)
pub const TIMESTAMP_FIELD: &str = "_ts";

/// All properties the service adds to a stored document
pub const SYSTEM_FIELDS: &[&str] = &[SELF_LINK_FIELD, ETAG_FIELD, TIMESTAMP_FIELD, "_rid", "_attachments"];

/// Check if a property name is reserved by the service
pub fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.contains(&name)
}

// =============================================================================
// Query Translation
// =============================================================================

/// Alias bound to each document in generated queries
pub const QUERY_ROOT_ALIAS: &str = "root";

/// Prefix of generated query parameter names (`@p0`, `@p1`, ...)
pub const PARAMETER_PREFIX: &str = "@p";

// =============================================================================
// Collection Provisioning
// =============================================================================

/// Path pattern matching every property of a document
pub const INDEX_ALL_PATHS: &str = "/*";

/// Precision of the numeric range index applied to new collections
pub const DEFAULT_NUMBER_PRECISION: i8 = 7;

/// Throughput tier requested when a collection is created
pub const DEFAULT_OFFER_TYPE: &str = "S1";
