//! Domain layer - entity contract, query model and indexing policy.
//!
//! This crate has no knowledge of the remote document service. It defines
//! what callers hand to the repository (entities, filters, options) and the
//! shape of the indexing policy applied to new collections.

pub mod constants;
pub mod entity;
pub mod error;
pub mod filter;
pub mod indexing;
pub mod options;

pub use constants::*;
pub use entity::{from_document_body, to_document_body, Entity};
pub use error::{DomainError, DomainResult};
pub use filter::{field, Comparison, FieldFilter, Filter};
pub use indexing::{DataType, ExcludedPath, IncludedPath, Index, IndexingMode, IndexingPolicy};
pub use options::{ConsistencyLevel, QueryOptions, RequestOptions};
