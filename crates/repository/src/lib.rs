//! Generic repository over a document database collection.
//!
//! [`DocumentDbRepository`] lazily connects, provisions its database and
//! collection on first use, and exposes typed query, create and update
//! operations. Filters built with [`field`] are translated into
//! parameterised SQL ([`SqlQuerySpec`]).
//!
//! ```ignore
//! let repo = DocumentDbRepository::new(DocumentDbConfig::from_env(), connector, "orders");
//! let big: Vec<Order> = repo.get_items(&field("total").gt(100)).await?;
//! ```

pub mod client;
pub mod memory;
pub mod repository;
pub mod sql;

pub use client::{
    parse_endpoint, CollectionSpec, Connector, Database, Document, DocumentClient, DocumentCollection, FeedPage,
};
#[cfg(any(test, feature = "test-utils"))]
pub use client::MockDocumentClient;
pub use memory::{InMemoryConnector, InMemoryService};
pub use repository::DocumentDbRepository;
pub use sql::{SqlParameter, SqlQuerySpec};

pub use common::{DocumentDbConfig, EnvSettings, RepoError, RepoResult, SettingsSource};
pub use domain::{
    field, ConsistencyLevel, DataType, Entity, Filter, Index, IndexingPolicy, QueryOptions, RequestOptions,
};
