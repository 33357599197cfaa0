//! In-memory document service.
//!
//! A process-local implementation of [`DocumentClient`](crate::DocumentClient)
//! that behaves like the remote service for the operations the repository
//! uses: databases and collections with conflict detection, the SQL subset
//! produced by [`SqlQuerySpec`](crate::SqlQuerySpec), indexing-policy
//! enforcement, paging, entity tags and `If-Match` preconditions.
//!
//! ```ignore
//! let service = InMemoryService::new("master-key");
//! let repo = DocumentDbRepository::new(
//!     DocumentDbConfig::new("https://localhost:8081", "master-key", "shop"),
//!     Arc::new(service.connector()),
//!     "orders",
//! );
//! ```

mod eval;
mod parser;
mod service;

pub use parser::{parse, Expr, Function, SelectQuery};
pub use service::{InMemoryClient, InMemoryConnector, InMemoryService, DEFAULT_PAGE_SIZE};
