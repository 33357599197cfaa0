//! Client seam to the remote document service.
//!
//! The repository only talks to the service through [`DocumentClient`]. A
//! [`Connector`] turns the configured endpoint and key into a client handle.
//! Both are traits so that the transport can be swapped (the bundled
//! [`memory`](crate::memory) service, a mock in tests, or a network client).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use common::{RepoError, RepoResult};
use domain::{IndexingPolicy, QueryOptions, RequestOptions, ETAG_FIELD, ID_FIELD, SELF_LINK_FIELD, TIMESTAMP_FIELD};

use crate::sql::SqlQuerySpec;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Reference to a database on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(rename = "_self")]
    pub self_link: String,
}

/// Reference to a collection on the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCollection {
    pub id: String,
    #[serde(rename = "_self")]
    pub self_link: String,
    /// Link under which the collection's documents are addressed
    pub documents_link: String,
    pub indexing_policy: IndexingPolicy,
}

/// Definition of a collection to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    pub id: String,
    pub indexing_policy: IndexingPolicy,
}

impl CollectionSpec {
    /// Collection spec with the default indexing policy
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            indexing_policy: IndexingPolicy::default(),
        }
    }
}

/// A stored document as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub self_link: String,
    pub etag: String,
    /// Last modification, seconds since epoch
    pub timestamp: i64,
    /// Full JSON body, system properties included
    pub body: Value,
}

impl Document {
    /// Read the identity and system properties out of a stored body.
    pub fn from_body(body: Value) -> RepoResult<Self> {
        let text = |name: &str| -> RepoResult<String> {
            body.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RepoError::internal(format!("document is missing `{}`", name)))
        };

        let id = text(ID_FIELD)?;
        let self_link = text(SELF_LINK_FIELD)?;
        let etag = text(ETAG_FIELD)?;
        let timestamp = body.get(TIMESTAMP_FIELD).and_then(Value::as_i64).unwrap_or_default();

        Ok(Self {
            id,
            self_link,
            etag,
            timestamp,
            body,
        })
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    pub documents: Vec<Value>,
    /// Token for the next page; `None` on the last page
    pub continuation: Option<String>,
}

/// Operations the repository needs from the document service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Look up a database by id
    async fn find_database(&self, id: &str) -> RepoResult<Option<Database>>;

    /// Create a database; fails with `Conflict` if it exists
    async fn create_database(&self, id: &str) -> RepoResult<Database>;

    /// Look up a collection by id inside a database
    async fn find_collection(
        &self,
        database_link: &str,
        id: &str,
    ) -> RepoResult<Option<DocumentCollection>>;

    /// Create a collection; fails with `Conflict` if it exists
    async fn create_collection(
        &self,
        database_link: &str,
        spec: &CollectionSpec,
        options: &RequestOptions,
    ) -> RepoResult<DocumentCollection>;

    /// Fetch one page of query results
    async fn query_documents(
        &self,
        documents_link: &str,
        query: &SqlQuerySpec,
        options: &QueryOptions,
        continuation: Option<String>,
    ) -> RepoResult<FeedPage>;

    /// Insert a new document
    async fn create_document(&self, documents_link: &str, body: Value) -> RepoResult<Document>;

    /// Replace the full content of an existing document
    async fn replace_document(
        &self,
        document_link: &str,
        body: Value,
        options: &RequestOptions,
    ) -> RepoResult<Document>;
}

/// Builds a client handle from the configured endpoint and key.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Url, auth_key: &str) -> RepoResult<Arc<dyn DocumentClient>>;
}

/// Parse and check a configured endpoint.
pub fn parse_endpoint(endpoint: &str) -> RepoResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| RepoError::InvalidEndpoint(format!("`{}`: {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        scheme => Err(RepoError::InvalidEndpoint(format!(
            "`{}`: expected an http(s) URL with a host, got scheme `{}`",
            endpoint, scheme
        ))),
    }
}
