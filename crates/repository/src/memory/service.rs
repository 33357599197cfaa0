//! State and request handling of the in-memory document service.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use common::{OptionExt, RepoError, RepoResult};
use domain::{IndexingPolicy, QueryOptions, RequestOptions, ETAG_FIELD, ID_FIELD, SELF_LINK_FIELD, TIMESTAMP_FIELD};

use super::eval::Scope;
use super::parser::parse;
use crate::client::{CollectionSpec, Connector, Database, Document, DocumentClient, DocumentCollection, FeedPage};
use crate::sql::SqlQuerySpec;

/// Page size used when a query does not set `max_item_count`
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Characters the service does not accept in resource ids
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '?', '#'];

#[derive(Default)]
struct ServiceState {
    databases: BTreeMap<String, DatabaseState>,
}

#[derive(Default)]
struct DatabaseState {
    collections: BTreeMap<String, CollectionState>,
}

struct CollectionState {
    indexing_policy: IndexingPolicy,
    offer_type: Option<String>,
    /// Documents in insertion order
    documents: Vec<Value>,
}

/// Shared state of one in-memory document service.
pub struct InMemoryService {
    master_key: String,
    state: RwLock<ServiceState>,
}

impl std::fmt::Debug for InMemoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryService")
            .field("master_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl InMemoryService {
    /// Create an empty service accepting `master_key`.
    pub fn new(master_key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            master_key: master_key.into(),
            state: RwLock::new(ServiceState::default()),
        })
    }

    /// Connector that validates the master key and hands out clients.
    pub fn connector(self: &Arc<Self>) -> InMemoryConnector {
        InMemoryConnector {
            service: Arc::clone(self),
        }
    }

    /// Client bound to this service, bypassing authentication.
    pub fn client(self: &Arc<Self>) -> InMemoryClient {
        InMemoryClient {
            service: Arc::clone(self),
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub async fn database_ids(&self) -> Vec<String> {
        self.state.read().await.databases.keys().cloned().collect()
    }

    pub async fn collection_ids(&self, database: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .databases
            .get(database)
            .map(|db| db.collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn indexing_policy(&self, database: &str, collection: &str) -> Option<IndexingPolicy> {
        let state = self.state.read().await;
        state
            .databases
            .get(database)?
            .collections
            .get(collection)
            .map(|c| c.indexing_policy.clone())
    }

    pub async fn offer_type(&self, database: &str, collection: &str) -> Option<String> {
        let state = self.state.read().await;
        state
            .databases
            .get(database)?
            .collections
            .get(collection)?
            .offer_type
            .clone()
    }

    pub async fn document_count(&self, database: &str, collection: &str) -> usize {
        let state = self.state.read().await;
        state
            .databases
            .get(database)
            .and_then(|db| db.collections.get(collection))
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }
}

// =============================================================================
// Links
// =============================================================================

fn database_link(database: &str) -> String {
    format!("dbs/{}", database)
}

fn collection_link(database: &str, collection: &str) -> String {
    format!("dbs/{}/colls/{}", database, collection)
}

fn documents_link(database: &str, collection: &str) -> String {
    format!("{}/docs", collection_link(database, collection))
}

fn segments(link: &str) -> Vec<&str> {
    link.trim_matches('/').split('/').collect()
}

fn parse_database_link(link: &str) -> RepoResult<&str> {
    match segments(link).as_slice() {
        ["dbs", database] => Ok(*database),
        _ => Err(RepoError::bad_request(format!("Invalid database link `{}`", link))),
    }
}

fn parse_documents_link(link: &str) -> RepoResult<(&str, &str)> {
    match segments(link).as_slice() {
        ["dbs", database, "colls", collection, "docs"] => Ok((*database, *collection)),
        _ => Err(RepoError::bad_request(format!("Invalid documents link `{}`", link))),
    }
}

fn parse_document_link(link: &str) -> RepoResult<(&str, &str, &str)> {
    match segments(link).as_slice() {
        ["dbs", database, "colls", collection, "docs", id] => Ok((*database, *collection, *id)),
        _ => Err(RepoError::bad_request(format!("Invalid document link `{}`", link))),
    }
}

fn validate_id(kind: &str, id: &str) -> RepoResult<()> {
    if id.is_empty() || id.contains(FORBIDDEN_ID_CHARS) {
        return Err(RepoError::bad_request(format!("Invalid {} id `{}`", kind, id)));
    }
    Ok(())
}

fn document_body(body: Value) -> RepoResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(RepoError::bad_request("Document body must be a JSON object")),
    }
}

/// Set the system properties of a stored document.
fn stamp(body: &mut Map<String, Value>, self_link: String) {
    body.insert(SELF_LINK_FIELD.to_string(), Value::String(self_link));
    body.insert(ETAG_FIELD.to_string(), Value::String(format!("\"{}\"", Uuid::new_v4())));
    body.insert(TIMESTAMP_FIELD.to_string(), Value::from(Utc::now().timestamp()));
}

fn id_of(document: &Value) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

// =============================================================================
// Client
// =============================================================================

/// [`DocumentClient`] backed by an [`InMemoryService`].
#[derive(Debug, Clone)]
pub struct InMemoryClient {
    service: Arc<InMemoryService>,
}

impl InMemoryClient {
    fn collection_ref(database: &str, id: &str, state: &CollectionState) -> DocumentCollection {
        DocumentCollection {
            id: id.to_string(),
            self_link: collection_link(database, id),
            documents_link: documents_link(database, id),
            indexing_policy: state.indexing_policy.clone(),
        }
    }
}

#[async_trait]
impl DocumentClient for InMemoryClient {
    async fn find_database(&self, id: &str) -> RepoResult<Option<Database>> {
        let state = self.service.state.read().await;
        Ok(state.databases.get(id).map(|_| Database {
            id: id.to_string(),
            self_link: database_link(id),
        }))
    }

    async fn create_database(&self, id: &str) -> RepoResult<Database> {
        validate_id("database", id)?;

        let mut state = self.service.state.write().await;
        if state.databases.contains_key(id) {
            return Err(RepoError::conflict(format!("Database `{}`", id)));
        }
        state.databases.insert(id.to_string(), DatabaseState::default());

        Ok(Database {
            id: id.to_string(),
            self_link: database_link(id),
        })
    }

    async fn find_collection(
        &self,
        database_link: &str,
        id: &str,
    ) -> RepoResult<Option<DocumentCollection>> {
        let database = parse_database_link(database_link)?;
        let state = self.service.state.read().await;
        let db = state
            .databases
            .get(database)
            .ok_or_not_found(format!("Database `{}`", database))?;

        Ok(db
            .collections
            .get(id)
            .map(|collection| Self::collection_ref(database, id, collection)))
    }

    async fn create_collection(
        &self,
        database_link: &str,
        spec: &CollectionSpec,
        options: &RequestOptions,
    ) -> RepoResult<DocumentCollection> {
        let database = parse_database_link(database_link)?;
        validate_id("collection", &spec.id)?;

        let mut state = self.service.state.write().await;
        let db = state
            .databases
            .get_mut(database)
            .ok_or_not_found(format!("Database `{}`", database))?;
        if db.collections.contains_key(&spec.id) {
            return Err(RepoError::conflict(format!("Collection `{}`", spec.id)));
        }

        let collection = CollectionState {
            indexing_policy: spec.indexing_policy.clone(),
            offer_type: options.offer_type.clone(),
            documents: Vec::new(),
        };
        let reference = Self::collection_ref(database, &spec.id, &collection);
        db.collections.insert(spec.id.clone(), collection);

        Ok(reference)
    }

    async fn query_documents(
        &self,
        documents_link: &str,
        query: &SqlQuerySpec,
        options: &QueryOptions,
        continuation: Option<String>,
    ) -> RepoResult<FeedPage> {
        let (database, collection) = parse_documents_link(documents_link)?;
        let select = parse(&query.query)?;
        let scope = Scope::new(query);

        let offset = match continuation.as_deref() {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| RepoError::bad_request(format!("Invalid continuation `{}`", token)))?,
            None => 0,
        };
        let page_size = options
            .max_item_count
            .map(|n| n.max(1) as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let state = self.service.state.read().await;
        let collection = state
            .databases
            .get(database)
            .ok_or_not_found(format!("Database `{}`", database))?
            .collections
            .get(collection)
            .ok_or_not_found(format!("Collection `{}`", collection))?;

        let mut matching = Vec::new();
        match &select.condition {
            Some(condition) => {
                if !options.allows_scan() {
                    scope.check_indexed(condition, &collection.indexing_policy)?;
                }
                for document in &collection.documents {
                    if scope.matches(condition, document)? {
                        matching.push(document);
                    }
                }
            }
            None => matching.extend(collection.documents.iter()),
        }
        if let Some(top) = select.top {
            matching.truncate(top);
        }

        let start = offset.min(matching.len());
        let end = offset.saturating_add(page_size).min(matching.len());
        let documents = matching[start..end].iter().map(|d| (*d).clone()).collect();
        let continuation = (end < matching.len()).then(|| end.to_string());

        Ok(FeedPage {
            documents,
            continuation,
        })
    }

    async fn create_document(&self, documents_link: &str, body: Value) -> RepoResult<Document> {
        let (database, collection) = parse_documents_link(documents_link)?;
        let mut body = document_body(body)?;
        let id = body
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RepoError::bad_request("Document has no string `id`"))?;
        validate_id("document", &id)?;

        let mut state = self.service.state.write().await;
        let target = state
            .databases
            .get_mut(database)
            .ok_or_not_found(format!("Database `{}`", database))?
            .collections
            .get_mut(collection)
            .ok_or_not_found(format!("Collection `{}`", collection))?;

        if target.documents.iter().any(|d| id_of(d) == Some(id.as_str())) {
            return Err(RepoError::conflict(format!("Document `{}`", id)));
        }

        stamp(&mut body, format!("{}/{}", documents_link.trim_matches('/'), id));
        let stored = Value::Object(body);
        target.documents.push(stored.clone());

        Document::from_body(stored)
    }

    async fn replace_document(
        &self,
        document_link: &str,
        body: Value,
        options: &RequestOptions,
    ) -> RepoResult<Document> {
        let (database, collection, id) = parse_document_link(document_link)?;
        let mut body = document_body(body)?;
        if body.get(ID_FIELD).and_then(Value::as_str) != Some(id) {
            return Err(RepoError::bad_request(format!(
                "Replacement body must keep id `{}`",
                id
            )));
        }

        let mut state = self.service.state.write().await;
        let target = state
            .databases
            .get_mut(database)
            .ok_or_not_found(format!("Database `{}`", database))?
            .collections
            .get_mut(collection)
            .ok_or_not_found(format!("Collection `{}`", collection))?;

        let current = target
            .documents
            .iter_mut()
            .find(|d| id_of(d) == Some(id))
            .ok_or_not_found(format!("Document `{}`", id))?;

        if let Some(expected) = &options.if_match {
            let actual = current.get(ETAG_FIELD).and_then(Value::as_str);
            if actual != Some(expected.as_str()) {
                return Err(RepoError::PreconditionFailed(format!(
                    "document `{}` was modified since it was read",
                    id
                )));
            }
        }

        stamp(&mut body, document_link.trim_matches('/').to_string());
        *current = Value::Object(body);

        Document::from_body(current.clone())
    }
}

// =============================================================================
// Connector
// =============================================================================

/// [`Connector`] for an [`InMemoryService`]; rejects any key but the master key.
#[derive(Debug, Clone)]
pub struct InMemoryConnector {
    service: Arc<InMemoryService>,
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, endpoint: &Url, auth_key: &str) -> RepoResult<Arc<dyn DocumentClient>> {
        if auth_key != self.service.master_key {
            tracing::warn!("Rejected connection to {}: invalid master key", endpoint);
            return Err(RepoError::Unauthorized);
        }

        tracing::debug!("Connected to in-memory document service at {}", endpoint);
        Ok(Arc::new(self.service.client()))
    }
}
