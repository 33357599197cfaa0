//! Repository facade over one collection of the document service.
//!
//! Every public operation first resolves the provisioning chain
//! client → database → collection. Each stage is resolved once, on first
//! use, and memoized for the lifetime of the repository. Concurrent first
//! callers wait on the same initialization instead of racing to create the
//! database or collection twice. A failed stage is not memoized; the next
//! call tries again.

use std::sync::Arc;

use once_cell::sync::OnceCell as SyncOnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use common::{
    optional_setting, require_setting, OptionExt, RepoError, RepoResult, SettingsSource, KEY_AUTH_KEY,
    KEY_DATABASE, KEY_ENDPOINT, KEY_OFFER_TYPE,
};
use domain::{from_document_body, to_document_body, Entity, Filter, QueryOptions, RequestOptions, DEFAULT_OFFER_TYPE};

use crate::client::{parse_endpoint, CollectionSpec, Connector, Database, Document, DocumentClient, DocumentCollection};
use crate::sql::SqlQuerySpec;

/// How many results a query should collect before it stops paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    All,
    First,
}

/// Generic repository for the entities of one collection.
///
/// Create one per collection and share it (e.g. behind an `Arc`) across
/// requests; the client handle and resolved references are reused.
pub struct DocumentDbRepository {
    settings: Arc<dyn SettingsSource>,
    connector: Arc<dyn Connector>,
    collection_id: String,
    database_id: SyncOnceCell<String>,
    client: OnceCell<Arc<dyn DocumentClient>>,
    database: OnceCell<Database>,
    collection: OnceCell<DocumentCollection>,
}

impl std::fmt::Debug for DocumentDbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentDbRepository")
            .field("collection_id", &self.collection_id)
            .field("database_id", &self.database_id.get())
            .field("connected", &self.client.initialized())
            .field("database", &self.database.get())
            .field("collection", &self.collection.get())
            .finish()
    }
}

impl DocumentDbRepository {
    /// Create a repository for `collection_id`.
    ///
    /// Nothing is read or contacted here. Configuration problems surface on
    /// the first operation.
    pub fn new(
        settings: impl SettingsSource + 'static,
        connector: Arc<dyn Connector>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            connector,
            collection_id: collection_id.into(),
            database_id: SyncOnceCell::new(),
            client: OnceCell::new(),
            database: OnceCell::new(),
            collection: OnceCell::new(),
        }
    }

    /// Name of the collection this repository serves
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    fn database_id(&self) -> RepoResult<&str> {
        self.database_id
            .get_or_try_init(|| require_setting(self.settings.as_ref(), KEY_DATABASE))
            .map(String::as_str)
    }

    async fn client(&self) -> RepoResult<&Arc<dyn DocumentClient>> {
        self.client.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> RepoResult<Arc<dyn DocumentClient>> {
        let endpoint = require_setting(self.settings.as_ref(), KEY_ENDPOINT)?;
        let auth_key = require_setting(self.settings.as_ref(), KEY_AUTH_KEY)?;
        let endpoint = parse_endpoint(&endpoint)?;

        let client = self.connector.connect(&endpoint, &auth_key).await?;
        info!(
            "Document client connected to {}",
            endpoint.host_str().unwrap_or_default()
        );
        Ok(client)
    }

    async fn database(&self) -> RepoResult<&Database> {
        self.database.get_or_try_init(|| self.read_or_create_database()).await
    }

    /// Use the database if it exists, otherwise create it.
    async fn read_or_create_database(&self) -> RepoResult<Database> {
        let client = self.client().await?;
        let id = self.database_id()?;

        if let Some(database) = client.find_database(id).await? {
            debug!("Using existing database {}", id);
            return Ok(database);
        }

        let database = client.create_database(id).await?;
        info!("Created database {}", id);
        Ok(database)
    }

    async fn collection(&self) -> RepoResult<&DocumentCollection> {
        self.collection
            .get_or_try_init(|| self.read_or_create_collection())
            .await
    }

    /// Use the collection if it exists, otherwise create it with the default
    /// indexing policy. An existing collection keeps its own policy.
    async fn read_or_create_collection(&self) -> RepoResult<DocumentCollection> {
        let database = self.database().await?;
        let client = self.client().await?;

        if let Some(collection) = client
            .find_collection(&database.self_link, &self.collection_id)
            .await?
        {
            debug!("Using existing collection {}/{}", database.id, self.collection_id);
            return Ok(collection);
        }

        let spec = CollectionSpec::new(self.collection_id.clone());
        let offer_type = optional_setting(self.settings.as_ref(), KEY_OFFER_TYPE)
            .unwrap_or_else(|| DEFAULT_OFFER_TYPE.to_string());
        let options = RequestOptions::offer_type(offer_type);

        let collection = client
            .create_collection(&database.self_link, &spec, &options)
            .await?;
        info!(
            "Created collection {}/{} (offer {})",
            database.id,
            self.collection_id,
            options.offer_type.as_deref().unwrap_or_default()
        );
        Ok(collection)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get all entities matching `filter`.
    ///
    /// Predicates on properties the indexing policy does not cover are
    /// evaluated with a scan.
    pub async fn get_items<T: DeserializeOwned>(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        self.get_items_with_options(filter, QueryOptions::scan()).await
    }

    /// Get all entities matching `filter`, with caller-supplied options used as given.
    pub async fn get_items_with_options<T: DeserializeOwned>(
        &self,
        filter: &Filter,
        options: QueryOptions,
    ) -> RepoResult<Vec<T>> {
        let spec = SqlQuerySpec::from_filter(filter);
        let values = self.fetch(&spec, &options, Fetch::All).await?;
        decode_all(values)
    }

    /// Get all entities returned by a raw query, e.g.
    /// `SELECT * FROM c WHERE c.total > 10`.
    ///
    /// No scan is requested; the query must be answerable from the
    /// collection's indexes.
    pub async fn get_items_by_query<T: DeserializeOwned>(&self, query: &str) -> RepoResult<Vec<T>> {
        let spec = SqlQuerySpec::new(query);
        let values = self.fetch(&spec, &QueryOptions::default(), Fetch::All).await?;
        decode_all(values)
    }

    /// Get the first entity returned by a raw query.
    pub async fn get_item_by_query<T: DeserializeOwned>(&self, query: &str) -> RepoResult<Option<T>> {
        let spec = SqlQuerySpec::new(query);
        let values = self.fetch(&spec, &QueryOptions::default(), Fetch::First).await?;
        decode_first(values)
    }

    /// Get the first entity matching `filter`.
    ///
    /// Uses the same scan-enabled options as [`get_items`](Self::get_items),
    /// so both accept exactly the same filters.
    pub async fn get_item<T: DeserializeOwned>(&self, filter: &Filter) -> RepoResult<Option<T>> {
        let spec = SqlQuerySpec::from_filter(filter);
        let values = self.fetch(&spec, &QueryOptions::scan(), Fetch::First).await?;
        decode_first(values)
    }

    /// Run a query and drain its pages.
    async fn fetch(
        &self,
        spec: &SqlQuerySpec,
        options: &QueryOptions,
        fetch: Fetch,
    ) -> RepoResult<Vec<Value>> {
        let collection = self.collection().await?;
        let client = self.client().await?;

        let mut results = Vec::new();
        let mut continuation = None;
        let mut pages = 0usize;
        loop {
            let page = client
                .query_documents(&collection.documents_link, spec, options, continuation.take())
                .await?;
            pages += 1;
            results.extend(page.documents);
            continuation = page.continuation;

            let satisfied = fetch == Fetch::First && !results.is_empty();
            if continuation.is_none() || satisfied {
                break;
            }
        }

        debug!(
            "Query `{}` on {} returned {} document(s) in {} page(s)",
            spec.query,
            collection.id,
            results.len(),
            pages
        );
        Ok(results)
    }

    /// Point lookup of the stored document with identity `id`.
    async fn read_document(&self, id: &str) -> RepoResult<Option<Document>> {
        let values = self
            .fetch(&SqlQuerySpec::by_id(id), &QueryOptions::default(), Fetch::First)
            .await?;
        values.into_iter().next().map(Document::from_body).transpose()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert `item` as a new document.
    pub async fn create_item<T: Entity>(&self, item: &T) -> RepoResult<()> {
        let body = to_document_body(item)?;
        let collection = self.collection().await?;
        let client = self.client().await?;

        client
            .create_document(&collection.documents_link, Value::Object(body))
            .await?;
        debug!("Created document {} in {}", item.id(), collection.id);
        Ok(())
    }

    /// Replace the document with identity `id` by `item`.
    ///
    /// The replace is conditional on the entity tag read by the lookup, so a
    /// concurrent modification fails with `PreconditionFailed` instead of
    /// being overwritten. A missing document fails with `NotFound`.
    pub async fn update_item<T: Entity>(&self, id: &str, item: &T) -> RepoResult<()> {
        if item.id() != id {
            return Err(RepoError::validation(format!(
                "entity id `{}` does not match update target `{}`",
                item.id(),
                id
            )));
        }
        let body = to_document_body(item)?;

        let current = self
            .read_document(id)
            .await?
            .ok_or_not_found(format!("Document `{}`", id))?;
        let client = self.client().await?;

        client
            .replace_document(
                &current.self_link,
                Value::Object(body),
                &RequestOptions::if_match(current.etag),
            )
            .await
            .map_err(|err| {
                if let RepoError::PreconditionFailed(_) = &err {
                    warn!("Concurrent modification of document {} detected", id);
                }
                err
            })?;
        debug!("Replaced document {}", id);
        Ok(())
    }
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> RepoResult<Vec<T>> {
    values
        .into_iter()
        .map(|value| from_document_body(value).map_err(RepoError::from))
        .collect()
}

fn decode_first<T: DeserializeOwned>(values: Vec<Value>) -> RepoResult<Option<T>> {
    values
        .into_iter()
        .next()
        .map(|value| from_document_body(value).map_err(RepoError::from))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use url::Url;

    use crate::client::{FeedPage, MockDocumentClient};
    use common::DocumentDbConfig;
    use domain::{field, IndexingPolicy};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: String,
        total: i64,
    }

    impl Entity for Order {
        fn id(&self) -> &str {
            &self.id
        }
    }

    /// Connector handing out one shared client and counting connections
    struct CountingConnector {
        client: Arc<MockDocumentClient>,
        connects: AtomicUsize,
    }

    impl CountingConnector {
        fn new(client: MockDocumentClient) -> Arc<Self> {
            Arc::new(Self {
                client: Arc::new(client),
                connects: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _endpoint: &Url, _auth_key: &str) -> RepoResult<Arc<dyn DocumentClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(self.client.clone())
        }
    }

    fn config() -> DocumentDbConfig {
        DocumentDbConfig::new("https://localhost:8081", "key", "shop")
    }

    fn database() -> Database {
        Database {
            id: "shop".to_string(),
            self_link: "dbs/shop".to_string(),
        }
    }

    fn collection() -> DocumentCollection {
        DocumentCollection {
            id: "orders".to_string(),
            self_link: "dbs/shop/colls/orders".to_string(),
            documents_link: "dbs/shop/colls/orders/docs".to_string(),
            indexing_policy: IndexingPolicy::default(),
        }
    }

    fn stored(id: &str, total: i64, etag: &str) -> Value {
        json!({
            "id": id,
            "total": total,
            "_self": format!("dbs/shop/colls/orders/docs/{}", id),
            "_etag": etag,
            "_ts": 1700000000
        })
    }

    /// Mock whose database and collection already exist
    fn provisioned_mock() -> MockDocumentClient {
        let mut client = MockDocumentClient::new();
        client
            .expect_find_database()
            .times(1)
            .returning(|_| Ok(Some(database())));
        client
            .expect_find_collection()
            .times(1)
            .returning(|_, _| Ok(Some(collection())));
        client.expect_create_database().never();
        client.expect_create_collection().never();
        client
    }

    #[tokio::test]
    async fn test_existing_resources_are_resolved_once() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .times(3)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let connector = CountingConnector::new(client);
        let repo = DocumentDbRepository::new(config(), connector.clone(), "orders");

        for _ in 0..3 {
            let items: Vec<Order> = repo.get_items(&field("total").gt(1)).await.unwrap();
            assert!(items.is_empty());
        }

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_resources_are_created_once() {
        let mut client = MockDocumentClient::new();
        client
            .expect_find_database()
            .withf(|id| id == "shop")
            .times(1)
            .returning(|_| Ok(None));
        client
            .expect_create_database()
            .withf(|id| id == "shop")
            .times(1)
            .returning(|_| Ok(database()));
        client
            .expect_find_collection()
            .withf(|db, id| db == "dbs/shop" && id == "orders")
            .times(1)
            .returning(|_, _| Ok(None));
        client
            .expect_create_collection()
            .withf(|db, spec, options| {
                db == "dbs/shop"
                    && spec.id == "orders"
                    && spec.indexing_policy == IndexingPolicy::default()
                    && options.offer_type.as_deref() == Some("S1")
            })
            .times(1)
            .returning(|_, _, _| Ok(collection()));
        client
            .expect_query_documents()
            .times(2)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let first: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();
        let second: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();

        assert_eq!(first, None);
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_provisions_once() {
        let mut client = MockDocumentClient::new();
        client.expect_find_database().times(1).returning(|_| Ok(None));
        client
            .expect_create_database()
            .times(1)
            .returning(|_| Ok(database()));
        client.expect_find_collection().times(1).returning(|_, _| Ok(None));
        client
            .expect_create_collection()
            .times(1)
            .returning(|_, _, _| Ok(collection()));
        client
            .expect_query_documents()
            .times(8)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let connector = CountingConnector::new(client);
        let repo = Arc::new(DocumentDbRepository::new(config(), connector.clone(), "orders"));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.get_items::<Order>(&Filter::all()).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_empty());
        }

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offer_type_comes_from_settings() {
        let mut client = MockDocumentClient::new();
        client.expect_find_database().returning(|_| Ok(Some(database())));
        client.expect_find_collection().returning(|_, _| Ok(None));
        client
            .expect_create_collection()
            .withf(|_, _, options| options.offer_type.as_deref() == Some("S3"))
            .times(1)
            .returning(|_, _, _| Ok(collection()));
        client
            .expect_query_documents()
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let repo = DocumentDbRepository::new(
            config().with_offer_type("S3"),
            CountingConnector::new(client),
            "orders",
        );

        let items: Vec<Order> = repo.get_items(&Filter::all()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_failed_provisioning_is_retried() {
        let mut client = MockDocumentClient::new();
        let mut attempts = 0;
        client.expect_find_database().times(2).returning(move |_| {
            attempts += 1;
            if attempts == 1 {
                Err(RepoError::ServiceUnavailable("warming up".to_string()))
            } else {
                Ok(Some(database()))
            }
        });
        client
            .expect_find_collection()
            .times(1)
            .returning(|_, _| Ok(Some(collection())));
        client
            .expect_query_documents()
            .times(1)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let first = repo.get_items::<Order>(&Filter::all()).await;
        assert!(matches!(first, Err(RepoError::ServiceUnavailable(_))));

        let second = repo.get_items::<Order>(&Filter::all()).await;
        assert!(second.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_queries_enable_scan_and_raw_queries_do_not() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .withf(|_, spec, options, _| spec.query.contains("WHERE") && options.allows_scan())
            .times(2)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        client
            .expect_query_documents()
            .withf(|_, spec, options, _| spec.query == "SELECT * FROM c" && !options.allows_scan())
            .times(2)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");
        let filter = field("customer").eq("acme");

        let _: Vec<Order> = repo.get_items(&filter).await.unwrap();
        let _: Option<Order> = repo.get_item(&filter).await.unwrap();
        let _: Vec<Order> = repo.get_items_by_query("SELECT * FROM c").await.unwrap();
        let _: Option<Order> = repo.get_item_by_query("SELECT * FROM c").await.unwrap();
    }

    #[tokio::test]
    async fn test_caller_options_are_passed_through() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .withf(|_, _, options, _| *options == QueryOptions::default().with_max_item_count(7))
            .times(1)
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let items: Vec<Order> = repo
            .get_items_with_options(&Filter::all(), QueryOptions::default().with_max_item_count(7))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_all_pages_are_drained() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .withf(|_, _, _, continuation| continuation.is_none())
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeedPage {
                    documents: vec![stored("o1", 1, "\"a\"")],
                    continuation: Some("1".to_string()),
                })
            });
        client
            .expect_query_documents()
            .withf(|_, _, _, continuation| continuation.as_deref() == Some("1"))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeedPage {
                    documents: vec![stored("o2", 2, "\"b\"")],
                    continuation: None,
                })
            });
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let items: Vec<Order> = repo.get_items(&Filter::all()).await.unwrap();
        assert_eq!(
            items,
            vec![
                Order { id: "o1".to_string(), total: 1 },
                Order { id: "o2".to_string(), total: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_single_item_stops_after_first_match() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeedPage {
                    documents: vec![stored("o1", 1, "\"a\"")],
                    continuation: Some("1".to_string()),
                })
            });
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let item: Option<Order> = repo.get_item(&Filter::all()).await.unwrap();
        assert_eq!(item.map(|o| o.id), Some("o1".to_string()));
    }

    #[tokio::test]
    async fn test_update_replaces_with_etag_precondition() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .withf(|_, spec, _, _| spec.parameter("@p0") == Some(&json!("o1")))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeedPage {
                    documents: vec![stored("o1", 42, "\"v1\"")],
                    continuation: None,
                })
            });
        client
            .expect_replace_document()
            .withf(|link, body, options| {
                link == "dbs/shop/colls/orders/docs/o1"
                    && body["total"] == 99
                    && options.if_match.as_deref() == Some("\"v1\"")
            })
            .times(1)
            .returning(|_, body, _| {
                let mut body = body;
                body["_self"] = json!("dbs/shop/colls/orders/docs/o1");
                body["_etag"] = json!("\"v2\"");
                Document::from_body(body)
            });
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let updated = Order { id: "o1".to_string(), total: 99 };
        repo.update_item("o1", &updated).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_surfaces_lost_precondition() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeedPage {
                    documents: vec![stored("o1", 42, "\"v1\"")],
                    continuation: None,
                })
            });
        client
            .expect_replace_document()
            .withf(|_, _, options| options.if_match.as_deref() == Some("\"v1\""))
            .times(1)
            .returning(|_, _, _| Err(RepoError::PreconditionFailed("etag \"v1\" is stale".to_string())));
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let err = repo
            .update_item("o1", &Order { id: "o1".to_string(), total: 99 })
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::PreconditionFailed(m) if m == "etag \"v1\" is stale"));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let mut client = provisioned_mock();
        client
            .expect_query_documents()
            .returning(|_, _, _, _| Ok(FeedPage::default()));
        client.expect_replace_document().never();
        client.expect_create_document().never();
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let item = Order { id: "nope".to_string(), total: 1 };
        let err = repo.update_item("nope", &item).await.unwrap_err();

        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_id() {
        let client = MockDocumentClient::new();
        let repo = DocumentDbRepository::new(config(), CountingConnector::new(client), "orders");

        let item = Order { id: "o2".to_string(), total: 1 };
        let err = repo.update_item("o1", &item).await.unwrap_err();

        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_configuration_surfaces_on_first_use() {
        let settings: HashMap<String, String> =
            [("endpoint".to_string(), "https://localhost:8081".to_string())].into();
        let connector = CountingConnector::new(MockDocumentClient::new());
        let repo = DocumentDbRepository::new(settings, connector.clone(), "orders");

        let err = repo.get_items::<Order>(&Filter::all()).await.unwrap_err();

        assert!(matches!(err, RepoError::MissingConfig("authKey")));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_reported() {
        let settings = DocumentDbConfig::new("localhost", "key", "shop");
        let repo = DocumentDbRepository::new(
            settings,
            CountingConnector::new(MockDocumentClient::new()),
            "orders",
        );

        let err = repo.create_item(&Order { id: "o1".to_string(), total: 1 }).await.unwrap_err();
        assert!(matches!(err, RepoError::InvalidEndpoint(_)));
    }
}
