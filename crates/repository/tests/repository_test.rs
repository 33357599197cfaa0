//! Repository integration tests.
//!
//! These run the repository end to end against the in-memory document
//! service, so provisioning, SQL translation, indexing and preconditions
//! all take the real code paths.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use docdb_repository::{
    field, CollectionSpec, DocumentClient, DocumentDbConfig, DocumentDbRepository, Entity, Filter, InMemoryService,
    IndexingPolicy, QueryOptions, RepoError, RequestOptions, SqlQuerySpec,
};

const ENDPOINT: &str = "https://localhost:8081";
const KEY: &str = "master-key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: String,
    customer: String,
    total: i64,
}

impl Entity for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

fn order(id: &str, customer: &str, total: i64) -> Order {
    Order {
        id: id.to_string(),
        customer: customer.to_string(),
        total,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("docdb_repository=debug")
        .with_test_writer()
        .try_init();
}

fn setup() -> (Arc<InMemoryService>, DocumentDbRepository) {
    init_tracing();
    let service = InMemoryService::new(KEY);
    let repo = DocumentDbRepository::new(
        DocumentDbConfig::new(ENDPOINT, KEY, "shop"),
        Arc::new(service.connector()),
        "orders",
    );
    (service, repo)
}

async fn seed(repo: &DocumentDbRepository) {
    for item in [
        order("o1", "acme", 42),
        order("o2", "globex", 7),
        order("o3", "acme", 150),
    ] {
        repo.create_item(&item).await.unwrap();
    }
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_orders_scenario() {
    let (service, repo) = setup();
    assert!(service.database_ids().await.is_empty());

    repo.create_item(&order("o1", "acme", 42)).await.unwrap();

    assert_eq!(service.database_ids().await, vec!["shop".to_string()]);
    assert_eq!(service.collection_ids("shop").await, vec!["orders".to_string()]);
    assert_eq!(
        service.indexing_policy("shop", "orders").await,
        Some(IndexingPolicy::default())
    );
    assert_eq!(service.offer_type("shop", "orders").await.as_deref(), Some("S1"));

    let stored: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();
    assert_eq!(stored, Some(order("o1", "acme", 42)));

    repo.update_item("o1", &order("o1", "acme", 99)).await.unwrap();

    let updated: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();
    assert_eq!(updated.map(|o| o.total), Some(99));
    assert_eq!(service.document_count("shop", "orders").await, 1);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_filters_select_matching_items() {
    let (_service, repo) = setup();
    seed(&repo).await;

    let mut big: Vec<Order> = repo.get_items(&field("total").gt(10)).await.unwrap();
    big.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(big, vec![order("o1", "acme", 42), order("o3", "acme", 150)]);

    let acme_small: Vec<Order> = repo
        .get_items(&field("customer").eq("acme").and(field("total").lt(100)))
        .await
        .unwrap();
    assert_eq!(acme_small, vec![order("o1", "acme", 42)]);

    let either: Vec<Order> = repo
        .get_items(&field("id").in_list(["o2", "o3", "o9"]))
        .await
        .unwrap();
    assert_eq!(either.len(), 2);

    let everything: Vec<Order> = repo.get_items(&Filter::all()).await.unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn test_no_match_is_empty_not_error() {
    let (_service, repo) = setup();
    seed(&repo).await;

    let none: Vec<Order> = repo.get_items(&field("total").gt(1_000)).await.unwrap();
    assert!(none.is_empty());

    let missing: Option<Order> = repo.get_item(&field("id").eq("nope")).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_get_item_and_get_items_accept_the_same_filters() {
    let (_service, repo) = setup();
    seed(&repo).await;
    // String equality is not covered by the default numeric index.
    let filter = field("customer").eq("globex");

    let items: Vec<Order> = repo.get_items(&filter).await.unwrap();
    let item: Option<Order> = repo.get_item(&filter).await.unwrap();

    assert_eq!(items, vec![order("o2", "globex", 7)]);
    assert_eq!(item, Some(order("o2", "globex", 7)));
}

#[tokio::test]
async fn test_raw_queries_are_not_scanned() {
    let (_service, repo) = setup();
    seed(&repo).await;

    let indexed: Vec<Order> = repo
        .get_items_by_query("SELECT * FROM c WHERE c.total >= 42")
        .await
        .unwrap();
    assert_eq!(indexed.len(), 2);

    let first: Option<Order> = repo
        .get_item_by_query("SELECT * FROM c WHERE c.total < 10")
        .await
        .unwrap();
    assert_eq!(first.map(|o| o.id), Some("o2".to_string()));

    let err = repo
        .get_items_by_query::<Order>("SELECT * FROM c WHERE c.customer = 'acme'")
        .await
        .unwrap_err();
    assert!(err.is_scan_required());
}

#[tokio::test]
async fn test_malformed_raw_query_is_bad_request() {
    let (_service, repo) = setup();

    let err = repo
        .get_items_by_query::<Order>("SELECT * FROM c WHERE")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::BadRequest(_)));
}

#[tokio::test]
async fn test_badly_shaped_document_is_a_serialization_error() {
    let (service, repo) = setup();
    seed(&repo).await;
    service
        .client()
        .create_document(
            "dbs/shop/colls/orders/docs",
            json!({ "id": "bad", "customer": "acme", "total": "oops" }),
        )
        .await
        .unwrap();

    let err = repo.get_items::<Order>(&Filter::all()).await.unwrap_err();
    assert!(matches!(err, RepoError::Serialization(_)));
    assert_eq!(err.code(), "SERIALIZATION_ERROR");

    let err = repo
        .get_item::<Order>(&field("id").eq("bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Serialization(_)));
}

#[tokio::test]
async fn test_small_pages_still_return_everything() {
    let (_service, repo) = setup();
    seed(&repo).await;

    let items: Vec<Order> = repo
        .get_items_with_options(&Filter::all(), QueryOptions::scan().with_max_item_count(1))
        .await
        .unwrap();
    assert_eq!(items.len(), 3);

    let err = repo
        .get_items_with_options::<Order>(&field("customer").eq("acme"), QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::QueryRequiresScan(_)));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let (service, repo) = setup();
    repo.create_item(&order("o1", "acme", 42)).await.unwrap();

    let err = repo.create_item(&order("o1", "globex", 1)).await.unwrap_err();

    assert!(matches!(err, RepoError::Conflict(_)));
    assert_eq!(service.document_count("shop", "orders").await, 1);
}

#[tokio::test]
async fn test_update_missing_item_creates_nothing() {
    let (service, repo) = setup();
    seed(&repo).await;

    let err = repo
        .update_item("o9", &order("o9", "acme", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(_)));
    assert_eq!(service.document_count("shop", "orders").await, 3);
}

#[tokio::test]
async fn test_update_with_mismatched_id_is_rejected() {
    let (_service, repo) = setup();
    seed(&repo).await;

    let err = repo
        .update_item("o1", &order("o2", "acme", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let unchanged: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();
    assert_eq!(unchanged.map(|o| o.total), Some(42));
}

#[tokio::test]
async fn test_stale_etag_loses_to_repository_update() {
    let (service, repo) = setup();
    seed(&repo).await;
    let client = service.client();

    let page = client
        .query_documents(
            "dbs/shop/colls/orders/docs",
            &SqlQuerySpec::by_id("o1"),
            &QueryOptions::default(),
            None,
        )
        .await
        .unwrap();
    let stale_etag = page.documents[0]["_etag"].as_str().unwrap().to_string();

    repo.update_item("o1", &order("o1", "acme", 99)).await.unwrap();

    let err = client
        .replace_document(
            "dbs/shop/colls/orders/docs/o1",
            json!({ "id": "o1", "customer": "acme", "total": 1 }),
            &RequestOptions::if_match(stale_etag),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::PreconditionFailed(_)));

    let current: Option<Order> = repo.get_item(&field("id").eq("o1")).await.unwrap();
    assert_eq!(current.map(|o| o.total), Some(99));
}

// =============================================================================
// Provisioning
// =============================================================================

#[tokio::test]
async fn test_existing_collection_keeps_its_policy() {
    let (service, repo) = setup();
    let client = service.client();
    let db = client.create_database("shop").await.unwrap();
    let mut spec = CollectionSpec::new("orders");
    spec.indexing_policy = IndexingPolicy::none();
    client
        .create_collection(&db.self_link, &spec, &RequestOptions::offer_type("S3"))
        .await
        .unwrap();

    seed(&repo).await;

    assert_eq!(
        service.indexing_policy("shop", "orders").await,
        Some(IndexingPolicy::none())
    );
    assert_eq!(service.offer_type("shop", "orders").await.as_deref(), Some("S3"));

    // Nothing but the id is indexed, so numeric predicates need a scan.
    let scanned: Vec<Order> = repo.get_items(&field("total").gt(10)).await.unwrap();
    assert_eq!(scanned.len(), 2);
    let err = repo
        .get_items_by_query::<Order>("SELECT * FROM c WHERE c.total > 10")
        .await
        .unwrap_err();
    assert!(err.is_scan_required());
}

#[tokio::test]
async fn test_repositories_share_provisioned_resources() {
    let (service, orders) = setup();
    let invoices = DocumentDbRepository::new(
        DocumentDbConfig::new(ENDPOINT, KEY, "shop"),
        Arc::new(service.connector()),
        "invoices",
    );

    orders.create_item(&order("o1", "acme", 42)).await.unwrap();
    let none: Vec<Order> = invoices.get_items(&Filter::all()).await.unwrap();

    assert!(none.is_empty());
    assert_eq!(service.database_ids().await, vec!["shop".to_string()]);
    let mut collections = service.collection_ids("shop").await;
    collections.sort();
    assert_eq!(collections, vec!["invoices".to_string(), "orders".to_string()]);
}

// =============================================================================
// Configuration and credentials
// =============================================================================

#[tokio::test]
async fn test_wrong_key_is_unauthorized() {
    init_tracing();
    let service = InMemoryService::new(KEY);
    let repo = DocumentDbRepository::new(
        DocumentDbConfig::new(ENDPOINT, "wrong", "shop"),
        Arc::new(service.connector()),
        "orders",
    );

    let err = repo.get_items::<Order>(&Filter::all()).await.unwrap_err();

    assert!(matches!(err, RepoError::Unauthorized));
    assert_eq!(err.status(), Some(401));
    assert!(service.database_ids().await.is_empty());
}

#[tokio::test]
async fn test_missing_database_setting() {
    init_tracing();
    let service = InMemoryService::new(KEY);
    let settings: HashMap<String, String> = [
        ("endpoint".to_string(), ENDPOINT.to_string()),
        ("authKey".to_string(), KEY.to_string()),
        ("database".to_string(), "   ".to_string()),
    ]
    .into();
    let repo = DocumentDbRepository::new(settings, Arc::new(service.connector()), "orders");

    let err = repo.get_item::<Order>(&Filter::all()).await.unwrap_err();

    assert!(matches!(err, RepoError::MissingConfig("database")));
    assert!(service.database_ids().await.is_empty());
}

#[tokio::test]
async fn test_invalid_endpoint() {
    init_tracing();
    let service = InMemoryService::new(KEY);
    let repo = DocumentDbRepository::new(
        DocumentDbConfig::new("ftp://localhost", KEY, "shop"),
        Arc::new(service.connector()),
        "orders",
    );

    let err = repo.create_item(&order("o1", "acme", 1)).await.unwrap_err();

    assert!(matches!(err, RepoError::InvalidEndpoint(_)));
}
