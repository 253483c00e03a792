//! MongoDB storage backend
//!
//! Every collection maps to the MongoDB collection of the same name inside
//! one configured database. Ids are the `_id` ObjectId rendered as hex; the
//! `_id` field itself is projected out of every returned item.
//!
//! Every backend call is bounded by [`OPERATION_TIMEOUT`]. Dropping the
//! returned future (e.g. when the client disconnects) abandons the call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, FindOneOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::cache::HandlerCache;
use super::errors::{StorageError, StorageResult};
use super::traits::{CollectionHandler, QueryParams, Storage};
use crate::schema::{CollectionDefinition, Item};

/// Bound on connecting to and pinging the server at startup
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on every item operation
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// MongoDB connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string (default: "mongodb://localhost:27017")
    #[serde(default = "default_host")]
    pub host: String,

    /// Database holding the collections (default: "default")
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "default".to_string()
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            database: default_database(),
        }
    }
}

/// Storage backed by a MongoDB database
pub struct MongoStorage {
    definitions: Vec<CollectionDefinition>,
    database: Database,
    handlers: HandlerCache,
}

impl MongoStorage {
    /// Connects to the server and verifies it answers a ping.
    ///
    /// Returns [`StorageError::Unavailable`] if the server cannot be reached
    /// within [`CONNECT_TIMEOUT`].
    pub async fn initialize(
        definitions: Vec<CollectionDefinition>,
        config: &MongoConfig,
    ) -> StorageResult<Self> {
        let unavailable = |reason: String| StorageError::Unavailable {
            target: config.host.clone(),
            reason,
        };

        let mut options = ClientOptions::parse(&config.host)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(options).map_err(|e| unavailable(e.to_string()))?;
        let database = client.database(&config.database);

        bounded(CONNECT_TIMEOUT, database.run_command(doc! { "ping": 1 }, None))
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        info!(host = %config.host, database = %config.database, "connected to mongodb");

        let handlers = HandlerCache::new(definitions.iter().map(|d| d.name.as_str()));
        Ok(Self {
            definitions,
            database,
            handlers,
        })
    }

    fn definition(&self, name: &str) -> Option<&CollectionDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

impl Storage for MongoStorage {
    fn collection_definitions(&self) -> &[CollectionDefinition] {
        &self.definitions
    }

    fn collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, StorageResult<Arc<dyn CollectionHandler>>> {
        Box::pin(async move {
            let definition = self
                .definition(name)
                .ok_or_else(|| StorageError::CollectionNotFound(name.to_string()))?;

            self.handlers
                .get_or_create(name, || async move {
                    debug!(collection = name, "creating mongodb collection handler");
                    let handler = MongoCollectionHandler::new(&self.database, definition.clone());
                    Ok(Arc::new(handler) as Arc<dyn CollectionHandler>)
                })
                .await
        })
    }
}

/// Handler over one MongoDB collection
pub struct MongoCollectionHandler {
    collection: Collection<Document>,
    definition: CollectionDefinition,
}

impl MongoCollectionHandler {
    /// Bind a handler to the collection named by `definition`
    pub fn new(database: &Database, definition: CollectionDefinition) -> Self {
        Self {
            collection: database.collection(&definition.name),
            definition,
        }
    }

    /// Name of the bound collection
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    async fn get(&self, item_id: &str) -> Option<Item> {
        let oid = parse_object_id(item_id)?;
        let options = FindOneOptions::builder().projection(doc! { "_id": 0 }).build();

        match bounded(OPERATION_TIMEOUT, self.collection.find_one(doc! { "_id": oid }, options)).await {
            Ok(Some(document)) => Some(document_to_item(document)),
            Ok(None) => None,
            Err(e) => {
                error!(collection = self.name(), item_id, error = %e, "unable to fetch item");
                None
            }
        }
    }

    async fn add(&self, item: Item) -> StorageResult<String> {
        let document = item_to_document(&item)?;
        let result = bounded(OPERATION_TIMEOUT, self.collection.insert_one(document, None)).await?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Err(StorageError::Backend(format!(
                "unexpected inserted id type: {}",
                other
            ))),
        }
    }

    async fn update(&self, item_id: &str, item: Item) -> StorageResult<()> {
        let oid = parse_object_id(item_id).ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;
        let document = item_to_document(&item)?;

        let result = bounded(
            OPERATION_TIMEOUT,
            self.collection.replace_one(doc! { "_id": oid }, document, None),
        )
        .await?;

        if result.matched_count == 0 {
            return Err(StorageError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, item_id: &str) -> StorageResult<()> {
        let oid = parse_object_id(item_id).ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;

        let result = bounded(OPERATION_TIMEOUT, self.collection.delete_one(doc! { "_id": oid }, None)).await?;

        if result.deleted_count == 0 {
            return Err(StorageError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, params: QueryParams) -> StorageResult<Vec<Item>> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 0 })
            .sort(sort_document(params.sort_by()))
            .skip(params.skip())
            .limit(i64::try_from(params.limit()).unwrap_or(i64::MAX))
            .build();

        let documents: Vec<Document> = bounded(OPERATION_TIMEOUT, async {
            let cursor = self.collection.find(doc! {}, options).await?;
            cursor.try_collect().await
        })
        .await?;

        Ok(documents.into_iter().map(document_to_item).collect())
    }
}

impl CollectionHandler for MongoCollectionHandler {
    fn get_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Option<Item>> {
        Box::pin(self.get(item_id))
    }

    fn add_item(&self, item: Item) -> BoxFuture<'_, StorageResult<String>> {
        Box::pin(self.add(item))
    }

    fn update_item<'a>(&'a self, item_id: &'a str, item: Item) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(self.update(item_id, item))
    }

    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(self.delete(item_id))
    }

    fn query(&self, params: QueryParams) -> BoxFuture<'_, StorageResult<Vec<Item>>> {
        Box::pin(self.list(params))
    }
}

/// Runs a driver call under `limit`, mapping elapsed time to `Timeout`.
async fn bounded<T, F>(limit: Duration, call: F) -> StorageResult<T>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(StorageError::from),
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "mongodb operation timed out");
            Err(StorageError::Timeout)
        }
    }
}

/// Ids that are not valid ObjectId hex can never match a document.
fn parse_object_id(item_id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(item_id).ok()
}

fn sort_document(sort_by: Option<&str>) -> Document {
    let mut sort = Document::new();
    if let Some(field) = sort_by {
        sort.insert(field, 1);
    }
    // _id last keeps equal keys in insertion order
    sort.insert("_id", 1);
    sort
}

fn item_to_document(item: &Item) -> StorageResult<Document> {
    mongodb::bson::to_document(item).map_err(|e| StorageError::Backend(e.to_string()))
}

/// Converts a stored document back to an item; `_id` is dropped if present.
fn document_to_item(mut document: Document) -> Item {
    document.remove("_id");
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Item::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_startup() {
        let config = MongoConfig {
            host: "mongodb://127.0.0.1:1".to_string(),
            database: "apio_test".to_string(),
        };

        let started = std::time::Instant::now();
        let result = MongoStorage::initialize(Vec::new(), &config).await;
        let elapsed = started.elapsed();

        match result.err() {
            Some(StorageError::Unavailable { target, .. }) => assert_eq!(target, config.host),
            other => panic!("expected Unavailable, got {:?}", other),
        }
        assert!(elapsed < CONNECT_TIMEOUT + Duration::from_secs(1), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, mongodb::error::Error>(())
        };
        let result = bounded(Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(StorageError::Timeout)));
    }

    #[tokio::test]
    async fn test_bounded_passes_result() {
        let fast = async { Ok::<_, mongodb::error::Error>(7) };
        assert_eq!(bounded(OPERATION_TIMEOUT, fast).await.unwrap(), 7);
    }

    #[test]
    fn test_default_config() {
        let config = MongoConfig::default();
        assert_eq!(config.host, "mongodb://localhost:27017");
        assert_eq!(config.database, "default");
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: MongoConfig = serde_json::from_str(r#"{"database": "books_db"}"#).unwrap();
        assert_eq!(config.host, "mongodb://localhost:27017");
        assert_eq!(config.database, "books_db");
    }

    #[test]
    fn test_parse_object_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()), Some(oid));
        assert_eq!(parse_object_id("1"), None);
        assert_eq!(parse_object_id("zzzzzzzzzzzzzzzzzzzzzzzz"), None);
    }

    #[test]
    fn test_item_document_round_trip() {
        let original = item(json!({
            "name": "Bob",
            "age": 20.0,
            "is_active": true
        }));

        let document = item_to_document(&original).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "Bob");
        assert_eq!(document.get_f64("age").unwrap(), 20.0);
        assert!(document.get_bool("is_active").unwrap());

        assert_eq!(document_to_item(document), original);
    }

    #[test]
    fn test_document_to_item_strips_id() {
        let document = doc! { "_id": ObjectId::new(), "name": "Bob" };
        assert_eq!(document_to_item(document), item(json!({"name": "Bob"})));
    }

    #[test]
    fn test_sort_document() {
        assert_eq!(sort_document(None), doc! { "_id": 1 });
        assert_eq!(sort_document(Some("age")), doc! { "age": 1, "_id": 1 });
    }

    // Requires a reachable MongoDB at MONGODB_HOST (default localhost:27017).
    #[tokio::test]
    #[ignore]
    async fn test_live_crud_cycle() {
        let config = MongoConfig {
            host: std::env::var("MONGODB_HOST").unwrap_or_else(|_| default_host()),
            database: format!("apio_test_{}", ObjectId::new().to_hex()),
        };
        let definitions = crate::schema::parse_manifest(
            r#"[{"name": "books", "fields": {"name": "string", "age": "float"}}]"#,
        )
        .unwrap();

        let storage = MongoStorage::initialize(definitions, &config).await.unwrap();
        let books = storage.collection("books").await.unwrap();

        let bob = item(json!({"name": "Bob", "age": 20.0}));
        let id = books.add_item(bob.clone()).await.unwrap();
        assert_eq!(books.get_item(&id).await, Some(bob));

        books.update_item(&id, item(json!({"name": "Rob"}))).await.unwrap();
        assert_eq!(books.get_item(&id).await, Some(item(json!({"name": "Rob"}))));

        for name in ["B", "C"] {
            books.add_item(item(json!({ "name": name }))).await.unwrap();
        }
        let page = books.query(QueryParams::new(1, 10)).await.unwrap();
        assert_eq!(page.len(), 2);

        books.delete_item(&id).await.unwrap();
        assert!(matches!(books.delete_item(&id).await, Err(StorageError::NotFound(_))));

        storage.database.drop(None).await.unwrap();
    }
}
