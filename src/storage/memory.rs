//! In-memory storage backend
//!
//! Each collection keeps its items in a `BTreeMap` keyed by the numeric id,
//! so iteration order is insertion order. Ids are the lowercase hex form of
//! a per-collection counter starting at 1, and are never reused.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, warn};

use super::cache::HandlerCache;
use super::errors::{StorageError, StorageResult};
use super::traits::{CollectionHandler, QueryParams, Storage};
use crate::schema::{CollectionDefinition, Item};

/// Storage keeping every collection in process memory
pub struct MemoryStorage {
    definitions: Vec<CollectionDefinition>,
    handlers: HandlerCache,
}

impl MemoryStorage {
    /// Create an empty storage for the given collections
    pub fn initialize(definitions: Vec<CollectionDefinition>) -> Self {
        let handlers = HandlerCache::new(definitions.iter().map(|d| d.name.as_str()));
        Self {
            definitions,
            handlers,
        }
    }
}

impl Storage for MemoryStorage {
    fn collection_definitions(&self) -> &[CollectionDefinition] {
        &self.definitions
    }

    fn collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, StorageResult<Arc<dyn CollectionHandler>>> {
        Box::pin(async move {
            self.handlers
                .get_or_create(name, || async move {
                    debug!(collection = name, "creating in-memory collection handler");
                    Ok(Arc::new(MemoryCollectionHandler::new(name)) as Arc<dyn CollectionHandler>)
                })
                .await
        })
    }
}

#[derive(Debug, Default)]
struct MemoryCollection {
    items: BTreeMap<u64, Item>,
    last_id: u64,
}

/// Handler over one in-memory collection.
///
/// All mutations of a collection go through one lock, so concurrent
/// inserts never share an id.
pub struct MemoryCollectionHandler {
    name: String,
    state: RwLock<MemoryCollection>,
}

impl MemoryCollectionHandler {
    /// Create an empty collection handler
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(MemoryCollection::default()),
        }
    }

    /// Number of stored items
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.read_state()?.items.len())
    }

    /// Whether the collection holds no items
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read_state(&self) -> StorageResult<RwLockReadGuard<'_, MemoryCollection>> {
        self.state.read().map_err(|_| self.poisoned())
    }

    fn write_state(&self) -> StorageResult<RwLockWriteGuard<'_, MemoryCollection>> {
        self.state.write().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> StorageError {
        warn!(collection = %self.name, "collection lock poisoned");
        StorageError::Backend(format!("collection {} lock poisoned", self.name))
    }

    /// `get_item` has no error channel; a poisoned lock is logged by
    /// `poisoned` and reads as absent.
    fn get(&self, item_id: &str) -> Option<Item> {
        let key = parse_id(item_id)?;
        let state = self.read_state().ok()?;
        state.items.get(&key).cloned()
    }

    fn add(&self, item: Item) -> StorageResult<String> {
        let mut state = self.write_state()?;
        state.last_id += 1;
        let key = state.last_id;
        state.items.insert(key, item);
        Ok(format_id(key))
    }

    fn update(&self, item_id: &str, item: Item) -> StorageResult<()> {
        let mut state = self.write_state()?;
        let slot = parse_id(item_id)
            .and_then(|key| state.items.get_mut(&key))
            .ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;
        *slot = item;
        Ok(())
    }

    fn delete(&self, item_id: &str) -> StorageResult<()> {
        let mut state = self.write_state()?;
        parse_id(item_id)
            .and_then(|key| state.items.remove(&key))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(item_id.to_string()))
    }

    fn list(&self, params: &QueryParams) -> StorageResult<Vec<Item>> {
        let state = self.read_state()?;
        let mut items: Vec<&Item> = state.items.values().collect();

        if let Some(field) = params.sort_by() {
            // stable: equal keys keep insertion order
            items.sort_by(|a, b| compare_field(a.get(field), b.get(field)));
        }

        let skip = usize::try_from(params.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(params.limit()).unwrap_or(usize::MAX);

        Ok(items.into_iter().skip(skip).take(limit).cloned().collect())
    }
}

impl CollectionHandler for MemoryCollectionHandler {
    fn get_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Option<Item>> {
        Box::pin(async move { self.get(item_id) })
    }

    fn add_item(&self, item: Item) -> BoxFuture<'_, StorageResult<String>> {
        Box::pin(async move { self.add(item) })
    }

    fn update_item<'a>(&'a self, item_id: &'a str, item: Item) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move { self.update(item_id, item) })
    }

    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move { self.delete(item_id) })
    }

    fn query(&self, params: QueryParams) -> BoxFuture<'_, StorageResult<Vec<Item>>> {
        Box::pin(async move { self.list(&params) })
    }
}

fn format_id(key: u64) -> String {
    format!("{:x}", key)
}

/// Only the canonical spelling of an id resolves ("a", not "A" or "0a").
fn parse_id(item_id: &str) -> Option<u64> {
    let key = u64::from_str_radix(item_id, 16).ok()?;
    (format_id(key) == item_id).then_some(key)
}

/// Orders numbers before strings before booleans; missing values sort last.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn bob() -> Item {
        item(json!({
            "name": "Bob",
            "lastname": "Howards",
            "age": 20.0,
            "is_active": true
        }))
    }

    fn named(name: &str) -> Item {
        item(json!({ "name": name }))
    }

    #[tokio::test]
    async fn test_add_item_first_id() {
        let handler = MemoryCollectionHandler::new("books");
        let id = handler.add_item(bob()).await.unwrap();
        assert_eq!(id, "1");
    }

    #[tokio::test]
    async fn test_ids_are_hex_and_monotonic() {
        let handler = MemoryCollectionHandler::new("books");
        let mut ids = Vec::new();
        for i in 0..16 {
            ids.push(handler.add_item(named(&i.to_string())).await.unwrap());
        }
        assert_eq!(ids[..3], ["1", "2", "3"]);
        assert_eq!(ids[9], "a");
        assert_eq!(ids[15], "10");
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let handler = MemoryCollectionHandler::new("books");
        for _ in 0..3 {
            handler.add_item(bob()).await.unwrap();
        }
        handler.delete_item("3").await.unwrap();
        assert_eq!(handler.add_item(bob()).await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_get_item_round_trip() {
        let handler = MemoryCollectionHandler::new("books");
        let id = handler.add_item(bob()).await.unwrap();

        let fetched = handler.get_item(&id).await.unwrap();
        assert_eq!(fetched, bob());
        assert_eq!(fetched.len(), 4);
    }

    #[tokio::test]
    async fn test_get_item_not_found() {
        let handler = MemoryCollectionHandler::new("books");
        handler.add_item(bob()).await.unwrap();

        assert!(handler.get_item("2").await.is_none());
        assert!(handler.get_item("not-hex").await.is_none());
        assert!(handler.get_item("01").await.is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_item() {
        let handler = MemoryCollectionHandler::new("books");
        let id = handler.add_item(bob()).await.unwrap();

        handler.update_item(&id, named("Bob updated")).await.unwrap();

        let fetched = handler.get_item(&id).await.unwrap();
        assert_eq!(fetched, named("Bob updated"));
        assert!(!fetched.contains_key("age"));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let handler = MemoryCollectionHandler::new("books");
        handler.add_item(bob()).await.unwrap();

        let err = handler.update_item("2", bob()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "2"));
    }

    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let handler = MemoryCollectionHandler::new("books");
        let id = handler.add_item(bob()).await.unwrap();

        handler.delete_item(&id).await.unwrap();
        assert!(handler.is_empty().unwrap());

        let err = handler.delete_item(&id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_pagination() {
        let handler = MemoryCollectionHandler::new("books");
        for name in ["A", "B", "C"] {
            handler.add_item(named(name)).await.unwrap();
        }

        let page = handler.query(QueryParams::new(1, 10)).await.unwrap();
        assert_eq!(page, vec![named("B"), named("C")]);

        let page = handler.query(QueryParams::new(0, 1)).await.unwrap();
        assert_eq!(page, vec![named("A")]);

        let page = handler.query(QueryParams::new(5, 10)).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_query_limit_ceiling() {
        let handler = MemoryCollectionHandler::new("books");
        for i in 0..150 {
            handler.add_item(named(&i.to_string())).await.unwrap();
        }

        let page = handler.query(QueryParams::new(0, 500)).await.unwrap();
        assert_eq!(page.len(), crate::storage::MAX_LIMIT as usize);
    }

    #[tokio::test]
    async fn test_query_skips_deleted_items() {
        let handler = MemoryCollectionHandler::new("books");
        for name in ["A", "B", "C"] {
            handler.add_item(named(name)).await.unwrap();
        }
        handler.delete_item("2").await.unwrap();

        let page = handler.query(QueryParams::default()).await.unwrap();
        assert_eq!(page, vec![named("A"), named("C")]);
    }

    #[tokio::test]
    async fn test_query_sort_by() {
        let handler = MemoryCollectionHandler::new("books");
        handler.add_item(item(json!({"name": "C", "age": 3}))).await.unwrap();
        handler.add_item(item(json!({"name": "A"}))).await.unwrap();
        handler.add_item(item(json!({"name": "B", "age": 1.5}))).await.unwrap();

        let page = handler
            .query(QueryParams::new(0, 10).with_sort_by("age"))
            .await
            .unwrap();
        let names: Vec<&str> = page.iter().map(|i| i["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_dense_unique_ids() {
        let handler = Arc::new(MemoryCollectionHandler::new("books"));
        let n = 200;

        let mut tasks = Vec::new();
        for _ in 0..n {
            let handler = Arc::clone(&handler);
            tasks.push(tokio::spawn(async move { handler.add_item(bob()).await.unwrap() }));
        }

        let mut keys = Vec::new();
        for task in tasks {
            let id = task.await.unwrap();
            keys.push(u64::from_str_radix(&id, 16).unwrap());
        }
        keys.sort_unstable();

        let expected: Vec<u64> = (1..=n).collect();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_storage_memoizes_handlers() {
        let definitions = crate::schema::parse_manifest(
            r#"[{"name": "books", "fields": {"name": "string"}}]"#,
        )
        .unwrap();
        let storage = MemoryStorage::initialize(definitions);

        let first = storage.collection("books").await.unwrap();
        first.add_item(bob()).await.unwrap();

        let second = storage.collection("books").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.get_item("1").await.is_some());
    }

    #[tokio::test]
    async fn test_storage_unknown_collection() {
        let storage = MemoryStorage::initialize(Vec::new());
        let err = storage.collection("films").await.err().unwrap();
        assert!(matches!(err, StorageError::CollectionNotFound(name) if name == "films"));
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_reported() {
        let handler = Arc::new(MemoryCollectionHandler::new("books"));
        handler.add_item(bob()).await.unwrap();

        let poisoner = Arc::clone(&handler);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(handler.len(), Err(StorageError::Backend(_))));
        assert!(matches!(handler.is_empty(), Err(StorageError::Backend(_))));
        assert!(handler.get_item("1").await.is_none());
        assert!(matches!(
            handler.add_item(bob()).await,
            Err(StorageError::Backend(_))
        ));
        assert!(matches!(
            handler.query(QueryParams::default()).await,
            Err(StorageError::Backend(_))
        ));
    }
}
