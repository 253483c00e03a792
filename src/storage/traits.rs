//! Storage contracts shared by every backend

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::errors::StorageResult;
use crate::schema::{CollectionDefinition, Item};

/// Default number of items returned by a listing
pub const DEFAULT_LIMIT: u64 = 20;

/// Hard ceiling on items returned by a listing
pub const MAX_LIMIT: u64 = 100;

/// Registry of collections and their handlers.
///
/// Backends are constructed with their definitions already parsed, so the
/// trait only covers the request-time surface.
pub trait Storage: Send + Sync {
    /// All collection definitions, in manifest order
    fn collection_definitions(&self) -> &[CollectionDefinition];

    /// Handler for a declared collection, created on first use.
    ///
    /// Fails with `CollectionNotFound` if `name` was not declared.
    fn collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, StorageResult<Arc<dyn CollectionHandler>>>;
}

/// CRUD and listing over a single collection
pub trait CollectionHandler: Send + Sync {
    /// Fetch an item; `None` when the id is unknown
    fn get_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Option<Item>>;

    /// Insert an item, returning the backend-assigned id
    fn add_item(&self, item: Item) -> BoxFuture<'_, StorageResult<String>>;

    /// Replace an existing item entirely
    fn update_item<'a>(&'a self, item_id: &'a str, item: Item) -> BoxFuture<'a, StorageResult<()>>;

    /// Remove an existing item
    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, StorageResult<()>>;

    /// List items in backend order after skip, up to limit
    fn query(&self, params: QueryParams) -> BoxFuture<'_, StorageResult<Vec<Item>>>;
}

/// Listing parameters, clamped on construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    skip: u64,
    limit: u64,
    sort_by: Option<String>,
}

impl QueryParams {
    /// Create params; `limit` is clamped to `1..=MAX_LIMIT`
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
            sort_by: None,
        }
    }

    /// Sort ascending by `field` before paging
    pub fn with_sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    /// Items to discard from the front
    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum items to return
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Field to sort by, if any
    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = QueryParams::default();
        assert_eq!(params.skip(), 0);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        assert_eq!(params.sort_by(), None);
    }

    #[test]
    fn test_limit_clamped_to_ceiling() {
        assert_eq!(QueryParams::new(0, 1000).limit(), MAX_LIMIT);
        assert_eq!(QueryParams::new(0, MAX_LIMIT).limit(), MAX_LIMIT);
    }

    #[test]
    fn test_zero_limit_clamped_up() {
        assert_eq!(QueryParams::new(3, 0).limit(), 1);
    }

    #[test]
    fn test_sort_by() {
        let params = QueryParams::new(0, 10).with_sort_by("age");
        assert_eq!(params.sort_by(), Some("age"));
    }
}
