//! Per-collection handler cache
//!
//! The set of names is fixed by the manifest, so the map itself is never
//! mutated after construction. Each slot is a `OnceCell`, which runs the
//! constructor exactly once even under concurrent first access.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::errors::{StorageError, StorageResult};
use super::traits::CollectionHandler;

pub(crate) struct HandlerCache {
    slots: HashMap<String, OnceCell<Arc<dyn CollectionHandler>>>,
}

impl HandlerCache {
    pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            slots: names
                .into_iter()
                .map(|name| (name.to_string(), OnceCell::new()))
                .collect(),
        }
    }

    /// Returns the cached handler for `name`, building it with `create` on
    /// first use. A failed build leaves the slot empty for the next caller.
    pub(crate) async fn get_or_create<F, Fut>(
        &self,
        name: &str,
        create: F,
    ) -> StorageResult<Arc<dyn CollectionHandler>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StorageResult<Arc<dyn CollectionHandler>>>,
    {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| StorageError::CollectionNotFound(name.to_string()))?;

        slot.get_or_try_init(create).await.cloned()
    }
}
