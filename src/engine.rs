use crate::collection::Collection;
use crate::types::CollectionName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named in-memory collections.
#[derive(Default)]
pub struct Engine {
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("collections", &self.list_collection_names()).finish()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the collection called `name`, creating it on first use.
    pub fn create_collection(&self, name: impl Into<String>) -> Arc<Collection> {
        let name = name.into();
        if let Some(existing) = self.collections.read().get(&name) {
            return existing.clone();
        }
        let mut map = self.collections.write();
        map.entry(name)
            .or_insert_with_key(|n| {
                log::debug!("engine: created collection {n}");
                Arc::new(Collection::new(n.clone()))
            })
            .clone()
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Removes the collection from the registry. Handles already handed out
    /// stay valid but are no longer registered.
    pub fn drop_collection(&self, name: &str) -> bool {
        let dropped = self.collections.write().remove(name).is_some();
        if dropped {
            log::info!("engine: dropped collection {name}");
        }
        dropped
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
