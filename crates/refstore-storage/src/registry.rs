//! Plugin registry keyed by storage identifier.
//!
//! The orchestrator consults the registry to decide whether a storage is
//! "known": deletion requests are only created for references whose storage
//! has a registered plugin.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::StoragePlugin;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn StoragePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn StoragePlugin>) {
        let id = plugin.storage_id().to_string();
        if self.plugins.insert(id.clone(), plugin).is_some() {
            tracing::warn!(storage = %id, "Replacing already-registered storage plugin");
        }
    }

    pub fn get(&self, storage: &str) -> Option<Arc<dyn StoragePlugin>> {
        self.plugins.get(storage).cloned()
    }

    pub fn contains(&self, storage: &str) -> bool {
        self.plugins.contains_key(storage)
    }

    pub fn storage_ids(&self) -> Vec<&str> {
        self.plugins.keys().map(|s| s.as_str()).collect()
    }
}
