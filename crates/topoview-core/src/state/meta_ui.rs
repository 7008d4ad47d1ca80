// # Memory Meta-UI Store
//
// In-memory implementation of MetaUiStore.
//
// ## Purpose
//
// Holds client display metadata for the lifetime of the process. This is the
// only store the viewer ships; metadata not surviving a restart is a known and
// accepted gap.
//
// ## Crash Behavior
//
// - All metadata is lost on restart/crash
// - Clients fall back to their default layout until they save again

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::meta_ui_store::{MetaUi, MetaUiStore};
use crate::Error;

/// In-memory meta-UI store implementation
///
/// Documents live in a HashMap behind a RwLock. A `put` swaps the whole
/// document under the write lock, so readers never see a partial update.
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust,no_run
/// use topoview_core::state::MemoryMetaUiStore;
/// use topoview_core::traits::MetaUiStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryMetaUiStore::new();
///
///     let memento = serde_json::json!({ "x": 10, "y": 20 });
///     store.put("of:1", memento.as_object().cloned().unwrap_or_default()).await?;
///
///     let meta = store.get("of:1").await?;
///     assert_eq!(meta.and_then(|m| m.get("x").cloned()), Some(10.into()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryMetaUiStore {
    inner: Arc<RwLock<HashMap<String, MetaUi>>>,
}

impl MemoryMetaUiStore {
    /// Create a new empty meta-UI store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryMetaUiStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetaUiStore for MemoryMetaUiStore {
    async fn get(&self, id: &str) -> Result<Option<MetaUi>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn put(&self, id: &str, meta: MetaUi) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(id.to_string(), meta);
        Ok(())
    }
}
