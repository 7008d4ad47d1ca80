// # Meta-UI Store Trait
//
// Defines the interface for client-authored display metadata.
//
// ## Purpose
//
// The viewer lets clients park small JSON documents against entity ids (saved
// canvas positions, pinned state, ...). Every outgoing message about that
// entity carries the document back as `metaUi`, so all clients render the same
// layout.
//
// ## Lifecycle
//
// - Empty at process start
// - Entries created or replaced by `updateMeta` requests
// - Never expired
// - Lost on restart; there is no durable implementation
//
// ## Usage
//
// ```rust
// use topoview_core::state::MemoryMetaUiStore;
// use topoview_core::traits::MetaUiStore;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let store = MemoryMetaUiStore::new();
//
//     let mut memento = serde_json::Map::new();
//     memento.insert("x".into(), 120.into());
//     store.put("of:0000000000000001", memento).await?;
//
//     assert!(store.get("of:0000000000000001").await?.is_some());
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Opaque client metadata document
pub type MetaUi = serde_json::Map<String, serde_json::Value>;

/// Trait for meta-UI store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. A `put`
/// replaces the whole document for one id: concurrent readers of that id see
/// either the old or the new document, never a mix, and readers of other ids
/// are not disturbed.
///
/// # Consistency
///
/// Last writer wins. There is no versioning and no conflict detection.
#[async_trait]
pub trait MetaUiStore: Send + Sync {
    /// Get the metadata stored for an entity
    ///
    /// # Returns
    ///
    /// - `Ok(Some(MetaUi))`: The stored document
    /// - `Ok(None)`: Nothing stored for this id
    /// - `Err(Error)`: Storage error
    async fn get(&self, id: &str) -> Result<Option<MetaUi>, crate::Error>;

    /// Replace the metadata stored for an entity
    async fn put(&self, id: &str, meta: MetaUi) -> Result<(), crate::Error>;
}
