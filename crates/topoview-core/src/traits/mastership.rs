// # Mastership Service Trait

use async_trait::async_trait;

use crate::model::{DeviceId, NodeId};

/// Device mastership queries
#[async_trait]
pub trait MastershipService: Send + Sync {
    /// Current master of the device
    ///
    /// `Ok(None)` means no instance holds mastership right now, which is a
    /// normal condition and not an error.
    async fn master_for(&self, device_id: &DeviceId) -> Result<Option<NodeId>, crate::Error>;
}
