// # Inventory Service Traits
//
// Read-only access to the device, link and host inventories.
//
// Lookups by id return `Error::NotFound` when the subject is unknown; the
// messaging layer lets that propagate to whoever asked.

use async_trait::async_trait;

use crate::model::{Device, DeviceId, Host, HostId, Link, Port};

/// Device inventory queries
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// Look up a device by id
    async fn device(&self, device_id: &DeviceId) -> Result<Device, crate::Error>;

    /// All known devices
    async fn devices(&self) -> Result<Vec<Device>, crate::Error>;

    /// Whether the device is currently reachable
    async fn is_available(&self, device_id: &DeviceId) -> Result<bool, crate::Error>;

    /// Ports of the device
    async fn ports(&self, device_id: &DeviceId) -> Result<Vec<Port>, crate::Error>;
}

/// Link inventory queries
#[async_trait]
pub trait LinkService: Send + Sync {
    /// All known infrastructure links
    async fn links(&self) -> Result<Vec<Link>, crate::Error>;
}

/// Host inventory queries
#[async_trait]
pub trait HostService: Send + Sync {
    /// Look up a host by id
    async fn host(&self, host_id: &HostId) -> Result<Host, crate::Error>;

    /// All known hosts
    async fn hosts(&self) -> Result<Vec<Host>, crate::Error>;
}
