//! Topology view messages
//!
//! Turns network model events and client queries into the envelopes the
//! viewer client consumes.
//!
//! - [`envelope`]: wire wrapper, message kinds, log messages
//! - [`entity`]: instance/device/link/host notifications and the initial
//!   snapshot
//! - [`details`]: property sheets for a single device or host
//! - [`traffic`]: intent path overlays with link loads
//! - [`request`]: parsing and answering client requests

pub mod details;
pub mod entity;
pub mod envelope;
pub mod request;
pub mod traffic;

pub use details::{DetailRecord, DetailsPayload, Prop, SEPARATOR_KEY};
pub use entity::{
    DevicePayload, GeoLocation, HostConnectPoint, HostPayload, InstancePayload, LinkPayload,
};
pub use envelope::{
    EntityKind, Envelope, LogPayload, MessageKind, OutboundMessage, Severity, error, info, warning,
};
pub use request::{ClientRequest, DetailClass, TrafficClassRequest};
pub use traffic::{PathOverlay, PathPayload, TrafficClass, TrafficPayload};

use std::sync::Arc;

use crate::config::DisplayConfig;
use crate::directory::ServiceDirectory;
use crate::error::Result;
use crate::traits::{MetaUi, MetaUiStore};

/// Message factory for the topology view
///
/// Holds the service handles every translator queries and the meta-UI store,
/// which is the only state shared between handlers. Clones share both.
#[derive(Clone)]
pub struct TopologyViewMessages {
    services: ServiceDirectory,
    meta_ui: Arc<dyn MetaUiStore>,
    display: DisplayConfig,
}

impl TopologyViewMessages {
    pub fn new(services: ServiceDirectory, meta_ui: Arc<dyn MetaUiStore>) -> Self {
        Self {
            services,
            meta_ui,
            display: DisplayConfig::default(),
        }
    }

    /// Override display settings
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    pub fn services(&self) -> &ServiceDirectory {
        &self.services
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Store client metadata for an entity
    ///
    /// Replaces whatever was stored before; later messages about `id` carry
    /// the new document.
    pub async fn update_meta_ui(&self, id: &str, memento: MetaUi) -> Result<()> {
        tracing::debug!("Storing meta-UI for {}", id);
        self.meta_ui.put(id, memento).await
    }

    pub(crate) async fn meta_ui_for(&self, id: &str) -> Result<Option<MetaUi>> {
        self.meta_ui.get(id).await
    }
}

impl std::fmt::Debug for TopologyViewMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyViewMessages")
            .field("services", &self.services)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
