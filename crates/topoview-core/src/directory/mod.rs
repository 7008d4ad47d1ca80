//! Service directory
//!
//! Bundles shared handles to every external network model service the
//! messaging layer queries, so translators take one dependency instead of
//! seven.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use topoview_core::ServiceDirectory;
//!
//! // One model implementing every service
//! let directory = ServiceDirectory::from_model(Arc::new(topology));
//!
//! // Swap a single collaborator, e.g. a live statistics backend
//! let directory = directory.with_statistic_service(Arc::new(stats));
//! ```

use std::sync::Arc;

use crate::traits::{
    ClusterService, DeviceService, HostService, IntentService, LinkService, MastershipService,
    StatisticService,
};

/// Shared handles to the network model services
///
/// Cloning is cheap; all clones point at the same services.
#[derive(Clone)]
pub struct ServiceDirectory {
    cluster: Arc<dyn ClusterService>,
    device: Arc<dyn DeviceService>,
    link: Arc<dyn LinkService>,
    host: Arc<dyn HostService>,
    mastership: Arc<dyn MastershipService>,
    intent: Arc<dyn IntentService>,
    statistic: Arc<dyn StatisticService>,
}

impl ServiceDirectory {
    /// Build a directory where one model answers for every service
    pub fn from_model<M>(model: Arc<M>) -> Self
    where
        M: ClusterService
            + DeviceService
            + LinkService
            + HostService
            + MastershipService
            + IntentService
            + StatisticService
            + 'static,
    {
        Self {
            cluster: model.clone(),
            device: model.clone(),
            link: model.clone(),
            host: model.clone(),
            mastership: model.clone(),
            intent: model.clone(),
            statistic: model,
        }
    }

    /// Replace the device service
    pub fn with_device_service(mut self, service: Arc<dyn DeviceService>) -> Self {
        self.device = service;
        self
    }

    /// Replace the host service
    pub fn with_host_service(mut self, service: Arc<dyn HostService>) -> Self {
        self.host = service;
        self
    }

    /// Replace the mastership service
    pub fn with_mastership_service(mut self, service: Arc<dyn MastershipService>) -> Self {
        self.mastership = service;
        self
    }

    /// Replace the intent service
    pub fn with_intent_service(mut self, service: Arc<dyn IntentService>) -> Self {
        self.intent = service;
        self
    }

    /// Replace the statistic service
    pub fn with_statistic_service(mut self, service: Arc<dyn StatisticService>) -> Self {
        self.statistic = service;
        self
    }

    pub fn cluster(&self) -> &dyn ClusterService {
        self.cluster.as_ref()
    }

    pub fn device(&self) -> &dyn DeviceService {
        self.device.as_ref()
    }

    pub fn link(&self) -> &dyn LinkService {
        self.link.as_ref()
    }

    pub fn host(&self) -> &dyn HostService {
        self.host.as_ref()
    }

    pub fn mastership(&self) -> &dyn MastershipService {
        self.mastership.as_ref()
    }

    pub fn intent(&self) -> &dyn IntentService {
        self.intent.as_ref()
    }

    pub fn statistic(&self) -> &dyn StatisticService {
        self.statistic.as_ref()
    }
}

impl std::fmt::Debug for ServiceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDirectory").finish_non_exhaustive()
    }
}
