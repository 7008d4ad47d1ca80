//! Core traits for the topology viewer
//!
//! This module defines the interfaces of the external collaborators the
//! messaging layer consumes, plus the one piece of state it owns.
//!
//! - [`ClusterService`], [`DeviceService`], [`LinkService`], [`HostService`],
//!   [`MastershipService`], [`IntentService`], [`StatisticService`]: read-only
//!   queries into the network model
//! - [`TopologyEventSource`]: stream of model change notifications
//! - [`MetaUiStore`]: client-authored display metadata keyed by entity id

pub mod cluster;
pub mod event_source;
pub mod intent;
pub mod inventory;
pub mod mastership;
pub mod meta_ui_store;
pub mod statistic;

pub use cluster::ClusterService;
pub use event_source::{EventStream, TopologyEventSource};
pub use intent::IntentService;
pub use inventory::{DeviceService, HostService, LinkService};
pub use mastership::MastershipService;
pub use meta_ui_store::{MetaUi, MetaUiStore};
pub use statistic::StatisticService;
