// # Memory Topology
//
// In-memory network model implementing every service trait the viewer
// consumes.
//
// ## Purpose
//
// Stands in for the real network model services: the daemon serves a
// topology loaded from a snapshot file, and tests drive the viewer by
// mutating the model and watching the resulting messages.
//
// Every mutation publishes the matching `TopologyEvent` to subscribers
// obtained through `TopologyEventSource::watch()`.
//
// ## Snapshot Format
//
// ```json
// {
//   "version": "1.0",
//   "local_node": "node-1",
//   "nodes": [{ "node": { "id": "node-1", "ip": "10.0.0.1" }, "state": "active" }],
//   "devices": [{ "device": { "id": "of:0000000000000001" }, "master": "node-1" }],
//   "links": [],
//   "hosts": [],
//   "intents": [],
//   "loads": []
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{RwLock, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::Error;
use crate::model::{
    ClusterEventType, ConnectPoint, ControllerNode, Device, DeviceEventType, DeviceId, Event,
    Host, HostEventType, HostId, InstallableIntent, Intent, IntentId, Link, LinkEventType, Load,
    NodeId, NodeState, Port, TopologyEvent,
};
use crate::traits::{
    ClusterService, DeviceService, EventStream, HostService, IntentService, LinkService,
    MastershipService, StatisticService, TopologyEventSource,
};

/// Snapshot file format version
const SNAPSHOT_VERSION: &str = "1.0";

/// Buffered events per subscriber before it starts lagging
const EVENT_BUFFER: usize = 1024;

type LinkKey = (ConnectPoint, ConnectPoint);

/// A cluster member and its membership state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node: ControllerNode,
    #[serde(default)]
    pub state: NodeState,
}

/// A device with its availability, ports and current master
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: Device,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub master: Option<NodeId>,
}

fn default_available() -> bool {
    true
}

/// A submitted intent and its installed realizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent: Intent,
    #[serde(default)]
    pub installables: Vec<InstallableIntent>,
}

/// A load sample for the link between two connect points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLoad {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    pub load: Load,
}

/// Serializable topology snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default = "default_version")]
    pub version: String,
    pub local_node: NodeId,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub intents: Vec<IntentRecord>,
    #[serde(default)]
    pub loads: Vec<LinkLoad>,
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// Internal model, keyed for ordered iteration
#[derive(Debug, Default)]
struct TopologyModel {
    local_node: NodeId,
    nodes: BTreeMap<NodeId, NodeRecord>,
    devices: BTreeMap<DeviceId, DeviceRecord>,
    links: BTreeMap<LinkKey, Link>,
    hosts: BTreeMap<HostId, Host>,
    intents: BTreeMap<IntentId, IntentRecord>,
    loads: BTreeMap<LinkKey, Load>,
}

fn link_key(link: &Link) -> LinkKey {
    (link.src.clone(), link.dst.clone())
}

/// In-memory network model
///
/// Clones share the same model and the same event channel.
///
/// # Example
///
/// ```rust,no_run
/// use topoview_core::model::{ControllerNode, Device};
/// use topoview_core::state::MemoryTopology;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let topology = MemoryTopology::new(ControllerNode::new("node-1", "10.0.0.1".parse()?));
///     topology.add_device(Device::new("of:0000000000000001"), Vec::new()).await;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTopology {
    model: Arc<RwLock<TopologyModel>>,
    events: broadcast::Sender<TopologyEvent>,
}

impl MemoryTopology {
    /// Create a topology containing only the local, active node
    pub fn new(local_node: ControllerNode) -> Self {
        let mut model = TopologyModel {
            local_node: local_node.id.clone(),
            ..TopologyModel::default()
        };
        model.nodes.insert(
            local_node.id.clone(),
            NodeRecord {
                node: local_node,
                state: NodeState::Active,
            },
        );
        Self::with_model(model)
    }

    fn with_model(model: TopologyModel) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            model: Arc::new(RwLock::new(model)),
            events,
        }
    }

    /// Build a topology from a snapshot
    ///
    /// The snapshot's local node must be one of its nodes.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Result<Self, Error> {
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot version mismatch: expected {}, got {}. Attempting to load anyway.",
                SNAPSHOT_VERSION,
                snapshot.version
            );
        }

        if !snapshot.nodes.iter().any(|r| r.node.id == snapshot.local_node) {
            return Err(Error::config(format!(
                "Local node {} is not listed in the snapshot nodes",
                snapshot.local_node
            )));
        }

        let model = TopologyModel {
            local_node: snapshot.local_node,
            nodes: snapshot
                .nodes
                .into_iter()
                .map(|r| (r.node.id.clone(), r))
                .collect(),
            devices: snapshot
                .devices
                .into_iter()
                .map(|r| (r.device.id.clone(), r))
                .collect(),
            links: snapshot.links.into_iter().map(|l| (link_key(&l), l)).collect(),
            hosts: snapshot.hosts.into_iter().map(|h| (h.id.clone(), h)).collect(),
            intents: snapshot
                .intents
                .into_iter()
                .map(|r| (r.intent.id, r))
                .collect(),
            loads: snapshot
                .loads
                .into_iter()
                .map(|l| ((l.src, l.dst), l.load))
                .collect(),
        };

        Ok(Self::with_model(model))
    }

    /// Load a topology from a snapshot file
    pub async fn load<P: AsRef<FsPath>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        let snapshot: TopologySnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded snapshot from {}: {} device(s), {} link(s), {} host(s)",
            path.display(),
            snapshot.devices.len(),
            snapshot.links.len(),
            snapshot.hosts.len()
        );

        Self::from_snapshot(snapshot)
    }

    fn publish(&self, event: impl Into<TopologyEvent>) {
        // No subscribers is fine; nobody is looking yet
        let _ = self.events.send(event.into());
    }

    /// Add a cluster member, or change the state of a known one
    pub async fn add_node(&self, node: ControllerNode, state: NodeState) {
        let existed = {
            let mut model = self.model.write().await;
            model
                .nodes
                .insert(node.id.clone(), NodeRecord { node: node.clone(), state })
                .is_some()
        };

        let event_type = match (existed, state) {
            (false, _) => ClusterEventType::InstanceAdded,
            (true, NodeState::Active) => ClusterEventType::InstanceActivated,
            (true, NodeState::Inactive) => ClusterEventType::InstanceDeactivated,
        };
        self.publish(Event::new(event_type, node));
    }

    /// Remove a cluster member
    pub async fn remove_node(&self, node_id: &NodeId) -> Result<(), Error> {
        let record = self
            .model
            .write()
            .await
            .nodes
            .remove(node_id)
            .ok_or_else(|| Error::not_found(format!("Node {}", node_id)))?;

        self.publish(Event::new(ClusterEventType::InstanceRemoved, record.node));
        Ok(())
    }

    /// Add an available device, or replace the description of a known one
    pub async fn add_device(&self, device: Device, ports: Vec<Port>) {
        let existed = {
            let mut model = self.model.write().await;
            let master = model
                .devices
                .get(&device.id)
                .and_then(|r| r.master.clone());
            model
                .devices
                .insert(
                    device.id.clone(),
                    DeviceRecord {
                        device: device.clone(),
                        available: true,
                        ports,
                        master,
                    },
                )
                .is_some()
        };

        let event_type = if existed {
            DeviceEventType::DeviceUpdated
        } else {
            DeviceEventType::DeviceAdded
        };
        self.publish(Event::new(event_type, device));
    }

    /// Mark a device reachable or unreachable
    pub async fn set_device_available(
        &self,
        device_id: &DeviceId,
        available: bool,
    ) -> Result<(), Error> {
        let device = self
            .update_device(device_id, |record| record.available = available)
            .await?;
        self.publish(Event::new(
            DeviceEventType::DeviceAvailabilityChanged,
            device,
        ));
        Ok(())
    }

    /// Assign or clear the master of a device
    pub async fn set_master(
        &self,
        device_id: &DeviceId,
        master: Option<NodeId>,
    ) -> Result<(), Error> {
        let device = self
            .update_device(device_id, |record| record.master = master)
            .await?;
        self.publish(Event::new(
            DeviceEventType::DeviceMastershipChanged,
            device,
        ));
        Ok(())
    }

    async fn update_device(
        &self,
        device_id: &DeviceId,
        apply: impl FnOnce(&mut DeviceRecord),
    ) -> Result<Device, Error> {
        let mut model = self.model.write().await;
        let record = model
            .devices
            .get_mut(device_id)
            .ok_or_else(|| Error::not_found(format!("Device {}", device_id)))?;
        apply(record);
        Ok(record.device.clone())
    }

    /// Remove a device
    pub async fn remove_device(&self, device_id: &DeviceId) -> Result<(), Error> {
        let record = self
            .model
            .write()
            .await
            .devices
            .remove(device_id)
            .ok_or_else(|| Error::not_found(format!("Device {}", device_id)))?;

        self.publish(Event::new(DeviceEventType::DeviceRemoved, record.device));
        Ok(())
    }

    /// Add a link, or replace a known one
    pub async fn add_link(&self, link: Link) {
        let existed = self
            .model
            .write()
            .await
            .links
            .insert(link_key(&link), link.clone())
            .is_some();

        let event_type = if existed {
            LinkEventType::LinkUpdated
        } else {
            LinkEventType::LinkAdded
        };
        self.publish(Event::new(event_type, link));
    }

    /// Remove the link between two connect points
    pub async fn remove_link(&self, src: &ConnectPoint, dst: &ConnectPoint) -> Result<(), Error> {
        let link = {
            let mut model = self.model.write().await;
            let key = (src.clone(), dst.clone());
            model.loads.remove(&key);
            model
                .links
                .remove(&key)
                .ok_or_else(|| Error::not_found(format!("Link {}-{}", src, dst)))?
        };

        self.publish(Event::new(LinkEventType::LinkRemoved, link));
        Ok(())
    }

    /// Add a host, or replace a known one
    ///
    /// A known host reported at a new location is a move.
    pub async fn add_host(&self, host: Host) {
        let previous = self
            .model
            .write()
            .await
            .hosts
            .insert(host.id.clone(), host.clone());

        let event_type = match previous {
            None => HostEventType::HostAdded,
            Some(old) if old.location != host.location => HostEventType::HostMoved,
            Some(_) => HostEventType::HostUpdated,
        };
        self.publish(Event::new(event_type, host));
    }

    /// Remove a host
    pub async fn remove_host(&self, host_id: &HostId) -> Result<(), Error> {
        let host = self
            .model
            .write()
            .await
            .hosts
            .remove(host_id)
            .ok_or_else(|| Error::not_found(format!("Host {}", host_id)))?;

        self.publish(Event::new(HostEventType::HostRemoved, host));
        Ok(())
    }

    /// Submit an intent together with its installed realizations
    pub async fn add_intent(&self, intent: Intent, installables: Vec<InstallableIntent>) {
        self.model.write().await.intents.insert(
            intent.id,
            IntentRecord {
                intent,
                installables,
            },
        );
    }

    /// Record the latest load sample for a link
    pub async fn set_load(&self, link: &Link, load: Load) {
        self.model.write().await.loads.insert(link_key(link), load);
    }
}

#[async_trait]
impl ClusterService for MemoryTopology {
    async fn local_node(&self) -> Result<ControllerNode, Error> {
        let model = self.model.read().await;
        model
            .nodes
            .get(&model.local_node)
            .map(|r| r.node.clone())
            .ok_or_else(|| Error::not_found(format!("Local node {}", model.local_node)))
    }

    async fn nodes(&self) -> Result<Vec<ControllerNode>, Error> {
        let model = self.model.read().await;
        Ok(model.nodes.values().map(|r| r.node.clone()).collect())
    }

    async fn state(&self, node_id: &NodeId) -> Result<NodeState, Error> {
        let model = self.model.read().await;
        Ok(model
            .nodes
            .get(node_id)
            .map(|r| r.state)
            .unwrap_or(NodeState::Inactive))
    }
}

#[async_trait]
impl DeviceService for MemoryTopology {
    async fn device(&self, device_id: &DeviceId) -> Result<Device, Error> {
        let model = self.model.read().await;
        model
            .devices
            .get(device_id)
            .map(|r| r.device.clone())
            .ok_or_else(|| Error::not_found(format!("Device {}", device_id)))
    }

    async fn devices(&self) -> Result<Vec<Device>, Error> {
        let model = self.model.read().await;
        Ok(model.devices.values().map(|r| r.device.clone()).collect())
    }

    async fn is_available(&self, device_id: &DeviceId) -> Result<bool, Error> {
        // Removed devices are simply unavailable
        let model = self.model.read().await;
        Ok(model.devices.get(device_id).is_some_and(|r| r.available))
    }

    async fn ports(&self, device_id: &DeviceId) -> Result<Vec<Port>, Error> {
        let model = self.model.read().await;
        model
            .devices
            .get(device_id)
            .map(|r| r.ports.clone())
            .ok_or_else(|| Error::not_found(format!("Device {}", device_id)))
    }
}

#[async_trait]
impl LinkService for MemoryTopology {
    async fn links(&self) -> Result<Vec<Link>, Error> {
        let model = self.model.read().await;
        Ok(model.links.values().cloned().collect())
    }
}

#[async_trait]
impl HostService for MemoryTopology {
    async fn host(&self, host_id: &HostId) -> Result<Host, Error> {
        let model = self.model.read().await;
        model
            .hosts
            .get(host_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Host {}", host_id)))
    }

    async fn hosts(&self) -> Result<Vec<Host>, Error> {
        let model = self.model.read().await;
        Ok(model.hosts.values().cloned().collect())
    }
}

#[async_trait]
impl MastershipService for MemoryTopology {
    async fn master_for(&self, device_id: &DeviceId) -> Result<Option<NodeId>, Error> {
        let model = self.model.read().await;
        Ok(model.devices.get(device_id).and_then(|r| r.master.clone()))
    }
}

#[async_trait]
impl IntentService for MemoryTopology {
    async fn intent(&self, intent_id: &IntentId) -> Result<Option<Intent>, Error> {
        let model = self.model.read().await;
        Ok(model.intents.get(intent_id).map(|r| r.intent.clone()))
    }

    async fn installable_intents(
        &self,
        intent_id: &IntentId,
    ) -> Result<Vec<InstallableIntent>, Error> {
        let model = self.model.read().await;
        Ok(model
            .intents
            .get(intent_id)
            .map(|r| r.installables.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl StatisticService for MemoryTopology {
    async fn load(&self, link: &Link) -> Result<Option<Load>, Error> {
        let model = self.model.read().await;
        Ok(model.loads.get(&link_key(link)).copied())
    }
}

impl TopologyEventSource for MemoryTopology {
    fn watch(&self) -> EventStream {
        let stream = BroadcastStream::new(self.events.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Topology subscriber lagged, {} event(s) skipped", skipped);
                None
            }
        });
        Box::pin(stream)
    }
}
