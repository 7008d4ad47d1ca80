//! Network model types consumed by the messaging layer
//!
//! These are read-only views of what the external model services report:
//! controller instances, devices, ports, links, hosts, paths and load samples.
//! The messaging layer never mutates them; it only shapes them into payloads.

pub mod event;
pub mod intent;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

pub use event::{
    ChangeKind, ClusterEvent, ClusterEventType, DeviceEvent, DeviceEventType, Event, EventType,
    HostEvent, HostEventType, LinkEvent, LinkEventType, TopologyEvent,
};
pub use intent::{InstallableIntent, Intent, IntentId, IntentKind, LinkSequence};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from its string form
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Controller cluster member identifier
    NodeId
);
string_id!(
    /// Infrastructure device identifier, e.g. `of:0000000000000001`
    DeviceId
);
string_id!(
    /// End-station identifier in `mac/vlan` form
    HostId
);
string_id!(
    /// Identifier of either a device or a host, used as a link endpoint
    ElementId
);
string_id!(
    /// Ethernet MAC address in colon notation
    MacAddress
);

impl HostId {
    /// Build a host id from its MAC address and VLAN
    pub fn from_mac_vlan(mac: &MacAddress, vlan: VlanId) -> Self {
        Self(format!("{}/{}", mac, vlan))
    }
}

impl From<DeviceId> for ElementId {
    fn from(id: DeviceId) -> Self {
        Self(id.0)
    }
}

impl From<HostId> for ElementId {
    fn from(id: HostId) -> Self {
        Self(id.0)
    }
}

/// VLAN tag; `-1` means untagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VlanId(pub i16);

impl VlanId {
    /// Untagged traffic
    pub const NONE: VlanId = VlanId(-1);
}

impl Default for VlanId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port number on a device or host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(pub u64);

impl PortNumber {
    /// Port `0`, the implicit port of a host NIC
    pub const ZERO: PortNumber = PortNumber(0);

    /// The numeric value
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device chassis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChassisId(pub u64);

impl fmt::Display for ChassisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// An element/port pair terminating a link
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectPoint {
    pub element_id: ElementId,
    pub port: PortNumber,
}

impl ConnectPoint {
    pub fn new(element_id: impl Into<ElementId>, port: PortNumber) -> Self {
        Self {
            element_id: element_id.into(),
            port,
        }
    }

    /// Connect point on an infrastructure device
    pub fn device(device_id: &DeviceId, port: u64) -> Self {
        Self::new(device_id.clone(), PortNumber(port))
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_id, self.port)
    }
}

/// Free-form key/value annotations attached to an entity
///
/// Iteration is sorted by key, which keeps payloads deterministic; key order
/// carries no meaning for the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Value of the given annotation, if set
    pub fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Membership state of a controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Active,
    #[default]
    Inactive,
}

/// A controller cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerNode {
    pub id: NodeId,
    pub ip: IpAddr,
}

impl ControllerNode {
    pub fn new(id: impl Into<NodeId>, ip: IpAddr) -> Self {
        Self { id: id.into(), ip }
    }
}

/// Kind of infrastructure device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Switch,
    Router,
    Roadm,
    Firewall,
    Balancer,
    Controller,
    Other,
}

impl DeviceType {
    /// Lowercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Switch => "switch",
            DeviceType::Router => "router",
            DeviceType::Roadm => "roadm",
            DeviceType::Firewall => "firewall",
            DeviceType::Balancer => "balancer",
            DeviceType::Controller => "controller",
            DeviceType::Other => "other",
        }
    }
}

/// An infrastructure device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(rename = "type", default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub hw_version: String,
    #[serde(default)]
    pub sw_version: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub chassis_id: ChassisId,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Device {
    /// A switch with empty descriptive fields
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            device_type: DeviceType::Switch,
            manufacturer: String::new(),
            hw_version: String::new(),
            sw_version: String::new(),
            serial_number: String::new(),
            chassis_id: ChassisId::default(),
            annotations: Annotations::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// A device port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: PortNumber,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Kind of infrastructure link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Direct,
    Indirect,
    Edge,
    Tunnel,
    Optical,
}

impl LinkType {
    /// Lowercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Direct => "direct",
            LinkType::Indirect => "indirect",
            LinkType::Edge => "edge",
            LinkType::Tunnel => "tunnel",
            LinkType::Optical => "optical",
        }
    }
}

/// Operational state of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    #[default]
    Active,
    Inactive,
}

/// A unidirectional link between two connect points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    #[serde(rename = "type", default)]
    pub link_type: LinkType,
    #[serde(default)]
    pub state: LinkState,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Link {
    /// An active direct link
    pub fn new(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self {
            src,
            dst,
            link_type: LinkType::Direct,
            state: LinkState::Active,
            annotations: Annotations::new(),
        }
    }

    /// The edge link between a host NIC (port 0) and its attachment point
    ///
    /// Ingress runs host → network, egress network → host.
    pub fn edge(host: &Host, ingress: bool) -> Self {
        let host_point = ConnectPoint::new(host.id.clone(), PortNumber::ZERO);
        let location = host.location.connect_point();
        let (src, dst) = if ingress {
            (host_point, location)
        } else {
            (location, host_point)
        };
        Self {
            link_type: LinkType::Edge,
            ..Self::new(src, dst)
        }
    }

    /// Compact `src/srcPort-dst/dstPort` form used as the link id on the wire
    pub fn compact_id(&self) -> String {
        format!("{}-{}", self.src, self.dst)
    }
}

/// Where a host attaches to the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLocation {
    pub device_id: DeviceId,
    pub port: PortNumber,
}

impl HostLocation {
    pub fn new(device_id: impl Into<DeviceId>, port: u64) -> Self {
        Self {
            device_id: device_id.into(),
            port: PortNumber(port),
        }
    }

    pub fn connect_point(&self) -> ConnectPoint {
        ConnectPoint::new(self.device_id.clone(), self.port)
    }
}

/// An end-station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub mac: MacAddress,
    #[serde(default)]
    pub vlan: VlanId,
    pub location: HostLocation,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddr>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Host {
    /// An untagged host with id derived from its MAC
    pub fn new(mac: impl Into<MacAddress>, location: HostLocation) -> Self {
        let mac = mac.into();
        Self {
            id: HostId::from_mac_vlan(&mac, VlanId::NONE),
            mac,
            vlan: VlanId::NONE,
            location,
            ip_addresses: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip_addresses.push(ip);
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// An ordered sequence of links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub links: Vec<Link>,
    #[serde(default)]
    pub cost: f64,
}

impl Path {
    pub fn new(links: Vec<Link>) -> Self {
        let cost = links.len() as f64;
        Self { links, cost }
    }
}

/// A link load sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Load {
    /// Rate in bytes per second
    pub rate: u64,
    /// Latest raw counter value
    #[serde(default)]
    pub latest: u64,
}

impl Load {
    pub fn new(rate: u64, latest: u64) -> Self {
        Self { rate, latest }
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Load{{rate={}, latest={}}}", self.rate, self.latest)
    }
}
