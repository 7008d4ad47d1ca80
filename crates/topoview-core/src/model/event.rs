// # Topology Events
//
// Change notifications raised by the network model services.
//
// An event only says *that* something changed; the canonical state may have
// moved on by the time it is handled, so translators re-query the services for
// status instead of trusting fields captured in the event.

use chrono::{DateTime, Utc};

use super::{ControllerNode, Device, Host, Link};

/// Coarse classification of an event type, driving message kind selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Updated,
}

/// Implemented by every per-entity event type enum
pub trait EventType: Copy + std::fmt::Debug {
    /// Map the concrete type onto added/removed/updated
    ///
    /// Anything that is neither an addition nor a removal is an update.
    fn change(self) -> ChangeKind;
}

/// A typed change notification about a subject
#[derive(Debug, Clone, PartialEq)]
pub struct Event<T, S> {
    pub event_type: T,
    pub subject: S,
    pub time: DateTime<Utc>,
}

impl<T: EventType, S> Event<T, S> {
    /// Create an event stamped with the current time
    pub fn new(event_type: T, subject: S) -> Self {
        Self {
            event_type,
            subject,
            time: Utc::now(),
        }
    }

    pub fn change(&self) -> ChangeKind {
        self.event_type.change()
    }
}

/// Cluster membership event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ClusterEventType {
    InstanceAdded,
    InstanceRemoved,
    InstanceActivated,
    InstanceDeactivated,
}

impl EventType for ClusterEventType {
    fn change(self) -> ChangeKind {
        match self {
            Self::InstanceAdded => ChangeKind::Added,
            Self::InstanceRemoved => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        }
    }
}

/// Device inventory event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeviceEventType {
    DeviceAdded,
    DeviceUpdated,
    DeviceRemoved,
    DeviceSuspended,
    DeviceAvailabilityChanged,
    DeviceMastershipChanged,
    PortAdded,
    PortUpdated,
    PortRemoved,
}

impl EventType for DeviceEventType {
    fn change(self) -> ChangeKind {
        match self {
            Self::DeviceAdded => ChangeKind::Added,
            Self::DeviceRemoved => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        }
    }
}

/// Link inventory event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LinkEventType {
    LinkAdded,
    LinkUpdated,
    LinkRemoved,
}

impl EventType for LinkEventType {
    fn change(self) -> ChangeKind {
        match self {
            Self::LinkAdded => ChangeKind::Added,
            Self::LinkRemoved => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        }
    }
}

/// Host inventory event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HostEventType {
    HostAdded,
    HostRemoved,
    HostUpdated,
    HostMoved,
}

impl EventType for HostEventType {
    fn change(self) -> ChangeKind {
        match self {
            Self::HostAdded => ChangeKind::Added,
            Self::HostRemoved => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        }
    }
}

pub type ClusterEvent = Event<ClusterEventType, ControllerNode>;
pub type DeviceEvent = Event<DeviceEventType, Device>;
pub type LinkEvent = Event<LinkEventType, Link>;
pub type HostEvent = Event<HostEventType, Host>;

/// Any event the topology viewer listens to
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    Cluster(ClusterEvent),
    Device(DeviceEvent),
    Link(LinkEvent),
    Host(HostEvent),
}

impl TopologyEvent {
    /// When the model raised the event
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Self::Cluster(e) => e.time,
            Self::Device(e) => e.time,
            Self::Link(e) => e.time,
            Self::Host(e) => e.time,
        }
    }
}

impl From<ClusterEvent> for TopologyEvent {
    fn from(event: ClusterEvent) -> Self {
        Self::Cluster(event)
    }
}

impl From<DeviceEvent> for TopologyEvent {
    fn from(event: DeviceEvent) -> Self {
        Self::Device(event)
    }
}

impl From<LinkEvent> for TopologyEvent {
    fn from(event: LinkEvent) -> Self {
        Self::Link(event)
    }
}

impl From<HostEvent> for TopologyEvent {
    fn from(event: HostEvent) -> Self {
        Self::Host(event)
    }
}
