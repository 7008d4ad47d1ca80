//! Entity notifications
//!
//! One message per instance/device/link/host event. Status fields are always
//! re-queried from the services: the event only says that something changed,
//! and the model may have moved on since it fired.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TopologyViewMessages;
use super::envelope::{EntityKind, Envelope, MessageKind, OutboundMessage};
use crate::error::Result;
use crate::model::{
    Annotations, ClusterEvent, ClusterEventType, DeviceEvent, DeviceEventType, DeviceId, Event,
    Host, HostEvent, HostEventType, Link, LinkEvent, LinkEventType, LinkState, NodeState,
    TopologyEvent,
};
use crate::traits::MetaUi;

pub(crate) const LATITUDE: &str = "latitude";
pub(crate) const LONGITUDE: &str = "longitude";
pub(crate) const NAME: &str = "name";

/// Host label used when no IP address is known
const UNKNOWN_IP: &str = "unknown";

/// Geographic position, serialized as `{"type": "latlng", "lat": .., "lng": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "latlng")]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePayload {
    pub id: String,
    pub online: bool,
    pub ui_attached: bool,
    /// `[nodeId, ip]`
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_ui: Option<MetaUi>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub online: bool,
    pub master: String,
    /// `[deviceId, chassisId, "", name]`
    pub labels: Vec<String>,
    pub props: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_ui: Option<MetaUi>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub online: bool,
    pub link_width: u32,
    pub src: String,
    pub src_port: String,
    pub dst: String,
    pub dst_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostConnectPoint {
    pub device: String,
    pub port: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPayload {
    pub id: String,
    /// Compact id of the host → network edge link
    pub ingress: String,
    /// Compact id of the network → host edge link
    pub egress: String,
    pub cp: HostConnectPoint,
    /// `[firstIp, mac]`
    pub labels: Vec<String>,
    pub props: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_ui: Option<MetaUi>,
}

/// Copy every annotation into a property map
pub(crate) fn props(annotations: &Annotations) -> BTreeMap<String, String> {
    annotations
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Location from the `latitude`/`longitude` annotations
///
/// Both must be present and parse as finite numbers. Anything else short of
/// "neither is set" is logged and yields no location.
pub(crate) fn geo_location(id: &str, annotations: &Annotations) -> Option<GeoLocation> {
    let lat = annotations.value(LATITUDE).filter(|v| !v.trim().is_empty());
    let lng = annotations.value(LONGITUDE).filter(|v| !v.trim().is_empty());

    match (lat, lng) {
        (None, None) => None,
        (Some(lat_text), Some(lng_text)) => {
            match (parse_coordinate(lat_text), parse_coordinate(lng_text)) {
                (Some(lat), Some(lng)) => Some(GeoLocation { lat, lng }),
                _ => {
                    tracing::warn!(
                        "Ignoring location of {}: invalid coordinates lat={:?} lng={:?}",
                        id,
                        lat_text,
                        lng_text
                    );
                    None
                }
            }
        }
        _ => {
            tracing::warn!(
                "Ignoring location of {}: latitude and longitude must both be set",
                id
            );
            None
        }
    }
}

fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn first_ip_label(host: &Host) -> String {
    host.ip_addresses
        .first()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

impl TopologyViewMessages {
    /// Notification for a cluster membership change
    pub async fn instance_message(
        &self,
        event: &ClusterEvent,
    ) -> Result<Envelope<InstancePayload>> {
        let node = &event.subject;
        let cluster = self.services().cluster();

        let local = cluster.local_node().await?;
        let online = cluster.state(&node.id).await? == NodeState::Active;

        let payload = InstancePayload {
            id: node.id.to_string(),
            online,
            ui_attached: node.id == local.id,
            labels: vec![node.id.to_string(), node.ip.to_string()],
            meta_ui: self.meta_ui_for(node.id.as_str()).await?,
        };

        let kind = MessageKind::for_change(EntityKind::Instance, event.change());
        Ok(Envelope::broadcast(kind, payload))
    }

    /// Notification for a device inventory change
    pub async fn device_message(&self, event: &DeviceEvent) -> Result<Envelope<DevicePayload>> {
        let device = &event.subject;
        let id = device.id.to_string();

        let online = self.services().device().is_available(&device.id).await?;
        let master = self.master(&device.id).await?;

        let payload = DevicePayload {
            device_type: device.device_type.as_str().to_string(),
            online,
            master,
            labels: vec![
                id.clone(),
                device.chassis_id.to_string(),
                String::new(),
                device.annotations.value(NAME).unwrap_or_default().to_string(),
            ],
            props: props(&device.annotations),
            location: geo_location(&id, &device.annotations),
            meta_ui: self.meta_ui_for(&id).await?,
            id,
        };

        let kind = MessageKind::for_change(EntityKind::Device, event.change());
        Ok(Envelope::broadcast(kind, payload))
    }

    /// Notification for an infrastructure link change
    pub async fn link_message(&self, event: &LinkEvent) -> Result<Envelope<LinkPayload>> {
        let link = &event.subject;
        let payload = self.link_payload(link);
        let kind = MessageKind::for_change(EntityKind::Link, event.change());
        Ok(Envelope::broadcast(kind, payload))
    }

    fn link_payload(&self, link: &Link) -> LinkPayload {
        LinkPayload {
            id: link.compact_id(),
            link_type: link.link_type.as_str().to_string(),
            online: link.state == LinkState::Active,
            link_width: self.display().link_width,
            src: link.src.element_id.to_string(),
            src_port: link.src.port.to_string(),
            dst: link.dst.element_id.to_string(),
            dst_port: link.dst.port.to_string(),
        }
    }

    /// Notification for an end-station change
    pub async fn host_message(&self, event: &HostEvent) -> Result<Envelope<HostPayload>> {
        let host = &event.subject;
        let id = host.id.to_string();

        let payload = HostPayload {
            ingress: Link::edge(host, true).compact_id(),
            egress: Link::edge(host, false).compact_id(),
            cp: HostConnectPoint {
                device: host.location.device_id.to_string(),
                port: host.location.port.to_u64(),
            },
            labels: vec![first_ip_label(host), host.mac.to_string()],
            props: props(&host.annotations),
            location: geo_location(&id, &host.annotations),
            meta_ui: self.meta_ui_for(&id).await?,
            id,
        };

        let kind = MessageKind::for_change(EntityKind::Host, event.change());
        Ok(Envelope::broadcast(kind, payload))
    }

    /// Translate any topology event into its wire message
    pub async fn event_message(&self, event: &TopologyEvent) -> Result<OutboundMessage> {
        tracing::debug!("Translating {:?}", event);
        match event {
            TopologyEvent::Cluster(e) => self.instance_message(e).await?.into_outbound(),
            TopologyEvent::Device(e) => self.device_message(e).await?.into_outbound(),
            TopologyEvent::Link(e) => self.link_message(e).await?.into_outbound(),
            TopologyEvent::Host(e) => self.host_message(e).await?.into_outbound(),
        }
    }

    /// `add*` messages describing the whole current topology
    ///
    /// Instances come first, then devices, links and hosts, so the client
    /// always knows both ends of a link before the link itself.
    pub async fn snapshot_messages(&self) -> Result<Vec<OutboundMessage>> {
        let services = self.services();
        let mut messages = Vec::new();

        for node in services.cluster().nodes().await? {
            let event = Event::new(ClusterEventType::InstanceAdded, node);
            messages.push(self.instance_message(&event).await?.into_outbound()?);
        }
        for device in services.device().devices().await? {
            let event = Event::new(DeviceEventType::DeviceAdded, device);
            messages.push(self.device_message(&event).await?.into_outbound()?);
        }
        for link in services.link().links().await? {
            let event = Event::new(LinkEventType::LinkAdded, link);
            messages.push(self.link_message(&event).await?.into_outbound()?);
        }
        for host in services.host().hosts().await? {
            let event = Event::new(HostEventType::HostAdded, host);
            messages.push(self.host_message(&event).await?.into_outbound()?);
        }

        tracing::debug!("Built {} snapshot message(s)", messages.len());
        Ok(messages)
    }

    /// Master of a device as shown to the user, empty when unassigned
    pub(crate) async fn master(&self, device_id: &DeviceId) -> Result<String> {
        Ok(self
            .services()
            .mastership()
            .master_for(device_id)
            .await?
            .map(|node| node.to_string())
            .unwrap_or_default())
    }
}
