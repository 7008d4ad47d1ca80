//! Property sheets for a single device or host
//!
//! The client renders the rows positionally, so every row is always present;
//! a value the model does not know is an empty string.

use serde::Serialize;
use std::collections::BTreeMap;

use super::TopologyViewMessages;
use super::entity::{LATITUDE, LONGITUDE, NAME};
use super::envelope::{Envelope, MessageKind};
use crate::error::Result;
use crate::model::{Annotations, DeviceId, HostId};

/// Key of a row that only draws a separator line
pub const SEPARATOR_KEY: &str = "-";

/// One row of a property sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    pub key: String,
    pub value: String,
}

impl Prop {
    pub fn is_separator(&self) -> bool {
        self.key == SEPARATOR_KEY
    }
}

/// Ordered property sheet
///
/// Rows keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    props: Vec<Prop>,
}

impl DetailRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push(Prop {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Append a separator row
    pub fn separator(self) -> Self {
        self.prop(SEPARATOR_KEY, "")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Wire form: row order goes into `propOrder`, values into `props`
    pub fn into_payload(self, id: impl Into<String>, kind: impl Into<String>) -> DetailsPayload {
        let mut prop_order = Vec::with_capacity(self.props.len());
        let mut props = BTreeMap::new();
        for Prop { key, value } in self.props {
            prop_order.push(key.clone());
            props.insert(key, value);
        }
        DetailsPayload {
            id: id.into(),
            kind: kind.into(),
            prop_order,
            props,
        }
    }
}

/// Payload of a `showDetails` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub prop_order: Vec<String>,
    pub props: BTreeMap<String, String>,
}

fn annotation(annotations: &Annotations, key: &str) -> String {
    annotations.value(key).unwrap_or_default().to_string()
}

/// Render an IP set as `[a, b]`
fn ip_list<T: std::fmt::Display>(ips: &[T]) -> String {
    let ips: Vec<String> = ips.iter().map(ToString::to_string).collect();
    format!("[{}]", ips.join(", "))
}

impl TopologyViewMessages {
    /// Property sheet for a device, in reply to request `sid`
    pub async fn device_details(
        &self,
        device_id: &DeviceId,
        sid: i64,
    ) -> Result<Envelope<DetailsPayload>> {
        let services = self.services();
        let device = services.device().device(device_id).await?;
        let ports = services.device().ports(device_id).await?;
        let master = self.master(device_id).await?;

        let annotations = &device.annotations;
        let record = DetailRecord::new()
            .prop("Name", annotation(annotations, NAME))
            .prop("Vendor", device.manufacturer.as_str())
            .prop("H/W Version", device.hw_version.as_str())
            .prop("S/W Version", device.sw_version.as_str())
            .prop("Serial Number", device.serial_number.as_str())
            .separator()
            .prop("Latitude", annotation(annotations, LATITUDE))
            .prop("Longitude", annotation(annotations, LONGITUDE))
            .prop("Ports", ports.len().to_string())
            .separator()
            .prop("Master", master);

        let payload = record.into_payload(device.id.as_str(), device.device_type.as_str());
        Ok(Envelope::new(MessageKind::ShowDetails, sid, payload))
    }

    /// Property sheet for a host, in reply to request `sid`
    pub async fn host_details(
        &self,
        host_id: &HostId,
        sid: i64,
    ) -> Result<Envelope<DetailsPayload>> {
        let host = self.services().host().host(host_id).await?;

        let annotations = &host.annotations;
        let record = DetailRecord::new()
            .prop("MAC", host.mac.as_str())
            .prop("IP", ip_list(&host.ip_addresses))
            .separator()
            .prop("Latitude", annotation(annotations, LATITUDE))
            .prop("Longitude", annotation(annotations, LONGITUDE));

        let payload = record.into_payload(host.id.as_str(), "host");
        Ok(Envelope::new(MessageKind::ShowDetails, sid, payload))
    }
}
