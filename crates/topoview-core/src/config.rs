//! Configuration types for the topology viewer
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::model::{ConnectPoint, DeviceId, PortNumber};

/// Main topology viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Rendering hints sent to the client
    #[serde(default)]
    pub display: DisplayConfig,
}

impl ViewConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.engine.validate()?;
        self.display.validate()?;
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the outbound message channel
    ///
    /// When full, live messages are dropped (with a warning log) instead of
    /// stalling event handling behind a slow client. The initial snapshot
    /// waits for room instead.
    ///
    /// Default: 1000 messages
    #[serde(default = "default_outbound_channel_capacity")]
    pub outbound_channel_capacity: usize,

    /// Send `add*` messages for the whole topology when the engine starts
    #[serde(default = "default_send_initial_snapshot")]
    pub send_initial_snapshot: bool,

    /// Stop the engine once the client request stream ends
    ///
    /// Queries still in flight are answered before the engine returns.
    #[serde(default)]
    pub stop_on_request_end: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.outbound_channel_capacity == 0 {
            return Err(crate::Error::config(
                "Outbound channel capacity must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outbound_channel_capacity: default_outbound_channel_capacity(),
            send_initial_snapshot: default_send_initial_snapshot(),
            stop_on_request_end: false,
        }
    }
}

fn default_outbound_channel_capacity() -> usize {
    1000
}

fn default_send_initial_snapshot() -> bool {
    true
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Stroke width the client draws links with
    #[serde(default = "default_link_width")]
    pub link_width: u32,
}

impl DisplayConfig {
    /// Validate the display configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.link_width == 0 {
            return Err(crate::Error::config("Link width must be > 0"));
        }
        Ok(())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            link_width: default_link_width(),
        }
    }
}

fn default_link_width() -> u32 {
    2
}

/// An IP address bound to a switch port
///
/// Read from configuration records of the form
///
/// ```json
/// { "interfaceDpid": "00:00:00:00:00:00:00:01", "interfacePort": 1, "ipAddress": "10.0.0.1" }
/// ```
///
/// The datapath id becomes the device id `of:0000000000000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "InterfaceAddressRecord")]
pub struct InterfaceAddress {
    connect_point: ConnectPoint,
    ip_address: IpAddr,
}

impl InterfaceAddress {
    pub fn new(connect_point: ConnectPoint, ip_address: IpAddr) -> Self {
        Self {
            connect_point,
            ip_address,
        }
    }

    pub fn connect_point(&self) -> &ConnectPoint {
        &self.connect_point
    }

    pub fn ip_address(&self) -> IpAddr {
        self.ip_address
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterfaceAddressRecord {
    interface_dpid: String,
    interface_port: u64,
    ip_address: IpAddr,
}

impl TryFrom<InterfaceAddressRecord> for InterfaceAddress {
    type Error = crate::Error;

    fn try_from(record: InterfaceAddressRecord) -> Result<Self, Self::Error> {
        let dpid: String = record
            .interface_dpid
            .chars()
            .filter(|c| *c != ':')
            .collect();
        if dpid.is_empty() || !dpid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::Error::config(format!(
                "Invalid interface dpid: {:?}",
                record.interface_dpid
            )));
        }

        let device_id = DeviceId::new(format!("of:{}", dpid.to_ascii_lowercase()));
        Ok(Self::new(
            ConnectPoint::new(device_id, PortNumber(record.interface_port)),
            record.ip_address,
        ))
    }
}
