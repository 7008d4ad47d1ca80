//! Wire envelope and message kinds
//!
//! Every message bound for the viewer client is wrapped as
//!
//! ```json
//! { "event": "addDevice", "sid": 7, "payload": { ... } }
//! ```
//!
//! `sid` correlates a response with the client request that caused it and is
//! left out entirely for broadcasts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::model::ChangeKind;

/// Name of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    AddInstance,
    RemoveInstance,
    UpdateInstance,
    AddDevice,
    RemoveDevice,
    UpdateDevice,
    AddLink,
    RemoveLink,
    UpdateLink,
    AddHost,
    RemoveHost,
    UpdateHost,
    ShowDetails,
    ShowTraffic,
    ShowPath,
    Message,
}

/// Entity families that get add/remove/update notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Instance,
    Device,
    Link,
    Host,
}

impl MessageKind {
    /// Message kind announcing a change to an entity
    pub fn for_change(entity: EntityKind, change: ChangeKind) -> Self {
        use ChangeKind::*;
        use EntityKind::*;

        match (entity, change) {
            (Instance, Added) => Self::AddInstance,
            (Instance, Removed) => Self::RemoveInstance,
            (Instance, Updated) => Self::UpdateInstance,
            (Device, Added) => Self::AddDevice,
            (Device, Removed) => Self::RemoveDevice,
            (Device, Updated) => Self::UpdateDevice,
            (Link, Added) => Self::AddLink,
            (Link, Removed) => Self::RemoveLink,
            (Link, Updated) => Self::UpdateLink,
            (Host, Added) => Self::AddHost,
            (Host, Removed) => Self::RemoveHost,
            (Host, Updated) => Self::UpdateHost,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddInstance => "addInstance",
            Self::RemoveInstance => "removeInstance",
            Self::UpdateInstance => "updateInstance",
            Self::AddDevice => "addDevice",
            Self::RemoveDevice => "removeDevice",
            Self::UpdateDevice => "updateDevice",
            Self::AddLink => "addLink",
            Self::RemoveLink => "removeLink",
            Self::UpdateLink => "updateLink",
            Self::AddHost => "addHost",
            Self::RemoveHost => "removeHost",
            Self::UpdateHost => "updateHost",
            Self::ShowDetails => "showDetails",
            Self::ShowTraffic => "showTraffic",
            Self::ShowPath => "showPath",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message bound for the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P = serde_json::Value> {
    #[serde(rename = "event")]
    pub kind: MessageKind,
    #[serde(rename = "sid", default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<u64>,
    pub payload: P,
}

/// Envelope with an already serialized payload, ready for the transport
pub type OutboundMessage = Envelope<serde_json::Value>;

impl<P> Envelope<P> {
    /// Wrap a payload
    ///
    /// A correlation id of zero or below means "not a response" and is
    /// dropped from the wire form.
    pub fn new(kind: MessageKind, correlation_id: i64, payload: P) -> Self {
        Self {
            kind,
            correlation_id: u64::try_from(correlation_id).ok().filter(|sid| *sid > 0),
            payload,
        }
    }

    /// Wrap a payload for all clients
    pub fn broadcast(kind: MessageKind, payload: P) -> Self {
        Self::new(kind, 0, payload)
    }

    pub fn is_broadcast(&self) -> bool {
        self.correlation_id.is_none()
    }
}

impl<P: Serialize> Envelope<P> {
    /// Serialize the payload, keeping kind and correlation id
    pub fn into_outbound(self) -> Result<OutboundMessage> {
        Ok(Envelope {
            kind: self.kind,
            correlation_id: self.correlation_id,
            payload: serde_json::to_value(self.payload)?,
        })
    }
}

/// Severity of a free-text log message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Payload of a `message` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    pub severity: Severity,
    pub message: String,
}

fn log_message(severity: Severity, sid: i64, message: impl Into<String>) -> Envelope<LogPayload> {
    Envelope::new(
        MessageKind::Message,
        sid,
        LogPayload {
            severity,
            message: message.into(),
        },
    )
}

/// Informational message for the client log
pub fn info(sid: i64, message: impl Into<String>) -> Envelope<LogPayload> {
    log_message(Severity::Info, sid, message)
}

/// Warning for the client log
pub fn warning(sid: i64, message: impl Into<String>) -> Envelope<LogPayload> {
    log_message(Severity::Warning, sid, message)
}

/// Error for the client log
pub fn error(sid: i64, message: impl Into<String>) -> Envelope<LogPayload> {
    log_message(Severity::Error, sid, message)
}
