//! Client requests
//!
//! Requests arrive in the same envelope shape as outgoing messages:
//!
//! ```json
//! { "event": "requestDetails", "sid": 4, "payload": { "id": "of:1", "class": "device" } }
//! ```

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::TopologyViewMessages;
use super::envelope::OutboundMessage;
use super::traffic::TrafficClass;
use crate::error::{Error, Result};
use crate::model::{DeviceId, HostId, IntentId};
use crate::traits::MetaUi;

/// Which kind of entity a details request is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailClass {
    Device,
    Host,
}

/// A traffic class as requested by the client: intents by id only
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrafficClassRequest {
    pub label: String,
    #[serde(default)]
    pub intents: Vec<IntentId>,
}

/// A parsed client request
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    /// Store client metadata for an entity
    UpdateMeta { id: String, memento: MetaUi },
    /// Ask for the property sheet of a device or host
    RequestDetails {
        sid: i64,
        id: String,
        class: DetailClass,
    },
    /// Ask for the traffic overlay of some intents
    RequestTraffic {
        sid: i64,
        classes: Vec<TrafficClassRequest>,
    },
}

#[derive(Deserialize)]
struct RawRequest {
    event: String,
    #[serde(default)]
    sid: i64,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct UpdateMetaPayload {
    id: String,
    memento: Value,
}

#[derive(Deserialize)]
struct RequestDetailsPayload {
    id: String,
    class: DetailClass,
}

#[derive(Deserialize)]
struct RequestTrafficPayload {
    classes: Vec<TrafficClassRequest>,
}

fn payload<T: DeserializeOwned>(event: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| Error::invalid_input(format!("Malformed {} payload: {}", event, e)))
}

impl ClientRequest {
    /// Parse one request line
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| Error::invalid_input(format!("Request is not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Interpret an already decoded request
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawRequest = serde_json::from_value(value)
            .map_err(|e| Error::invalid_input(format!("Malformed request: {}", e)))?;

        match raw.event.as_str() {
            "updateMeta" => {
                let p: UpdateMetaPayload = payload(&raw.event, raw.payload)?;
                let Value::Object(memento) = p.memento else {
                    return Err(Error::invalid_input(format!(
                        "Meta-UI for {} must be a JSON object",
                        p.id
                    )));
                };
                Ok(Self::UpdateMeta { id: p.id, memento })
            }
            "requestDetails" => {
                let p: RequestDetailsPayload = payload(&raw.event, raw.payload)?;
                Ok(Self::RequestDetails {
                    sid: raw.sid,
                    id: p.id,
                    class: p.class,
                })
            }
            "requestTraffic" => {
                let p: RequestTrafficPayload = payload(&raw.event, raw.payload)?;
                Ok(Self::RequestTraffic {
                    sid: raw.sid,
                    classes: p.classes,
                })
            }
            other => Err(Error::invalid_input(format!("Unknown request: {}", other))),
        }
    }

    /// Request name as sent by the client
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateMeta { .. } => "updateMeta",
            Self::RequestDetails { .. } => "requestDetails",
            Self::RequestTraffic { .. } => "requestTraffic",
        }
    }

    /// Correlation id to answer with; zero when no answer is expected
    pub fn correlation_id(&self) -> i64 {
        match self {
            Self::UpdateMeta { .. } => 0,
            Self::RequestDetails { sid, .. } | Self::RequestTraffic { sid, .. } => *sid,
        }
    }
}

impl TopologyViewMessages {
    /// Look up requested intents by id
    ///
    /// Ids the intent service does not know are logged and left out.
    pub async fn resolve_traffic_classes(
        &self,
        requested: &[TrafficClassRequest],
    ) -> Result<Vec<TrafficClass>> {
        let intent_service = self.services().intent();
        let mut classes = Vec::with_capacity(requested.len());

        for class in requested {
            let mut intents = Vec::with_capacity(class.intents.len());
            for id in &class.intents {
                match intent_service.intent(id).await? {
                    Some(intent) => intents.push(intent),
                    None => tracing::warn!("Traffic class {}: unknown intent {}", class.label, id),
                }
            }
            classes.push(TrafficClass::new(class.label.clone(), intents));
        }

        Ok(classes)
    }

    /// Carry out a client request
    ///
    /// Returns the reply, if the request has one.
    pub async fn respond(&self, request: &ClientRequest) -> Result<Option<OutboundMessage>> {
        tracing::debug!("Handling {} request", request.name());
        match request {
            ClientRequest::UpdateMeta { id, memento } => {
                self.update_meta_ui(id, memento.clone()).await?;
                Ok(None)
            }
            ClientRequest::RequestDetails { sid, id, class } => {
                let envelope = match class {
                    DetailClass::Device => {
                        self.device_details(&DeviceId::new(id.as_str()), *sid).await?
                    }
                    DetailClass::Host => {
                        self.host_details(&HostId::new(id.as_str()), *sid).await?
                    }
                };
                Ok(Some(envelope.into_outbound()?))
            }
            ClientRequest::RequestTraffic { sid, classes } => {
                let classes = self.resolve_traffic_classes(classes).await?;
                Ok(Some(self.traffic_message(*sid, &classes).await?.into_outbound()?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_update_meta() {
        let request = ClientRequest::parse(
            r#"{"event":"updateMeta","payload":{"id":"of:1","memento":{"x":3}}}"#,
        )
        .unwrap();

        let ClientRequest::UpdateMeta { id, memento } = request else {
            panic!("expected updateMeta");
        };
        assert_eq!(id, "of:1");
        assert_eq!(memento.get("x"), Some(&json!(3)));
    }

    #[test]
    fn memento_must_be_an_object() {
        let err = ClientRequest::from_value(json!({
            "event": "updateMeta",
            "payload": { "id": "of:1", "memento": [1, 2] }
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn parses_details_and_traffic_with_sid() {
        let details = ClientRequest::from_value(json!({
            "event": "requestDetails",
            "sid": 9,
            "payload": { "id": "00:00:00:00:00:01/-1", "class": "host" }
        }))
        .unwrap();
        assert_eq!(details.correlation_id(), 9);
        assert!(matches!(
            details,
            ClientRequest::RequestDetails { class: DetailClass::Host, .. }
        ));

        let traffic = ClientRequest::from_value(json!({
            "event": "requestTraffic",
            "sid": 10,
            "payload": { "classes": [{ "label": "primary", "intents": [1, 2] }] }
        }))
        .unwrap();
        assert_eq!(
            traffic,
            ClientRequest::RequestTraffic {
                sid: 10,
                classes: vec![TrafficClassRequest {
                    label: "primary".into(),
                    intents: vec![IntentId(1), IntentId(2)],
                }],
            }
        );
    }

    #[test]
    fn rejects_unknown_and_malformed_requests() {
        for line in [
            r#"{"event":"shutdownEverything","payload":{}}"#,
            r#"{"event":"requestDetails","sid":1,"payload":{"id":"of:1","class":"link"}}"#,
            r#"{"sid":1}"#,
            "not json",
        ] {
            let err = ClientRequest::parse(line).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{}", line);
        }
    }
}
