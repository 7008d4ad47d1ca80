//! Intent path overlays
//!
//! Every installed realization of a requested intent becomes one overlay
//! entry: its links in order, and for each link the current load text when
//! the link carries traffic. Realizations come in several shapes; the
//! aggregator only ever sees them through [`LinkSequence`].

use serde::Serialize;

use super::TopologyViewMessages;
use super::envelope::{Envelope, MessageKind};
use crate::error::Result;
use crate::model::{Intent, LinkSequence, Path};

/// Appended to the class of paths owned by an optical intent
const OPTICAL_SUFFIX: &str = " optical";

/// Appended to the class of paths currently carrying traffic
const ANIMATED_SUFFIX: &str = " animated";

/// A named group of intents drawn with a shared style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficClass {
    pub label: String,
    pub intents: Vec<Intent>,
}

impl TrafficClass {
    pub fn new(label: impl Into<String>, intents: Vec<Intent>) -> Self {
        Self {
            label: label.into(),
            intents,
        }
    }
}

/// One drawn path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathOverlay {
    pub class: String,
    /// Whether any link on the path reports a positive rate
    pub traffic: bool,
    /// Compact link ids, in path order
    pub links: Vec<String>,
    /// Load text per link, empty for idle links
    pub labels: Vec<String>,
}

/// Payload of a `showTraffic` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficPayload {
    pub paths: Vec<PathOverlay>,
}

/// Payload of a `showPath` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathPayload {
    #[serde(rename = "type")]
    pub class: String,
    pub links: Vec<String>,
}

impl TopologyViewMessages {
    /// Traffic overlay for the given classes, in reply to request `sid`
    ///
    /// Entries follow class order, then intent order within a class, then
    /// realization order. Intents without installed realizations contribute
    /// nothing.
    pub async fn traffic_message(
        &self,
        sid: i64,
        classes: &[TrafficClass],
    ) -> Result<Envelope<TrafficPayload>> {
        let intent_service = self.services().intent();
        let mut paths = Vec::new();

        for class in classes {
            for intent in &class.intents {
                let installables = intent_service.installable_intents(&intent.id).await?;
                if installables.is_empty() {
                    tracing::debug!("Intent {} has no installed paths", intent.id);
                    continue;
                }

                let label = if intent.is_optical() {
                    format!("{}{}", class.label, OPTICAL_SUFFIX)
                } else {
                    class.label.clone()
                };

                for installable in &installables {
                    paths.push(self.path_overlay(&label, installable).await?);
                }
            }
        }

        Ok(Envelope::new(
            MessageKind::ShowTraffic,
            sid,
            TrafficPayload { paths },
        ))
    }

    async fn path_overlay<S>(&self, class: &str, sequence: &S) -> Result<PathOverlay>
    where
        S: LinkSequence + Sync + ?Sized,
    {
        let statistics = self.services().statistic();
        let links = sequence.links();

        let mut traffic = false;
        let mut ids = Vec::with_capacity(links.len());
        let mut labels = Vec::with_capacity(links.len());

        for link in links {
            ids.push(link.compact_id());
            match statistics.load(link).await? {
                Some(load) if load.rate > 0 => {
                    traffic = true;
                    labels.push(load.to_string());
                }
                _ => labels.push(String::new()),
            }
        }

        let class = if traffic {
            format!("{}{}", class, ANIMATED_SUFFIX)
        } else {
            class.to_string()
        };

        Ok(PathOverlay {
            class,
            traffic,
            links: ids,
            labels,
        })
    }

    /// Highlight a single path
    pub fn path_message(&self, sid: i64, path: &Path, class: &str) -> Envelope<PathPayload> {
        let links = path.links().iter().map(|link| link.compact_id()).collect();
        Envelope::new(
            MessageKind::ShowPath,
            sid,
            PathPayload {
                class: class.to_string(),
                links,
            },
        )
    }
}
