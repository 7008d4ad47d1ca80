// # Intents
//
// Connectivity objectives and the installed realizations that carry them.
//
// An intent may be realized by zero, one or many installed intents. Each
// installed realization has one of a closed set of shapes, and all of them
// can be reduced to an ordered sequence of links through [`LinkSequence`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ConnectPoint, HostId, Link, Path};

/// Intent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(pub u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// What a submitted intent asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentKind {
    HostToHost {
        one: HostId,
        two: HostId,
    },
    PointToPoint {
        ingress: ConnectPoint,
        egress: ConnectPoint,
    },
    MultiPointToSinglePoint {
        ingress: Vec<ConnectPoint>,
        egress: ConnectPoint,
    },
    OpticalConnectivity {
        src: ConnectPoint,
        dst: ConnectPoint,
    },
}

/// A submitted connectivity intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    #[serde(default)]
    pub app_id: String,
    #[serde(flatten)]
    pub kind: IntentKind,
}

impl Intent {
    pub fn new(id: u64, kind: IntentKind) -> Self {
        Self {
            id: IntentId(id),
            app_id: String::new(),
            kind,
        }
    }

    /// Whether this intent requests optical connectivity
    pub fn is_optical(&self) -> bool {
        matches!(self.kind, IntentKind::OpticalConnectivity { .. })
    }
}

/// Capability shared by everything that resolves to an ordered list of links
pub trait LinkSequence {
    fn links(&self) -> &[Link];
}

impl LinkSequence for Path {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

/// An installed, link-level realization of an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstallableIntent {
    /// A single simple path
    Path { id: IntentId, path: Path },
    /// A tree or arbitrary collection of links
    LinkCollection { id: IntentId, links: Vec<Link> },
    /// A path across the optical layer
    OpticalPath { id: IntentId, path: Path },
}

impl InstallableIntent {
    pub fn id(&self) -> IntentId {
        match self {
            Self::Path { id, .. }
            | Self::LinkCollection { id, .. }
            | Self::OpticalPath { id, .. } => *id,
        }
    }
}

impl LinkSequence for InstallableIntent {
    fn links(&self) -> &[Link] {
        match self {
            Self::Path { path, .. } | Self::OpticalPath { path, .. } => path.links(),
            Self::LinkCollection { links, .. } => links,
        }
    }
}
