// # topoview-core
//
// Core library for the topology viewer messaging layer.
//
// ## Architecture Overview
//
// This library turns network model state into the JSON messages a live
// topology visualization client consumes:
// - **Service traits**: read-only views of cluster membership, inventory,
//   mastership, intents and link statistics, plus the topology event source
// - **MetaUiStore**: client-authored display metadata, merged into messages
// - **TopologyViewMessages**: entity notifications, detail sheets and traffic
//   overlays, all wrapped in the wire envelope
// - **TopologyViewEngine**: event/request loop feeding a bounded outbound channel
// - **MemoryTopology**: in-memory network model backed by a snapshot file
//
// ## Design Principles
//
// 1. **Re-query, don't trust events**: status comes from the services at
//    translation time
// 2. **One shared mutable thing**: the meta-UI store; everything else is built
//    fresh per message
// 3. **Library-First**: the daemon is a thin shell over this crate

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod messages;
pub mod model;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{DisplayConfig, EngineConfig, InterfaceAddress, ViewConfig};
pub use directory::ServiceDirectory;
pub use engine::{RequestStream, TopologyViewEngine};
pub use error::{Error, Result};
pub use messages::{ClientRequest, Envelope, MessageKind, OutboundMessage, TopologyViewMessages};
pub use state::{MemoryMetaUiStore, MemoryTopology, TopologySnapshot};
pub use traits::{MetaUi, MetaUiStore, TopologyEventSource};
