// # State
//
// The messaging layer's own state and the in-memory network model.
//
// - `MemoryMetaUiStore`: process-lifetime client display metadata
// - `MemoryTopology`: network model services backed by memory or a snapshot file

pub mod meta_ui;
pub mod topology;

pub use meta_ui::MemoryMetaUiStore;
pub use topology::{
    DeviceRecord, IntentRecord, LinkLoad, MemoryTopology, NodeRecord, TopologySnapshot,
};
