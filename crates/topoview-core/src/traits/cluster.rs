// # Cluster Service Trait
//
// Read-only view of controller cluster membership.

use async_trait::async_trait;

use crate::model::{ControllerNode, NodeId, NodeState};

/// Cluster membership queries
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait ClusterService: Send + Sync {
    /// The instance this process runs on
    async fn local_node(&self) -> Result<ControllerNode, crate::Error>;

    /// All known cluster members
    async fn nodes(&self) -> Result<Vec<ControllerNode>, crate::Error>;

    /// Current membership state of a node
    ///
    /// Unknown nodes report [`NodeState::Inactive`].
    async fn state(&self, node_id: &NodeId) -> Result<NodeState, crate::Error>;
}
