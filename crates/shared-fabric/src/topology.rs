//! # Node Topology
//!
//! Star topology queries: who am I, how many nodes exist, am I the hub.

use shared_types::NodeId;

/// Queries against the execution environment of one node.
pub trait NodeTopology {
    /// Id of the calling node.
    fn self_id(&self) -> NodeId;

    /// Total number of nodes in the cluster.
    fn node_count(&self) -> usize;

    /// True iff the calling node is node `0`.
    fn is_hub(&self) -> bool {
        self.self_id().is_hub()
    }
}

/// Snapshot of one node's place in the cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Topology {
    self_id: NodeId,
    node_count: usize,
}

impl Topology {
    /// Describe node `self_id` in a cluster of `node_count` nodes.
    #[must_use]
    pub fn new(self_id: NodeId, node_count: usize) -> Self {
        Self {
            self_id,
            node_count,
        }
    }

    /// Iterate over every node id of the cluster, hub first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count).map(NodeId::new)
    }

    /// Iterate over every node except `root`.
    pub fn peers_of(&self, root: NodeId) -> impl Iterator<Item = NodeId> {
        self.nodes().filter(move |node| *node != root)
    }

    /// True iff `node` belongs to this cluster.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        node.in_range(self.node_count)
    }
}

impl NodeTopology for Topology {
    fn self_id(&self) -> NodeId {
        self.self_id
    }

    fn node_count(&self) -> usize {
        self.node_count
    }
}
