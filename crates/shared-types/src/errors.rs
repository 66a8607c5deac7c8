//! # Error Types
//!
//! Errors shared across the fabric, the relay core and the compute tasks.

use crate::lifecycle::TaskStage;
use crate::node::NodeId;
use thiserror::Error;

/// Failures of the node messaging fabric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FabricError {
    /// A fabric needs at least one node.
    #[error("Fabric requires at least one node")]
    EmptyTopology,

    /// The addressed peer is not part of the cluster.
    #[error("Unknown peer {peer} in a cluster of {node_count} nodes")]
    UnknownPeer {
        /// Requested peer.
        peer: NodeId,
        /// Cluster size.
        node_count: usize,
    },

    /// A blocking transfer to oneself can never be matched.
    #[error("Node {0} addressed a blocking transfer to itself")]
    SelfAddressed(NodeId),

    /// The peer endpoint was dropped before the transfer completed.
    #[error("Peer {0} disconnected")]
    PeerDisconnected(NodeId),

    /// Message body could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Envelope was produced by an incompatible protocol version.
    #[error("Unsupported envelope version: received {received}, supported {supported}")]
    VersionMismatch {
        /// Version found in the envelope.
        received: u16,
        /// Version this node speaks.
        supported: u16,
    },

    /// No matching transfer arrived within the configured stall timeout.
    #[error("Stalled waiting for {peer} after {waited_ms}ms")]
    Stalled {
        /// Peer the node was waiting on.
        peer: NodeId,
        /// Time spent waiting.
        waited_ms: u64,
    },

    /// A node task panicked or was cancelled.
    #[error("Node task failed: {0}")]
    NodePanicked(String),

    /// A collective was called with inconsistent arguments.
    #[error("Collective misuse: {0}")]
    Collective(String),
}

/// Failures of a lifecycle phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// Validate rejected the input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Run could not complete.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// A phase was called out of order or twice.
    #[error("Lifecycle violation: cannot move from {from:?} to {to:?}")]
    OutOfOrder {
        /// Stage the task was in.
        from: TaskStage,
        /// Stage that was requested.
        to: TaskStage,
    },

    /// Transport failure underneath a phase.
    #[error(transparent)]
    Fabric(#[from] FabricError),
}
