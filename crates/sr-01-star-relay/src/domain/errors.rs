//! # Domain Errors
//!
//! Error types for the Star Relay subsystem.

use shared_types::{FabricError, NodeId, TaskError};
use thiserror::Error;

/// Star relay error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Source id does not address a node of the cluster.
    #[error("Source {node} out of range for {node_count} nodes")]
    SourceOutOfRange {
        /// Requested source
        node: NodeId,
        /// Cluster size
        node_count: usize,
    },

    /// Destination id does not address a node of the cluster.
    #[error("Destination {node} out of range for {node_count} nodes")]
    DestinationOutOfRange {
        /// Requested destination
        node: NodeId,
        /// Cluster size
        node_count: usize,
    },

    /// A hop delivered a payload whose length differs from the agreed one.
    #[error("Payload length mismatch: agreed {expected}, received {received}")]
    LengthMismatch {
        /// Agreed length
        expected: usize,
        /// Length on the wire
        received: usize,
    },

    /// Post-processing reached without a completed agreement.
    #[error("Relay parameters were never agreed")]
    ParametersNotAgreed,

    /// Transport failure.
    #[error(transparent)]
    Fabric(#[from] FabricError),
}

impl From<RelayError> for TaskError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Fabric(e) => TaskError::Fabric(e),
            e @ (RelayError::SourceOutOfRange { .. }
            | RelayError::DestinationOutOfRange { .. }) => TaskError::Validation(e.to_string()),
            e => TaskError::Execution(e.to_string()),
        }
    }
}
