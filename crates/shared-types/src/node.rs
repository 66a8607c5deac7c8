//! # Node Identity
//!
//! Nodes are addressed by their index in `[0, N)`. Node `0` is the hub for
//! the whole lifetime of a cluster; this is a global convention and is never
//! negotiated at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside the cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// The hub. Every spoke-to-spoke transfer transits through it.
pub const HUB: NodeId = NodeId(0);

impl NodeId {
    /// Create a node id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// True iff this is node `0`.
    #[must_use]
    pub const fn is_hub(self) -> bool {
        self.0 == HUB.0
    }

    /// True iff the id addresses a node of a cluster with `node_count` nodes.
    #[must_use]
    pub const fn in_range(self, node_count: usize) -> bool {
        self.0 < node_count
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hub() {
            write!(f, "hub")
        } else {
            write!(f, "node-{}", self.0)
        }
    }
}

/// Label attached to a point-to-point transfer.
///
/// A receive only matches a send carrying the same tag from the same sender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(pub u32);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag#{}", self.0)
    }
}
