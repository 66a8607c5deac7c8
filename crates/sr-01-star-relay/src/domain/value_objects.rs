//! # Domain Value Objects
//!
//! Immutable value types for the Star Relay.

use super::invariants::MIN_RELAY_NODES;
use serde::{Deserialize, Serialize};
use shared_types::{NodeId, Payload, Tag, HUB};
use std::fmt;

/// What the caller asks for, constructed on every node.
///
/// Only the hub's copy is authoritative. Other nodes carry the same
/// addressing and usually an empty payload; a self-relay source carries its
/// own payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Node the payload originates from.
    pub source: NodeId,
    /// Node the payload must end up at.
    pub destination: NodeId,
    /// Payload held by this node.
    pub payload: Payload,
}

impl Request {
    /// Create a new request.
    pub fn new(
        source: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        payload: Payload,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            payload,
        }
    }
}

/// Parameters every node holds after agreement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreedParams {
    /// Agreed source.
    pub source: NodeId,
    /// Agreed destination.
    pub destination: NodeId,
    /// Agreed payload length.
    pub length: usize,
}

impl AgreedParams {
    /// Local proposal derived from a request. Only the hub's proposal wins.
    pub fn from_request(request: &Request) -> Self {
        Self {
            source: request.source,
            destination: request.destination,
            length: request.payload.len(),
        }
    }
}

/// Transfer pattern selected from the agreed parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingCase {
    /// Fewer than three nodes; nothing moves.
    Degenerate,
    /// Hub to hub; the hub broadcasts to everyone.
    Broadcast,
    /// Hub to a spoke in one hop.
    HubToSpoke,
    /// Spoke to hub, after the hub handed the payload to the source.
    SpokeToHub,
    /// Spoke to another spoke through the hub.
    SpokeToSpoke,
    /// A spoke relaying to itself; no transfers.
    SelfRelay,
}

impl RoutingCase {
    /// Classify agreed parameters. Pure function of its inputs, so every
    /// node resolves the same case.
    pub fn resolve(params: &AgreedParams, node_count: usize) -> Self {
        let source_is_hub = params.source == HUB;
        let destination_is_hub = params.destination == HUB;

        if node_count < MIN_RELAY_NODES {
            Self::Degenerate
        } else if source_is_hub && destination_is_hub {
            Self::Broadcast
        } else if source_is_hub {
            Self::HubToSpoke
        } else if destination_is_hub {
            Self::SpokeToHub
        } else if params.source == params.destination {
            Self::SelfRelay
        } else {
            Self::SpokeToSpoke
        }
    }

    /// True iff `node` holds the payload after point-to-point delivery.
    pub fn is_entitled(&self, node: NodeId, params: &AgreedParams) -> bool {
        match self {
            Self::Degenerate => false,
            Self::Broadcast => true,
            Self::HubToSpoke | Self::SpokeToHub | Self::SpokeToSpoke | Self::SelfRelay => {
                node == params.destination
            }
        }
    }

    /// Point-to-point hops performed, in order.
    pub fn hops(&self) -> &'static [HopTag] {
        match self {
            Self::Degenerate | Self::Broadcast | Self::SelfRelay => &[],
            Self::HubToSpoke => &[HopTag::Direct],
            Self::SpokeToHub => &[HopTag::HubToSource, HopTag::SourceToHub],
            Self::SpokeToSpoke => &[
                HopTag::HubToSource,
                HopTag::SourceToHub,
                HopTag::HubToDestination,
            ],
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degenerate => "degenerate",
            Self::Broadcast => "broadcast",
            Self::HubToSpoke => "hub_to_spoke",
            Self::SpokeToHub => "spoke_to_hub",
            Self::SpokeToSpoke => "spoke_to_spoke",
            Self::SelfRelay => "self_relay",
        }
    }
}

impl fmt::Display for RoutingCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag of one hop. The hub transits several hops in one run, so each hop
/// needs its own tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HopTag {
    /// Hub to destination in a single hop.
    Direct,
    /// First leg of a spoke-originated relay.
    HubToSource,
    /// Source returning the payload to the hub.
    SourceToHub,
    /// Hub forwarding to the destination spoke.
    HubToDestination,
}

impl HopTag {
    /// Wire tag of this hop.
    pub const fn tag(self) -> Tag {
        match self {
            Self::Direct => Tag(0),
            Self::HubToSource => Tag(1),
            Self::SourceToHub => Tag(2),
            Self::HubToDestination => Tag(3),
        }
    }
}

/// Which nodes hold the payload once the relay completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryPolicy {
    /// Only the entitled node keeps the payload.
    #[default]
    DestinationOnly,
    /// The entitled node broadcasts the payload so every node holds it.
    ReplicateToAll,
}

impl DeliveryPolicy {
    /// True iff `node` holds the payload after the whole relay.
    pub fn holds_payload(&self, case: RoutingCase, node: NodeId, params: &AgreedParams) -> bool {
        match (self, case) {
            (_, RoutingCase::Degenerate) => false,
            (Self::ReplicateToAll, _) => true,
            (Self::DestinationOnly, case) => case.is_entitled(node, params),
        }
    }
}
