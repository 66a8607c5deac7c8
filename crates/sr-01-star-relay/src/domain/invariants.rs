//! # Domain Invariants
//!
//! Rules that must hold for every relay run.

use super::errors::RelayError;
use super::value_objects::{AgreedParams, DeliveryPolicy, RoutingCase};
use shared_types::{NodeId, Payload, Word};

/// Smallest cluster in which anything is relayed.
pub const MIN_RELAY_NODES: usize = 3;

/// Invariant: source and destination address nodes of the cluster.
pub fn invariant_addressing_in_range(
    source: NodeId,
    destination: NodeId,
    node_count: usize,
) -> Result<(), RelayError> {
    if !source.in_range(node_count) {
        return Err(RelayError::SourceOutOfRange {
            node: source,
            node_count,
        });
    }
    if !destination.in_range(node_count) {
        return Err(RelayError::DestinationOutOfRange {
            node: destination,
            node_count,
        });
    }
    Ok(())
}

/// Invariant: after a run exactly the nodes entitled under `policy` hold the
/// payload and every other node holds nothing.
///
/// `outputs` is indexed by node id.
pub fn invariant_delivery(
    params: &AgreedParams,
    policy: DeliveryPolicy,
    payload: &[Word],
    outputs: &[Payload],
) -> bool {
    let case = RoutingCase::resolve(params, outputs.len());
    outputs.iter().enumerate().all(|(index, output)| {
        if policy.holds_payload(case, NodeId::new(index), params) {
            output.as_slice() == payload
        } else {
            output.is_empty()
        }
    })
}
