//! # Routing Engine
//!
//! Executes the transfer sequence of the resolved [`RoutingCase`]. Every
//! node runs the same code and picks its role from its own id only.
//!
//! ```text
//! SpokeToSpoke (source 1, destination 3):
//!
//!   hub ──HubToSource──→ node-1
//!   hub ←──SourceToHub── node-1
//!   hub ──HubToDestination──→ node-3
//! ```
//!
//! The hub always hands the payload to the source first, so a spoke source
//! never depends on holding the payload locally.

use crate::domain::{
    AgreedParams, DeliveryPolicy, HopTag, PayloadBuffer, RelayError, RoutingCase,
};
use shared_fabric::{Communicator, NodeTopology, Transport};
use shared_types::{NodeId, Payload, Word, HUB};
use tracing::{debug, trace};

/// Runs one relay on one node.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoutingEngine {
    policy: DeliveryPolicy,
}

impl RoutingEngine {
    /// Engine delivering under `policy`.
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self { policy }
    }

    /// Delivery policy in effect.
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Perform the relay described by `params`.
    ///
    /// `local` is the payload this node was constructed with. The node's
    /// result is committed into `buffer`.
    pub async fn route<T: Transport>(
        &self,
        comm: &mut Communicator<T>,
        params: &AgreedParams,
        local: &[Word],
        buffer: &mut PayloadBuffer,
    ) -> Result<RoutingCase, RelayError> {
        let case = RoutingCase::resolve(params, comm.node_count());
        let me = comm.self_id();
        buffer.allocate(params.length);

        match case {
            RoutingCase::Degenerate => {}
            RoutingCase::Broadcast => broadcast_from_hub(comm, local, buffer).await?,
            RoutingCase::HubToSpoke => hub_to_spoke(comm, params, local, buffer).await?,
            RoutingCase::SpokeToHub => {
                hand_to_source(comm, params, local, buffer).await?;
            }
            RoutingCase::SpokeToSpoke => {
                hand_to_source(comm, params, local, buffer).await?;
                forward_to_destination(comm, params, buffer).await?;
            }
            RoutingCase::SelfRelay => {
                if me == params.source {
                    buffer.load_local(local);
                }
            }
        }

        if case.is_entitled(me, params) {
            buffer.commit();
        }

        if self.policy == DeliveryPolicy::ReplicateToAll && case != RoutingCase::Degenerate {
            replicate(comm, params, buffer).await?;
        }

        debug!(node = %me, %case, len = buffer.output().len(), "Relay routed");
        Ok(case)
    }
}

async fn send_hop<T: Transport>(
    comm: &mut Communicator<T>,
    dest: NodeId,
    hop: HopTag,
    payload: &[Word],
) -> Result<(), RelayError> {
    trace!(node = %comm.self_id(), peer = %dest, tag = ?hop, len = payload.len(), "Hop send");
    comm.send(dest, hop.tag(), payload).await?;
    Ok(())
}

async fn recv_hop<T: Transport>(
    comm: &mut Communicator<T>,
    source: NodeId,
    hop: HopTag,
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let incoming: Payload = comm.recv(source, hop.tag()).await?;
    trace!(
        node = %comm.self_id(),
        peer = %source,
        tag = ?hop,
        len = incoming.len(),
        "Hop received"
    );
    buffer.receive(incoming)
}

async fn broadcast_from_hub<T: Transport>(
    comm: &mut Communicator<T>,
    local: &[Word],
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let mine = if comm.is_hub() {
        local.to_vec()
    } else {
        Payload::new()
    };
    let payload = comm.broadcast(HUB, mine).await?;
    buffer.receive(payload)
}

async fn hub_to_spoke<T: Transport>(
    comm: &mut Communicator<T>,
    params: &AgreedParams,
    local: &[Word],
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let me = comm.self_id();
    if me == HUB {
        buffer.load_local(local);
        send_hop(comm, params.destination, HopTag::Direct, buffer.staging()).await?;
    } else if me == params.destination {
        recv_hop(comm, HUB, HopTag::Direct, buffer).await?;
    }
    Ok(())
}

/// Hub to source and back. Leaves the payload staged on the hub.
async fn hand_to_source<T: Transport>(
    comm: &mut Communicator<T>,
    params: &AgreedParams,
    local: &[Word],
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let me = comm.self_id();
    if me == HUB {
        buffer.load_local(local);
        send_hop(comm, params.source, HopTag::HubToSource, buffer.staging()).await?;
        recv_hop(comm, params.source, HopTag::SourceToHub, buffer).await?;
    } else if me == params.source {
        recv_hop(comm, HUB, HopTag::HubToSource, buffer).await?;
        send_hop(comm, HUB, HopTag::SourceToHub, buffer.staging()).await?;
    }
    Ok(())
}

async fn forward_to_destination<T: Transport>(
    comm: &mut Communicator<T>,
    params: &AgreedParams,
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let me = comm.self_id();
    if me == HUB {
        send_hop(comm, params.destination, HopTag::HubToDestination, buffer.staging()).await?;
    } else if me == params.destination {
        recv_hop(comm, HUB, HopTag::HubToDestination, buffer).await?;
    }
    Ok(())
}

/// The destination broadcasts its committed output to every node.
async fn replicate<T: Transport>(
    comm: &mut Communicator<T>,
    params: &AgreedParams,
    buffer: &mut PayloadBuffer,
) -> Result<(), RelayError> {
    let mine = if comm.self_id() == params.destination {
        buffer.output().clone()
    } else {
        Payload::new()
    };
    let payload = comm.broadcast(params.destination, mine).await?;
    buffer.load_local(&payload);
    buffer.commit();
    Ok(())
}
