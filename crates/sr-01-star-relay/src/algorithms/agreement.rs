//! # Parameter Agreement
//!
//! Only the hub holds the authoritative request. Before any node branches on
//! the addressing, the hub's `(source, destination, length)` is broadcast so
//! every node resolves the same routing case.

use crate::domain::{invariant_addressing_in_range, AgreedParams, RelayError, Request};
use shared_fabric::{Communicator, NodeTopology, Transport};
use shared_types::HUB;
use tracing::debug;

/// Adopt the hub's parameters on every node.
///
/// Must be called in lockstep by all nodes. Parameters that do not address
/// the cluster are rejected identically on every node.
pub async fn agree<T: Transport>(
    comm: &mut Communicator<T>,
    request: &Request,
) -> Result<AgreedParams, RelayError> {
    let proposal = AgreedParams::from_request(request);
    let agreed = comm.broadcast(HUB, proposal).await?;

    invariant_addressing_in_range(agreed.source, agreed.destination, comm.node_count())?;

    debug!(
        node = %comm.self_id(),
        source = %agreed.source,
        destination = %agreed.destination,
        len = agreed.length,
        "Relay parameters agreed"
    );
    Ok(agreed)
}
