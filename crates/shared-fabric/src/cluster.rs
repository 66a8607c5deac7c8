//! # Cluster Launcher
//!
//! Runs one asynchronous task per node of an [`InMemoryFabric`] and collects
//! their results.

use crate::communicator::Communicator;
use crate::transport::{InMemoryEndpoint, InMemoryFabric};
use shared_types::FabricError;
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Spawn `node_fn` once per node and wait for all of them.
///
/// Results are returned ordered by node id. A panicking node aborts the
/// remaining ones and surfaces as [`FabricError::NodePanicked`].
pub async fn run_nodes<F, Fut, R>(fabric: InMemoryFabric, node_fn: F) -> Result<Vec<R>, FabricError>
where
    F: Fn(Communicator<InMemoryEndpoint>) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let node_count = fabric.node_count();
    let mut set = JoinSet::new();

    for (index, endpoint) in fabric.into_endpoints().into_iter().enumerate() {
        let node = node_fn(Communicator::new(endpoint));
        set.spawn(async move { (index, node.await) });
    }
    debug!(nodes = node_count, "Cluster nodes spawned");

    let mut results: Vec<Option<R>> = (0..node_count).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Some(slot) = results.get_mut(index) {
                    *slot = Some(result);
                }
            }
            Err(e) => {
                error!(error = %e, "Node task failed");
                set.abort_all();
                return Err(FabricError::NodePanicked(e.to_string()));
            }
        }
    }

    results
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FabricError::NodePanicked("a node produced no result".to_string()))
}
