//! # Communicator
//!
//! Typed messaging on top of a [`Transport`]: tagged point-to-point
//! transfers plus the collectives every node calls in lockstep.

use crate::envelope::{decode, encode, Channel};
use crate::topology::{NodeTopology, Topology};
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{FabricError, NodeId, Tag, HUB};
use tracing::trace;

/// Typed endpoint of one node.
pub struct Communicator<T: Transport> {
    transport: T,
    topology: Topology,
    /// Number of collectives this node has entered so far.
    collective_seq: u64,
}

impl<T: Transport> Communicator<T> {
    /// Wrap a transport endpoint.
    pub fn new(transport: T) -> Self {
        let topology = transport.topology();
        Self {
            transport,
            topology,
            collective_seq: 0,
        }
    }

    /// This node's place in the cluster.
    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Unwrap the underlying transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Blocking send of `message` to `dest` under `tag`.
    pub async fn send<M>(&mut self, dest: NodeId, tag: Tag, message: &M) -> Result<(), FabricError>
    where
        M: Serialize + Sync + ?Sized,
    {
        let body = encode(message)?;
        self.transport
            .send_bytes(dest, Channel::Tagged(tag), body)
            .await
    }

    /// Blocking receive of the next message from `source` under `tag`.
    pub async fn recv<M>(&mut self, source: NodeId, tag: Tag) -> Result<M, FabricError>
    where
        M: DeserializeOwned,
    {
        let body = self
            .transport
            .recv_bytes(source, Channel::Tagged(tag))
            .await?;
        decode(&body)
    }

    /// Every node ends up with the value held by `root`.
    ///
    /// Values passed by non-root nodes are ignored.
    pub async fn broadcast<M>(&mut self, root: NodeId, value: M) -> Result<M, FabricError>
    where
        M: Serialize + DeserializeOwned + Send + Sync,
    {
        self.check_root(root)?;
        let channel = self.next_collective();

        if self.self_id() == root {
            let body = encode(&value)?;
            for peer in self.topology.peers_of(root) {
                self.transport
                    .send_bytes(peer, channel, body.clone())
                    .await?;
            }
            trace!(node = %self.self_id(), %channel, "Broadcast sent");
            Ok(value)
        } else {
            let body = self.transport.recv_bytes(root, channel).await?;
            decode(&body)
        }
    }

    /// Collect one value per node at `root`, ordered by node id.
    ///
    /// Returns `Some` on the root and `None` everywhere else.
    pub async fn gather<M>(&mut self, root: NodeId, value: M) -> Result<Option<Vec<M>>, FabricError>
    where
        M: Serialize + DeserializeOwned + Send + Sync,
    {
        self.check_root(root)?;
        let channel = self.next_collective();

        if self.self_id() != root {
            let body = encode(&value)?;
            self.transport.send_bytes(root, channel, body).await?;
            return Ok(None);
        }

        let mut values = Vec::with_capacity(self.node_count());
        let mut own = Some(value);
        for node in self.topology.nodes() {
            if node == root {
                if let Some(own) = own.take() {
                    values.push(own);
                }
            } else {
                let body = self.transport.recv_bytes(node, channel).await?;
                values.push(decode(&body)?);
            }
        }
        Ok(Some(values))
    }

    /// Hand the `i`-th value held by `root` to node `i`.
    ///
    /// The root must pass exactly one value per node; other nodes pass `None`.
    pub async fn scatter<M>(
        &mut self,
        root: NodeId,
        values: Option<Vec<M>>,
    ) -> Result<M, FabricError>
    where
        M: Serialize + DeserializeOwned + Send + Sync,
    {
        self.check_root(root)?;
        let channel = self.next_collective();

        if self.self_id() != root {
            let body = self.transport.recv_bytes(root, channel).await?;
            return decode(&body);
        }

        let values = values.ok_or_else(|| {
            FabricError::Collective("scatter root must provide the values".to_string())
        })?;
        if values.len() != self.node_count() {
            return Err(FabricError::Collective(format!(
                "scatter root provided {} values for {} nodes",
                values.len(),
                self.node_count()
            )));
        }

        let mut own = None;
        for (index, value) in values.into_iter().enumerate() {
            let node = NodeId::new(index);
            if node == root {
                own = Some(value);
            } else {
                let body = encode(&value)?;
                self.transport.send_bytes(node, channel, body).await?;
            }
        }
        own.ok_or_else(|| FabricError::Collective("scatter root kept no value".to_string()))
    }

    /// Combine one value per node with `op` and give the result to everyone.
    ///
    /// Values are folded at the hub in node id order.
    pub async fn all_reduce<M, F>(&mut self, value: M, op: F) -> Result<M, FabricError>
    where
        M: Serialize + DeserializeOwned + Send + Sync,
        F: Fn(M, M) -> M + Send,
    {
        let gathered = self.gather(HUB, value).await?;
        let reduced = match gathered {
            Some(values) => {
                let mut values = values.into_iter();
                let first = values.next().ok_or_else(|| {
                    FabricError::Collective("all_reduce gathered no values".to_string())
                })?;
                Some(values.fold(first, &op))
            }
            None => None,
        };
        let reduced = self.broadcast(HUB, reduced).await?;
        reduced.ok_or_else(|| FabricError::Collective("all_reduce produced no value".to_string()))
    }

    /// Return once every node has entered the barrier.
    pub async fn barrier(&mut self) -> Result<(), FabricError> {
        self.gather(HUB, ()).await?;
        self.broadcast(HUB, ()).await
    }

    fn next_collective(&mut self) -> Channel {
        let channel = Channel::Collective(self.collective_seq);
        self.collective_seq += 1;
        self.transport.note_collective();
        channel
    }

    fn check_root(&self, root: NodeId) -> Result<(), FabricError> {
        if self.topology.contains(root) {
            Ok(())
        } else {
            Err(FabricError::UnknownPeer {
                peer: root,
                node_count: self.node_count(),
            })
        }
    }
}

impl<T: Transport> NodeTopology for Communicator<T> {
    fn self_id(&self) -> NodeId {
        self.topology.self_id()
    }

    fn node_count(&self) -> usize {
        self.topology.node_count()
    }
}
