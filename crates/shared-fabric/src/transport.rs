//! # Transport
//!
//! Byte-level point-to-point transfers and the in-memory fabric that
//! implements them over `tokio` channels.

use crate::envelope::{Channel, Envelope};
use crate::topology::{NodeTopology, Topology};
use async_trait::async_trait;
use shared_types::{FabricError, NodeId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Blocking byte transfers addressed by node id and channel.
///
/// Implementations must give rendezvous semantics: `send_bytes` completes
/// only once the recipient posted a matching `recv_bytes`. A transfer whose
/// peer went away fails with [`FabricError::PeerDisconnected`] instead of
/// blocking.
#[async_trait]
pub trait Transport: Send {
    /// Position of this node in the cluster.
    fn topology(&self) -> Topology;

    /// Send `body` to `dest` on `channel`, waiting until it is matched.
    async fn send_bytes(
        &mut self,
        dest: NodeId,
        channel: Channel,
        body: Vec<u8>,
    ) -> Result<(), FabricError>;

    /// Wait for the next envelope from `source` on `channel`.
    async fn recv_bytes(&mut self, source: NodeId, channel: Channel)
        -> Result<Vec<u8>, FabricError>;

    /// Record that a collective call started.
    fn note_collective(&self) {}
}

/// Fabric tuning.
#[derive(Clone, Debug, Default)]
pub struct FabricConfig {
    /// Give up on a blocked transfer after this long. `None` waits forever.
    pub stall_timeout: Option<Duration>,
}

impl FabricConfig {
    /// Config that turns stalls into errors after `limit`.
    #[must_use]
    pub fn with_stall_timeout(limit: Duration) -> Self {
        Self {
            stall_timeout: Some(limit),
        }
    }
}

/// Traffic counters shared by all endpoints of one fabric.
#[derive(Debug, Default)]
pub struct FabricStats {
    messages: AtomicU64,
    bytes: AtomicU64,
    collectives: AtomicU64,
}

impl FabricStats {
    fn record_message(&self, len: usize) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    fn record_collective(&self) {
        self.collectives.fetch_add(1, Ordering::Relaxed);
    }

    /// Envelopes handed to the fabric.
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// Encoded body bytes handed to the fabric.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Collective calls issued, counted once per participating node.
    pub fn collectives(&self) -> u64 {
        self.collectives.load(Ordering::Relaxed)
    }
}

/// A cluster of `N` endpoints wired to each other in memory.
pub struct InMemoryFabric {
    endpoints: Vec<InMemoryEndpoint>,
    stats: Arc<FabricStats>,
}

impl InMemoryFabric {
    /// Build a fabric of `node_count` nodes with the default configuration.
    pub fn new(node_count: usize) -> Result<Self, FabricError> {
        Self::with_config(node_count, FabricConfig::default())
    }

    /// Build a fabric of `node_count` nodes.
    pub fn with_config(node_count: usize, config: FabricConfig) -> Result<Self, FabricError> {
        if node_count == 0 {
            return Err(FabricError::EmptyTopology);
        }

        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..node_count).map(|_| mpsc::unbounded_channel()).unzip();
        let (guards, watchers): (Vec<_>, Vec<_>) =
            (0..node_count).map(|_| watch::channel(())).unzip();
        let peers = Arc::new(senders);
        let liveness = Arc::new(watchers);
        let stats = Arc::new(FabricStats::default());

        let endpoints = inboxes
            .into_iter()
            .zip(guards)
            .enumerate()
            .map(|(index, (inbox, guard))| InMemoryEndpoint {
                topology: Topology::new(NodeId::new(index), node_count),
                peers: peers.clone(),
                liveness: liveness.clone(),
                _alive: guard,
                inbox,
                parked: VecDeque::new(),
                config: config.clone(),
                stats: stats.clone(),
            })
            .collect();

        debug!(nodes = node_count, "In-memory fabric created");
        Ok(Self { endpoints, stats })
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Traffic counters of this fabric.
    #[must_use]
    pub fn stats(&self) -> Arc<FabricStats> {
        self.stats.clone()
    }

    /// Hand out the endpoints, ordered by node id.
    #[must_use]
    pub fn into_endpoints(self) -> Vec<InMemoryEndpoint> {
        self.endpoints
    }
}

/// One node's view of an [`InMemoryFabric`].
pub struct InMemoryEndpoint {
    topology: Topology,
    /// Inbox senders of every node, indexed by node id.
    peers: Arc<Vec<mpsc::UnboundedSender<Envelope>>>,
    /// Closes once the matching node's endpoint is dropped.
    liveness: Arc<Vec<watch::Receiver<()>>>,
    _alive: watch::Sender<()>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    /// Envelopes that arrived before their matching receive.
    parked: VecDeque<Envelope>,
    config: FabricConfig,
    stats: Arc<FabricStats>,
}

impl InMemoryEndpoint {
    /// Id of this endpoint.
    #[must_use]
    pub fn self_id(&self) -> NodeId {
        self.topology.self_id()
    }

    /// Envelopes waiting for a matching receive.
    #[must_use]
    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    fn check_peer(&self, peer: NodeId) -> Result<(), FabricError> {
        if peer == self.self_id() {
            return Err(FabricError::SelfAddressed(peer));
        }
        if !self.topology.contains(peer) {
            return Err(FabricError::UnknownPeer {
                peer,
                node_count: self.topology.node_count(),
            });
        }
        Ok(())
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.stall_timeout.map(|limit| Instant::now() + limit)
    }

    fn stalled(&self, peer: NodeId) -> FabricError {
        FabricError::Stalled {
            peer,
            waited_ms: self
                .config
                .stall_timeout
                .map(|limit| limit.as_millis() as u64)
                .unwrap_or_default(),
        }
    }

    /// Next queued envelope, or `None` once `source` is gone and nothing is
    /// left in the inbox.
    async fn wait_for(&mut self, mut source_alive: watch::Receiver<()>) -> Option<Envelope> {
        tokio::select! {
            biased;
            next = self.inbox.recv() => return next,
            Err(_) = source_alive.changed() => {}
        }
        // Everything the peer sent before leaving is already queued.
        self.inbox.try_recv().ok()
    }

    async fn next_envelope(
        &mut self,
        source: NodeId,
        deadline: Option<Instant>,
    ) -> Result<Envelope, FabricError> {
        let source_alive =
            self.liveness
                .get(source.index())
                .cloned()
                .ok_or(FabricError::UnknownPeer {
                    peer: source,
                    node_count: self.topology.node_count(),
                })?;
        let next = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.wait_for(source_alive)).await {
                    Ok(next) => next,
                    Err(_) => return Err(self.stalled(source)),
                }
            }
            None => self.wait_for(source_alive).await,
        };
        next.ok_or(FabricError::PeerDisconnected(source))
    }

    fn accept(&self, envelope: Envelope) -> Result<Vec<u8>, FabricError> {
        envelope.verify_version()?;
        trace!(
            node = %self.self_id(),
            peer = %envelope.sender,
            channel = %envelope.channel,
            len = envelope.body.len(),
            "Envelope matched"
        );
        Ok(envelope.accept())
    }
}

#[async_trait]
impl Transport for InMemoryEndpoint {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn send_bytes(
        &mut self,
        dest: NodeId,
        channel: Channel,
        body: Vec<u8>,
    ) -> Result<(), FabricError> {
        self.check_peer(dest)?;
        let len = body.len();
        let (envelope, ack) = Envelope::new(self.self_id(), dest, channel, body);

        let inbox = self
            .peers
            .get(dest.index())
            .ok_or(FabricError::UnknownPeer {
                peer: dest,
                node_count: self.topology.node_count(),
            })?;
        inbox
            .send(envelope)
            .map_err(|_| FabricError::PeerDisconnected(dest))?;
        self.stats.record_message(len);

        trace!(node = %self.self_id(), peer = %dest, channel = %channel, len, "Envelope sent");
        let acked = match self.deadline() {
            Some(deadline) => match tokio::time::timeout_at(deadline, ack).await {
                Ok(acked) => acked,
                Err(_) => return Err(self.stalled(dest)),
            },
            None => ack.await,
        };
        acked.map_err(|_| FabricError::PeerDisconnected(dest))
    }

    async fn recv_bytes(
        &mut self,
        source: NodeId,
        channel: Channel,
    ) -> Result<Vec<u8>, FabricError> {
        self.check_peer(source)?;

        if let Some(position) = self
            .parked
            .iter()
            .position(|envelope| envelope.matches(source, channel))
        {
            if let Some(envelope) = self.parked.remove(position) {
                return self.accept(envelope);
            }
        }

        let deadline = self.deadline();
        loop {
            let envelope = self.next_envelope(source, deadline).await?;
            if envelope.matches(source, channel) {
                return self.accept(envelope);
            }
            trace!(
                node = %self.self_id(),
                peer = %envelope.sender,
                channel = %envelope.channel,
                "Envelope parked until a matching receive"
            );
            self.parked.push_back(envelope);
        }
    }

    fn note_collective(&self) {
        self.stats.record_collective();
    }
}
