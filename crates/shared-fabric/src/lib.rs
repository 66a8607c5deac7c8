//! # Shared Fabric - Messaging Between Cluster Nodes
//!
//! Provides the node environment the relay protocol and the compute tasks run
//! on: every node knows its own id and the cluster size, and talks to its
//! peers only through blocking transfers.
//!
//! ## Primitives
//!
//! ```text
//!            send(dest, tag) ──┐        ┌── recv(source, tag)
//!                              ▼        │
//!  ┌────────┐   Envelope   ┌────────────┴─┐
//!  │ node A │ ───────────→ │ inbox of B   │  parked until a matching recv,
//!  └────────┘ ←─── ack ─── └──────────────┘  ack releases the sender
//! ```
//!
//! - **Point-to-point**: rendezvous semantics. `send` returns only after the
//!   receiver matched the envelope on `(sender, tag)`.
//! - **Collectives**: `broadcast`, `gather`, `scatter`, `all_reduce`,
//!   `barrier`, built as linear fan-out / fan-in through the root. Every
//!   node must call the same collectives in the same order.
//!
//! ## Lockstep Contract
//!
//! No call times out by default. A peer that never reaches the matching call
//! blocks the run; configure [`FabricConfig::stall_timeout`] to turn that
//! stall into [`FabricError::Stalled`](shared_types::FabricError::Stalled).
//! A peer whose endpoint was dropped fails pending and later transfers with it
//! as [`FabricError::PeerDisconnected`](shared_types::FabricError::PeerDisconnected)
//! once everything it sent has been consumed.

pub mod cluster;
pub mod communicator;
pub mod envelope;
pub mod topology;
pub mod transport;

// Re-export main types
pub use cluster::run_nodes;
pub use communicator::Communicator;
pub use envelope::{Channel, Envelope};
pub use topology::{NodeTopology, Topology};
pub use transport::{FabricConfig, FabricStats, InMemoryEndpoint, InMemoryFabric, Transport};

/// Current protocol version carried by every envelope.
pub const PROTOCOL_VERSION: u16 = 1;
