//! # SR-01 Star Relay
//!
//! Hub-and-spoke payload routing across a lockstep cluster.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Domain + Algorithms + Service
//!
//! ## Purpose
//!
//! Route an ordered sequence of integers from any node to any node of a star
//! topology. Node `0` is the hub; spokes only ever talk to the hub.
//!
//! | Case | Condition | Hops | Holds the payload |
//! |------|-----------|------|-------------------|
//! | Degenerate | fewer than 3 nodes | none | nobody |
//! | Broadcast | hub to hub | one collective | every node |
//! | HubToSpoke | hub to spoke | hub → dest | destination |
//! | SpokeToHub | spoke to hub | hub → src → hub | hub |
//! | SpokeToSpoke | spoke to other spoke | hub → src → hub → dest | destination |
//! | SelfRelay | spoke to itself | none | source |
//!
//! ## Run Phases
//!
//! 1. **Agreement**: the hub broadcasts `(source, destination, length)`.
//! 2. **Classification**: every node resolves the same [`RoutingCase`].
//! 3. **Routing**: the per-case transfer sequence, one tag per hop.
//!
//! ## Module Structure
//!
//! ```text
//! sr-01-star-relay/
//! ├── domain/          # Request, AgreedParams, RoutingCase, PayloadBuffer
//! ├── algorithms/      # Parameter agreement, routing engine
//! └── service.rs       # Lifecycle tasks
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod service;

// Re-exports
pub use algorithms::{agree, RoutingEngine};
pub use domain::{
    invariant_addressing_in_range, invariant_delivery, AgreedParams, DeliveryPolicy, HopTag,
    PayloadBuffer, RelayError, Request, RoutingCase, MIN_RELAY_NODES,
};
pub use service::{StarRelaySeq, StarRelayTask};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
