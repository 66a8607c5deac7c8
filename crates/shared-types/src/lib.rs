//! # Shared Types Crate
//!
//! Types shared by every crate in the Star-Relay workspace.
//!
//! ## Contents
//!
//! - **Node identity**: [`NodeId`] and the fixed [`HUB`] convention.
//! - **Transfer tags**: [`Tag`], the integer label that keeps point-to-point
//!   hops between the same pair of nodes apart.
//! - **Task lifecycle**: the four-phase [`Task`] contract
//!   (Validate → PreProcess → Run → PostProcess) and the [`TaskRunner`]
//!   that enforces the phase order.
//! - **Errors**: [`FabricError`] for transport failures and [`TaskError`]
//!   for lifecycle failures.

pub mod errors;
pub mod lifecycle;
pub mod node;

pub use errors::{FabricError, TaskError};
pub use lifecycle::{Task, TaskRunner, TaskStage};
pub use node::{NodeId, Tag, HUB};

/// Element type carried by relay payloads.
pub type Word = i32;

/// An ordered sequence of integers routed through the star.
pub type Payload = Vec<Word>;
