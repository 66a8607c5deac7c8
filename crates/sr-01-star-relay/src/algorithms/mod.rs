//! # Algorithms Module
//!
//! Parameter agreement and the routing engine.

pub mod agreement;
pub mod routing;

pub use agreement::agree;
pub use routing::RoutingEngine;
