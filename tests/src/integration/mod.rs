//! # Integration Scenarios
//!
//! Cross-crate flows. Every multi-node scenario runs under a timeout so a
//! lockstep violation fails the test instead of hanging it.

pub mod lifecycle_flows;
pub mod relay_scenarios;
pub mod runtime_flows;
