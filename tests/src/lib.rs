//! # Star-Relay Test Suite
//!
//! Unified test crate for behaviour that spans more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs       # Cluster launch helpers shared by the scenarios
//! │   └── integration/
//! │       ├── relay_scenarios.rs   # Every (source, destination) pair, N = 1..=6
//! │       ├── lifecycle_flows.rs   # Phase ordering across real tasks
//! │       ├── compute_flows.rs     # Quadrature and column minima vs. sequential
//! │       └── runtime_flows.rs     # node-runtime launchers and metrics
//! └── benches/
//!     └── relay_benchmarks.rs      # criterion
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sr-tests
//!
//! # By category
//! cargo test -p sr-tests integration::relay_scenarios::
//!
//! # Benchmarks
//! cargo bench -p sr-tests
//! ```

pub mod fixtures;
pub mod integration;
