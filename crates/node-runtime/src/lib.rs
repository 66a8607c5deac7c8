//! # Node Runtime Library
//!
//! Launchers behind the `star-node` binary, exposed for testing.
//!
//! - `config/` - cluster configuration and command line input parsers
//! - `launcher/` - in-process cluster runs with metrics and run correlation

pub mod config;
pub mod launcher;

pub use config::{parse_matrix, parse_payload, ConfigError, RuntimeConfig, DEFAULT_NODES, MAX_NODES};
pub use launcher::{
    execute_tracked, run_column_min, run_quadrature, run_relay, ClusterReport, RuntimeError,
};
