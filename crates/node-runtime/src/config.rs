//! # Runtime Configuration
//!
//! Cluster parameters for a `star-node` run and the parsers for the textual
//! task inputs given on the command line.

use shared_fabric::FabricConfig;
use shared_types::{Payload, Word};
use sr_01_star_relay::DeliveryPolicy;
use sr_compute::Matrix;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the number of in-process nodes.
pub const MAX_NODES: usize = 1024;

/// Default cluster size when neither `--nodes` nor `STAR_NODES` is given.
pub const DEFAULT_NODES: usize = 4;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cluster needs at least one node")]
    ZeroNodes,

    #[error("Cluster of {requested} nodes exceeds the limit of {max}")]
    TooManyNodes { requested: usize, max: usize },

    #[error("Stall timeout must be positive")]
    ZeroStallTimeout,

    #[error("Invalid payload element {element:?}: {reason}")]
    InvalidPayload { element: String, reason: String },

    #[error("Invalid matrix row {row}: {reason}")]
    InvalidMatrix { row: usize, reason: String },
}

/// Parameters of one cluster run.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Number of nodes, hub included.
    pub nodes: usize,
    /// Turn a peer that never reaches the matching call into an error.
    pub stall_timeout: Option<Duration>,
    /// Which nodes keep the relayed payload.
    pub policy: DeliveryPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            nodes: DEFAULT_NODES,
            stall_timeout: None,
            policy: DeliveryPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    pub fn with_stall_timeout(mut self, limit: Duration) -> Self {
        self.stall_timeout = Some(limit);
        self
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate before any node is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::ZeroNodes);
        }
        if self.nodes > MAX_NODES {
            return Err(ConfigError::TooManyNodes {
                requested: self.nodes,
                max: MAX_NODES,
            });
        }
        if self.stall_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroStallTimeout);
        }
        Ok(())
    }

    /// Fabric settings derived from this configuration.
    pub fn fabric_config(&self) -> FabricConfig {
        match self.stall_timeout {
            Some(limit) => FabricConfig::with_stall_timeout(limit),
            None => FabricConfig::default(),
        }
    }
}

/// Parse a comma separated payload such as `1,2,3`. Blank input is the
/// empty payload.
pub fn parse_payload(input: &str) -> Result<Payload, ConfigError> {
    if input.trim().is_empty() {
        return Ok(Payload::new());
    }
    input
        .split(',')
        .map(|element| {
            let element = element.trim();
            element
                .parse::<Word>()
                .map_err(|e| ConfigError::InvalidPayload {
                    element: element.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Parse a matrix written row by row, rows separated by `;` and elements by
/// `,`, e.g. `3,7;1,9`. Row lengths are checked by the task itself.
pub fn parse_matrix(input: &str) -> Result<Matrix, ConfigError> {
    if input.trim().is_empty() {
        return Ok(Matrix::new());
    }
    input
        .split(';')
        .enumerate()
        .map(|(row, text)| {
            parse_payload(text).map_err(|e| ConfigError::InvalidMatrix {
                row,
                reason: e.to_string(),
            })
        })
        .collect()
}
