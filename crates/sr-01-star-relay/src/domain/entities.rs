//! # Domain Entities
//!
//! Per-node payload storage of a relay run.

use super::errors::RelayError;
use shared_types::{Payload, Word};

/// Output buffer of one node.
///
/// Payloads in transit land in `staging`; only a node entitled to the
/// payload commits it to `output`. The hub therefore forwards without ever
/// exposing the payload as its own result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PayloadBuffer {
    staging: Payload,
    output: Payload,
}

impl PayloadBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop anything left from a previous run.
    pub fn clear(&mut self) {
        self.staging.clear();
        self.output.clear();
    }

    /// Size the staging area for a payload of the agreed length.
    pub fn allocate(&mut self, length: usize) {
        self.staging.clear();
        self.staging.resize(length, 0);
    }

    /// Store a payload that arrived over a hop.
    pub fn receive(&mut self, incoming: Payload) -> Result<(), RelayError> {
        if incoming.len() != self.staging.len() {
            return Err(RelayError::LengthMismatch {
                expected: self.staging.len(),
                received: incoming.len(),
            });
        }
        self.staging = incoming;
        Ok(())
    }

    /// Stage a payload this node already holds.
    pub fn load_local(&mut self, payload: &[Word]) {
        self.staging.clear();
        self.staging.extend_from_slice(payload);
    }

    /// Expose the staged payload as this node's output.
    pub fn commit(&mut self) {
        self.output = std::mem::take(&mut self.staging);
    }

    /// Payload currently staged.
    pub fn staging(&self) -> &[Word] {
        &self.staging
    }

    /// Committed output.
    pub fn output(&self) -> &Payload {
        &self.output
    }

    /// Consume the buffer and return the committed output.
    pub fn into_output(self) -> Payload {
        self.output
    }
}
