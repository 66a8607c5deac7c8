//! # SR-Compute: Reduction Tasks on a Star Cluster
//!
//! Tasks that reuse the four-phase lifecycle and the fabric collectives
//! without any relay-specific protocol.
//!
//! | Task | Decomposition | Reduction |
//! |------|---------------|-----------|
//! | [`TrapezoidTask`] | contiguous ranges of x grid columns | `all_reduce` sum |
//! | [`ColumnMinTask`] | contiguous blocks of matrix columns | `gather` + `broadcast` |
//!
//! Each task has a single-node counterpart ([`TrapezoidSeq`],
//! [`ColumnMinSeq`]) producing the same output without a fabric.
//!
//! Local work is parallelised with Rayon when the `cpu` feature is enabled
//! (the default).

pub mod tasks;

use shared_types::TaskError;
use thiserror::Error;

pub use tasks::column_min::{column_block, column_minima, ColumnMinSeq, ColumnMinTask, Matrix};
pub use tasks::quadrature::{
    column_range, sum_of_squares, weighted_sum, Integral, Integrand, TrapezoidSeq, TrapezoidTask,
};

/// Compute input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Invalid integral: {0}")]
    InvalidIntegral(String),

    #[error("Ragged matrix: row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Matrix is empty")]
    EmptyMatrix,
}

impl From<ComputeError> for TaskError {
    fn from(err: ComputeError) -> Self {
        TaskError::Validation(err.to_string())
    }
}
