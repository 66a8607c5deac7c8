//! Column-wise minimum of a matrix held by the hub
//!
//! The hub scatters contiguous column blocks, every node reduces its block
//! and the hub gathers the partial results and broadcasts the full row of
//! minima.

use crate::ComputeError;
use async_trait::async_trait;
use shared_fabric::{Communicator, NodeTopology, Transport};
use shared_types::{Payload, Task, TaskError, Word, HUB};
use std::ops::Range;
use tracing::debug;

#[cfg(feature = "cpu")]
use rayon::prelude::*;

/// Row-major matrix.
pub type Matrix = Vec<Vec<Word>>;

/// Check that every row has the length of the first one.
pub fn check_rectangular(matrix: &Matrix) -> Result<(), ComputeError> {
    let expected = matrix.first().map_or(0, Vec::len);
    match matrix.iter().position(|row| row.len() != expected) {
        Some(row) => Err(ComputeError::RaggedMatrix {
            row,
            expected,
            found: matrix[row].len(),
        }),
        None => Ok(()),
    }
}

/// Columns handled by `node` out of `nodes` for a matrix with `cols`
/// columns. The first `cols % nodes` nodes take one extra column.
pub fn column_block(node: usize, nodes: usize, cols: usize) -> Range<usize> {
    let base = cols / nodes;
    let extra = cols % nodes;
    let start = node * base + node.min(extra);
    start..start + base + usize::from(node < extra)
}

/// Minimum of each column of a column-major block.
pub fn column_minima(columns: &[Vec<Word>]) -> Payload {
    #[cfg(feature = "cpu")]
    let iter = columns.par_iter();
    #[cfg(not(feature = "cpu"))]
    let iter = columns.iter();

    iter.map(|column| column.iter().copied().min().unwrap_or(Word::MAX))
        .collect()
}

fn extract_columns(matrix: &Matrix, range: Range<usize>) -> Vec<Vec<Word>> {
    range
        .map(|col| matrix.iter().map(|row| row[col]).collect())
        .collect()
}

/// Distributed column minima. The hub's matrix is authoritative; every node
/// ends up with the full result.
pub struct ColumnMinTask<T: Transport> {
    comm: Communicator<T>,
    matrix: Matrix,
    output: Payload,
}

impl<T: Transport> ColumnMinTask<T> {
    /// Non-hub nodes may pass an empty matrix.
    pub fn new(comm: Communicator<T>, matrix: Matrix) -> Self {
        Self {
            comm,
            matrix,
            output: Payload::new(),
        }
    }
}

#[async_trait]
impl<T: Transport> Task for ColumnMinTask<T> {
    type Output = Payload;

    fn name(&self) -> &'static str {
        "column_min"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        let verdict = if self.comm.is_hub() {
            check_rectangular(&self.matrix).err().map(|e| e.to_string())
        } else {
            None
        };
        match self.comm.broadcast(HUB, verdict).await? {
            Some(reason) => Err(TaskError::Validation(reason)),
            None => Ok(()),
        }
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.output.clear();
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        let nodes = self.comm.node_count();
        let dims = if self.comm.is_hub() {
            (self.matrix.len(), self.matrix.first().map_or(0, Vec::len))
        } else {
            (0, 0)
        };
        let (rows, cols) = self.comm.broadcast(HUB, dims).await?;
        if rows == 0 || cols == 0 {
            self.output.clear();
            return Ok(());
        }

        let blocks = self.comm.is_hub().then(|| {
            (0..nodes)
                .map(|node| extract_columns(&self.matrix, column_block(node, nodes, cols)))
                .collect::<Vec<_>>()
        });
        let block: Vec<Vec<Word>> = self.comm.scatter(HUB, blocks).await?;
        debug!(node = %self.comm.self_id(), columns = block.len(), "Column block received");

        let local = column_minima(&block);
        let gathered = self.comm.gather(HUB, local).await?;
        let minima = gathered.map(|parts| parts.concat()).unwrap_or_default();

        self.output = self.comm.broadcast(HUB, minima).await?;
        Ok(())
    }

    async fn post_process(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn output(&self) -> &Payload {
        &self.output
    }

    fn into_output(self) -> Payload {
        self.output
    }
}

/// Single-node column minima.
#[derive(Debug, Clone)]
pub struct ColumnMinSeq {
    matrix: Matrix,
    output: Payload,
}

impl ColumnMinSeq {
    pub fn new(matrix: Matrix) -> Self {
        Self {
            matrix,
            output: Payload::new(),
        }
    }
}

#[async_trait]
impl Task for ColumnMinSeq {
    type Output = Payload;

    fn name(&self) -> &'static str {
        "column_min_seq"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        if self.matrix.is_empty() {
            return Err(ComputeError::EmptyMatrix.into());
        }
        check_rectangular(&self.matrix)?;
        Ok(())
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.output.clear();
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        let cols = self.matrix.first().map_or(0, Vec::len);
        self.output = column_minima(&extract_columns(&self.matrix, 0..cols));
        Ok(())
    }

    async fn post_process(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn output(&self) -> &Payload {
        &self.output
    }

    fn into_output(self) -> Payload {
        self.output
    }
}
