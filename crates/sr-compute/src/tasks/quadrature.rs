//! Trapezoid quadrature over a rectangle
//!
//! The `nx + 1` grid columns along x are split into contiguous ranges, one
//! per node. Each node sums its columns with trapezoid edge weights and the
//! partial sums are combined with `all_reduce`.

use crate::ComputeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_fabric::{Communicator, NodeTopology, Transport};
use shared_types::{Task, TaskError, HUB};
use std::ops::Range;
use tracing::debug;

#[cfg(feature = "cpu")]
use rayon::prelude::*;

/// Function being integrated.
pub type Integrand = fn(f64, f64) -> f64;

/// `x² + y²`, the default integrand.
pub fn sum_of_squares(x: f64, y: f64) -> f64 {
    x * x + y * y
}

/// Integration domain and grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Integral {
    /// Lower and upper x limits.
    pub x: (f64, f64),
    /// Lower and upper y limits.
    pub y: (f64, f64),
    /// Number of steps along x and y.
    pub steps: (usize, usize),
}

impl Integral {
    pub fn new(x: (f64, f64), y: (f64, f64), steps: (usize, usize)) -> Self {
        Self { x, y, steps }
    }

    /// Reject grids without steps and non-finite limits.
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.steps.0 == 0 || self.steps.1 == 0 {
            return Err(ComputeError::InvalidIntegral(format!(
                "step counts must be positive, got {:?}",
                self.steps
            )));
        }
        let limits = [self.x.0, self.x.1, self.y.0, self.y.1];
        if !limits.iter().all(|l| l.is_finite()) {
            return Err(ComputeError::InvalidIntegral(
                "limits must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Step sizes `(hx, hy)`.
    pub fn step_sizes(&self) -> (f64, f64) {
        (
            (self.x.1 - self.x.0) / self.steps.0 as f64,
            (self.y.1 - self.y.0) / self.steps.1 as f64,
        )
    }

    /// Number of grid columns along x.
    pub fn columns(&self) -> usize {
        self.steps.0 + 1
    }
}

/// Grid columns handled by `node` out of `nodes` when there are `points`
/// columns. The first `points % nodes` nodes take one extra column.
pub fn column_range(node: usize, nodes: usize, points: usize) -> Range<usize> {
    let count = points / nodes;
    let remainder = points % nodes;
    let start = node * count + node.min(remainder);
    let end = start + count + usize::from(node < remainder);
    start..end
}

fn edge_weight(index: usize, last: usize) -> f64 {
    if index == 0 || index == last {
        0.5
    } else {
        1.0
    }
}

fn column_sum(integral: &Integral, f: Integrand, i: usize) -> f64 {
    let (hx, hy) = integral.step_sizes();
    let (nx, ny) = integral.steps;
    let x = integral.x.0 + i as f64 * hx;
    let weight_x = edge_weight(i, nx);

    (0..=ny)
        .map(|j| {
            let y = integral.y.0 + j as f64 * hy;
            f(x, y) * weight_x * edge_weight(j, ny)
        })
        .sum()
}

/// Weighted sum of `f` over the grid columns in `columns`, before scaling by
/// `hx * hy`.
pub fn weighted_sum(integral: &Integral, f: Integrand, columns: Range<usize>) -> f64 {
    #[cfg(feature = "cpu")]
    {
        columns
            .into_par_iter()
            .map(|i| column_sum(integral, f, i))
            .sum()
    }

    #[cfg(not(feature = "cpu"))]
    {
        columns.map(|i| column_sum(integral, f, i)).sum()
    }
}

/// Distributed trapezoid quadrature. Every node ends up with the integral.
pub struct TrapezoidTask<T: Transport> {
    comm: Communicator<T>,
    integral: Integral,
    integrand: Integrand,
    output: f64,
}

impl<T: Transport> TrapezoidTask<T> {
    /// Integrate `x² + y²` over `integral`.
    pub fn new(comm: Communicator<T>, integral: Integral) -> Self {
        Self::with_integrand(comm, integral, sum_of_squares)
    }

    /// Integrate `integrand`. All nodes must pass the same function.
    pub fn with_integrand(comm: Communicator<T>, integral: Integral, integrand: Integrand) -> Self {
        Self {
            comm,
            integral,
            integrand,
            output: 0.0,
        }
    }
}

#[async_trait]
impl<T: Transport> Task for TrapezoidTask<T> {
    type Output = f64;

    fn name(&self) -> &'static str {
        "trapezoid"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        self.integral.validate()?;
        Ok(())
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.output = 0.0;
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        let integral = self.comm.broadcast(HUB, self.integral).await?;
        integral.validate()?;

        let columns = column_range(
            self.comm.self_id().index(),
            self.comm.node_count(),
            integral.columns(),
        );
        debug!(node = %self.comm.self_id(), ?columns, "Trapezoid columns assigned");

        let local = weighted_sum(&integral, self.integrand, columns);
        let total = self.comm.all_reduce(local, |a, b| a + b).await?;

        let (hx, hy) = integral.step_sizes();
        self.output = total * hx * hy;
        Ok(())
    }

    async fn post_process(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn output(&self) -> &f64 {
        &self.output
    }

    fn into_output(self) -> f64 {
        self.output
    }
}

/// Single-node trapezoid quadrature.
#[derive(Debug, Clone)]
pub struct TrapezoidSeq {
    integral: Integral,
    integrand: Integrand,
    output: f64,
}

impl TrapezoidSeq {
    pub fn new(integral: Integral) -> Self {
        Self::with_integrand(integral, sum_of_squares)
    }

    pub fn with_integrand(integral: Integral, integrand: Integrand) -> Self {
        Self {
            integral,
            integrand,
            output: 0.0,
        }
    }
}

#[async_trait]
impl Task for TrapezoidSeq {
    type Output = f64;

    fn name(&self) -> &'static str {
        "trapezoid_seq"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        self.integral.validate()?;
        Ok(())
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.output = 0.0;
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        let sum = weighted_sum(&self.integral, self.integrand, 0..self.integral.columns());
        let (hx, hy) = self.integral.step_sizes();
        self.output = sum * hx * hy;
        Ok(())
    }

    async fn post_process(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn output(&self) -> &f64 {
        &self.output
    }

    fn into_output(self) -> f64 {
        self.output
    }
}
