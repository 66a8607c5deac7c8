//! # Cluster Launcher
//!
//! Builds an in-process fabric, runs one task per node through the full
//! lifecycle and records the run in the telemetry registry.

use crate::config::{ConfigError, RuntimeConfig};
use shared_fabric::{run_nodes, Communicator, InMemoryEndpoint, InMemoryFabric, NodeTopology};
use shared_types::{FabricError, Payload, Task, TaskError, TaskRunner};
use sr_01_star_relay::{Request, StarRelayTask};
use sr_compute::{ColumnMinTask, Integral, Matrix, TrapezoidTask};
use star_telemetry::{HistogramTimer, FABRIC_BYTES, FABRIC_MESSAGES, RELAY_RUNS, TASK_FAILURES};
use std::future::Future;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Errors that prevent a cluster run from completing.
///
/// Task failures on individual nodes are not errors at this level; they are
/// reported per node in [`ClusterReport::outputs`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fabric error: {0}")]
    Fabric(#[from] FabricError),
}

/// Outcome of one cluster run.
#[derive(Debug)]
pub struct ClusterReport<O> {
    /// Correlation id attached to every log line of the run.
    pub run_id: Uuid,
    /// Name of the task that ran.
    pub task: &'static str,
    /// Per-node results, ordered by node id.
    pub outputs: Vec<Result<O, TaskError>>,
    /// Envelopes exchanged.
    pub messages: u64,
    /// Encoded body bytes exchanged.
    pub bytes: u64,
    /// Collective operations entered, summed over nodes.
    pub collectives: u64,
}

impl<O> ClusterReport<O> {
    /// True when every node completed its lifecycle.
    pub fn succeeded(&self) -> bool {
        self.outputs.iter().all(Result::is_ok)
    }

    /// Number of nodes whose lifecycle failed.
    pub fn failures(&self) -> usize {
        self.outputs.iter().filter(|o| o.is_err()).count()
    }
}

/// Drive `runner` through every phase, timing it and counting failures.
pub async fn execute_tracked<T: Task>(runner: &mut TaskRunner<T>) -> Result<(), TaskError> {
    let name = runner.task().name();
    let _timer = HistogramTimer::for_task(name);

    let result = runner.execute().await;
    if let Err(e) = &result {
        TASK_FAILURES.with_label_values(&[name]).inc();
        warn!(task = name, stage = ?runner.stage(), error = %e, "Task failed");
    }
    result
}

async fn launch<F, Fut, O>(
    config: &RuntimeConfig,
    task: &'static str,
    node_fn: F,
) -> Result<ClusterReport<O>, RuntimeError>
where
    F: Fn(Communicator<InMemoryEndpoint>) -> Fut,
    Fut: Future<Output = Result<O, TaskError>> + Send + 'static,
    O: Send + 'static,
{
    config.validate()?;

    let run_id = Uuid::new_v4();
    let fabric = InMemoryFabric::with_config(config.nodes, config.fabric_config())?;
    let stats = fabric.stats();

    let span = info_span!("cluster_run", %run_id, task, nodes = config.nodes);
    let outputs = run_nodes(fabric, node_fn).instrument(span).await?;

    FABRIC_MESSAGES.inc_by(stats.messages() as f64);
    FABRIC_BYTES.inc_by(stats.bytes() as f64);

    let report = ClusterReport {
        run_id,
        task,
        outputs,
        messages: stats.messages(),
        bytes: stats.bytes(),
        collectives: stats.collectives(),
    };
    info!(
        %run_id,
        task,
        nodes = config.nodes,
        failures = report.failures(),
        messages = report.messages,
        bytes = report.bytes,
        "Cluster run finished"
    );
    Ok(report)
}

/// Relay `request` across a cluster. Every node is given the same request;
/// the hub's addressing is the one adopted.
pub async fn run_relay(
    config: &RuntimeConfig,
    request: Request,
) -> Result<ClusterReport<Payload>, RuntimeError> {
    let policy = config.policy;
    launch(config, "star_relay", move |comm| {
        let task = StarRelayTask::new(comm, request.clone()).with_policy(policy);
        async move {
            let mut runner = TaskRunner::new(task);
            execute_tracked(&mut runner).await?;
            if let Some(case) = runner.task().case() {
                RELAY_RUNS.with_label_values(&[case.as_str()]).inc();
            }
            Ok(runner.into_output())
        }
    })
    .await
}

/// Integrate `x² + y²` over `integral` across a cluster.
pub async fn run_quadrature(
    config: &RuntimeConfig,
    integral: Integral,
) -> Result<ClusterReport<f64>, RuntimeError> {
    launch(config, "trapezoid", move |comm| async move {
        let mut runner = TaskRunner::new(TrapezoidTask::new(comm, integral));
        execute_tracked(&mut runner).await?;
        Ok(runner.into_output())
    })
    .await
}

/// Column minima of `matrix`, which only the hub holds.
pub async fn run_column_min(
    config: &RuntimeConfig,
    matrix: Matrix,
) -> Result<ClusterReport<Payload>, RuntimeError> {
    launch(config, "column_min", move |comm| {
        let local = if comm.is_hub() {
            matrix.clone()
        } else {
            Matrix::new()
        };
        async move {
            let mut runner = TaskRunner::new(ColumnMinTask::new(comm, local));
            execute_tracked(&mut runner).await?;
            Ok(runner.into_output())
        }
    })
    .await
}
