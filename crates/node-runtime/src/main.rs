//! # Star-Relay Node Runtime
//!
//! The `star-node` executable. Every subcommand launches an in-process star
//! cluster, drives one task through its lifecycle on every node and prints
//! what each node holds afterwards.
//!
//! ## Subcommands
//!
//! - `relay` - route a payload from `--source` to `--destination`
//! - `quadrature` - trapezoid integral of `x² + y²` over a rectangle
//! - `column-min` - column minima of a matrix held by the hub
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line (`STAR_NODES` backs `--nodes`)
//! 2. Initialize telemetry from `STAR_*` environment variables
//! 3. Validate the runtime configuration
//! 4. Run the cluster and report per-node outputs

use std::fmt::Debug;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use node_runtime::{
    parse_matrix, parse_payload, run_column_min, run_quadrature, run_relay, ClusterReport,
    RuntimeConfig, DEFAULT_NODES,
};
use sr_01_star_relay::{DeliveryPolicy, Request};
use sr_compute::Integral;
use star_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

/// Star-Relay: hub-and-spoke relay over an in-process cluster
#[derive(Parser, Debug)]
#[command(name = "star-node")]
#[command(about = "Run star-topology tasks on an in-process cluster", version)]
struct Cli {
    /// Number of nodes, hub included
    #[arg(long, global = true, env = "STAR_NODES", default_value_t = DEFAULT_NODES)]
    nodes: usize,

    /// Fail a node whose peer stays silent for this many milliseconds
    #[arg(long, global = true)]
    stall_timeout_ms: Option<u64>,

    /// Print Prometheus metrics after the run
    #[arg(long, global = true)]
    metrics: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Relay a payload between two nodes
    Relay {
        /// Node the payload starts at
        #[arg(long, default_value_t = 0)]
        source: usize,

        /// Node the payload must reach
        #[arg(long, default_value_t = 0)]
        destination: usize,

        /// Comma separated integers
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        payload: String,

        /// Leave the payload on every node instead of the destination only
        #[arg(long)]
        replicate: bool,
    },

    /// Integrate x² + y² with the trapezoid rule
    Quadrature {
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x0: f64,
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        x1: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y0: f64,
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        y1: f64,
        /// Steps along x
        #[arg(long, default_value_t = 100)]
        nx: usize,
        /// Steps along y
        #[arg(long, default_value_t = 100)]
        ny: usize,
    },

    /// Column minima of a matrix such as "3,7;1,9"
    ColumnMin {
        #[arg(long, allow_hyphen_values = true)]
        matrix: String,
    },
}

impl Cli {
    fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::new(self.nodes);
        if let Some(ms) = self.stall_timeout_ms {
            config = config.with_stall_timeout(Duration::from_millis(ms));
        }
        if let Command::Relay {
            replicate: true, ..
        } = self.command
        {
            config = config.with_policy(DeliveryPolicy::ReplicateToAll);
        }
        config
    }
}

fn print_report<O: Debug + Serialize>(report: &ClusterReport<O>, as_json: bool) -> Result<()> {
    if as_json {
        let nodes: Vec<_> = report
            .outputs
            .iter()
            .enumerate()
            .map(|(node, output)| match output {
                Ok(value) => json!({ "node": node, "output": value }),
                Err(e) => json!({ "node": node, "error": e.to_string() }),
            })
            .collect();
        let document = json!({
            "run_id": report.run_id.to_string(),
            "task": report.task,
            "nodes": nodes,
            "messages": report.messages,
            "bytes": report.bytes,
            "collectives": report.collectives,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("run {} ({})", report.run_id, report.task);
        for (node, output) in report.outputs.iter().enumerate() {
            match output {
                Ok(value) => println!("  node {node}: {value:?}"),
                Err(e) => println!("  node {node}: error: {e}"),
            }
        }
        println!(
            "  {} messages, {} bytes, {} collectives",
            report.messages, report.bytes, report.collectives
        );
    }

    if !report.succeeded() {
        bail!("{} of {} nodes failed", report.failures(), report.outputs.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = cli.runtime_config();
    config.validate().context("Invalid runtime configuration")?;
    info!(nodes = config.nodes, policy = ?config.policy, "Starting cluster");

    let outcome = match &cli.command {
        Command::Relay {
            source,
            destination,
            payload,
            ..
        } => {
            let payload = parse_payload(payload)?;
            let report = run_relay(&config, Request::new(*source, *destination, payload)).await?;
            print_report(&report, cli.json)
        }
        Command::Quadrature {
            x0,
            x1,
            y0,
            y1,
            nx,
            ny,
        } => {
            let integral = Integral::new((*x0, *x1), (*y0, *y1), (*nx, *ny));
            let report = run_quadrature(&config, integral).await?;
            print_report(&report, cli.json)
        }
        Command::ColumnMin { matrix } => {
            let matrix = parse_matrix(matrix)?;
            let report = run_column_min(&config, matrix).await?;
            print_report(&report, cli.json)
        }
    };

    if cli.metrics {
        print!("{}", encode_metrics()?);
    }
    outcome
}
