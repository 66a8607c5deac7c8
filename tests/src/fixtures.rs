//! # Cluster Fixtures
//!
//! Launch helpers shared by the integration scenarios and the benchmarks.

use rand::Rng;
use shared_fabric::{run_nodes, FabricConfig, InMemoryFabric, NodeTopology};
use shared_types::{NodeId, Payload, TaskError, TaskRunner, TaskStage};
use sr_01_star_relay::{AgreedParams, DeliveryPolicy, Request, RoutingCase, StarRelayTask};
use std::future::Future;
use std::time::Duration;

/// Upper bound for any single cluster scenario.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

/// What one node reports after a relay.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub output: Result<Payload, TaskError>,
    pub case: Option<RoutingCase>,
    pub agreed: Option<AgreedParams>,
    pub stage: TaskStage,
}

/// Await `future`, panicking if the cluster does not finish in time.
pub async fn within_timeout<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(SCENARIO_TIMEOUT, future)
        .await
        .expect("cluster scenario stalled")
}

/// Run a relay where node `i` is constructed with `request_for(i)`.
pub async fn relay_with<F>(
    nodes: usize,
    policy: DeliveryPolicy,
    config: FabricConfig,
    request_for: F,
) -> Vec<RelayOutcome>
where
    F: Fn(NodeId) -> Request,
{
    let fabric = InMemoryFabric::with_config(nodes, config).expect("fabric");
    let run = run_nodes(fabric, |comm| {
        let request = request_for(comm.self_id());
        async move {
            let mut runner = TaskRunner::new(StarRelayTask::new(comm, request).with_policy(policy));
            let result = runner.execute().await;
            let stage = runner.stage();
            let case = runner.task().case();
            let agreed = runner.task().agreed().copied();
            RelayOutcome {
                output: result.map(|()| runner.into_output()),
                case,
                agreed,
                stage,
            }
        }
    });
    within_timeout(run).await.expect("cluster run")
}

/// Run a relay where every node is constructed with the same request.
pub async fn relay_on_cluster(
    nodes: usize,
    policy: DeliveryPolicy,
    request: Request,
) -> Vec<RelayOutcome> {
    relay_with(nodes, policy, FabricConfig::default(), |_| request.clone()).await
}

/// Successful outputs of every node, panicking on any node failure.
pub fn outputs(outcomes: &[RelayOutcome]) -> Vec<Payload> {
    outcomes
        .iter()
        .enumerate()
        .map(|(node, outcome)| match &outcome.output {
            Ok(output) => output.clone(),
            Err(e) => panic!("node {node} failed: {e}"),
        })
        .collect()
}

/// Random payload of `len` elements.
pub fn random_payload(len: usize) -> Payload {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}
