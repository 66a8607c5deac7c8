//! # Relay Scenarios
//!
//! Exhaustive relay runs across cluster sizes and addressing:
//!
//! 1. **Delivery**: for every `(source, destination)` pair with N = 1..=6,
//!    exactly the entitled nodes hold the payload
//! 2. **Agreement**: the hub's addressing wins over local proposals
//! 3. **Stability**: repeated runs and empty payloads behave identically
//! 4. **Stalls**: an absent peer surfaces as a fabric error once a stall
//!    timeout is configured

#[cfg(test)]
mod tests {
    use crate::fixtures::{outputs, random_payload, relay_on_cluster, relay_with};
    use shared_fabric::FabricConfig;
    use shared_types::{FabricError, NodeId, TaskError, TaskStage, HUB};
    use sr_01_star_relay::{
        invariant_delivery, AgreedParams, DeliveryPolicy, Request, RoutingCase, MIN_RELAY_NODES,
    };
    use std::time::Duration;

    // =============================================================================
    // DELIVERY
    // =============================================================================

    async fn assert_all_pairs(policy: DeliveryPolicy) {
        for nodes in 1..=6 {
            for source in 0..nodes {
                for destination in 0..nodes {
                    let payload = random_payload(1 + source + destination);
                    let request = Request::new(source, destination, payload.clone());
                    let outcomes = relay_on_cluster(nodes, policy, request).await;

                    let params = AgreedParams {
                        source: NodeId::new(source),
                        destination: NodeId::new(destination),
                        length: payload.len(),
                    };
                    let expected_case = RoutingCase::resolve(&params, nodes);
                    for outcome in &outcomes {
                        assert_eq!(outcome.case, Some(expected_case));
                        assert_eq!(outcome.agreed, Some(params));
                        assert_eq!(outcome.stage, TaskStage::PostProcessed);
                    }

                    let outputs = outputs(&outcomes);
                    assert!(
                        invariant_delivery(&params, policy, &payload, &outputs),
                        "nodes={nodes} source={source} destination={destination} \
                         policy={policy:?} outputs={outputs:?}"
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_every_pair_destination_only() {
        assert_all_pairs(DeliveryPolicy::DestinationOnly).await;
    }

    #[tokio::test]
    async fn test_every_pair_replicated() {
        assert_all_pairs(DeliveryPolicy::ReplicateToAll).await;
    }

    #[tokio::test]
    async fn test_small_clusters_deliver_nothing() {
        for nodes in 1..MIN_RELAY_NODES {
            let outcomes = relay_on_cluster(
                nodes,
                DeliveryPolicy::ReplicateToAll,
                Request::new(0, nodes - 1, vec![1, 2, 3]),
            )
            .await;
            assert!(outcomes
                .iter()
                .all(|o| o.case == Some(RoutingCase::Degenerate)));
            assert!(outputs(&outcomes).iter().all(Vec::is_empty));
        }
    }

    #[tokio::test]
    async fn test_hub_to_hub_reaches_every_node() {
        let payload = vec![1, 2, 3, 4, 5];
        let request = Request::new(0, 0, payload.clone());
        let outcomes = relay_on_cluster(4, DeliveryPolicy::DestinationOnly, request).await;
        assert_eq!(outputs(&outcomes), vec![payload; 4]);
    }

    #[tokio::test]
    async fn test_spoke_to_spoke_skips_intermediaries() {
        for nodes in 4..=6 {
            let payload = vec![5, 10, 15, 20, 25];
            let outcomes = relay_on_cluster(
                nodes,
                DeliveryPolicy::DestinationOnly,
                Request::new(1, 3, payload.clone()),
            )
            .await;
            let outputs = outputs(&outcomes);
            assert_eq!(outputs[3], payload);
            assert!(outputs[0].is_empty(), "hub only forwards");
            assert!(outputs[1].is_empty(), "source keeps nothing");
        }
    }

    #[tokio::test]
    async fn test_self_relay_payload_held_by_source_only() {
        let outcomes = relay_with(
            4,
            DeliveryPolicy::DestinationOnly,
            FabricConfig::default(),
            |node| {
                let local = if node.index() == 2 { vec![7, 8, 9] } else { Vec::new() };
                Request::new(2, 2, local)
            },
        )
        .await;

        for outcome in &outcomes {
            assert_eq!(outcome.case, Some(RoutingCase::SelfRelay));
            assert_eq!(outcome.agreed.map(|agreed| agreed.length), Some(0));
        }
        assert_eq!(outputs(&outcomes), vec![vec![], vec![], vec![7, 8, 9], vec![]]);
    }

    // =============================================================================
    // AGREEMENT
    // =============================================================================

    #[tokio::test]
    async fn test_hub_addressing_wins() {
        // Every spoke proposes a self relay; the hub proposes 1 -> 2.
        let hub_payload = vec![10, 20, 30, 40];
        let outcomes = relay_with(5, DeliveryPolicy::DestinationOnly, FabricConfig::default(), {
            let hub_payload = hub_payload.clone();
            move |node| {
                if node == HUB {
                    Request::new(1, 2, hub_payload.clone())
                } else {
                    Request::new(node, node, vec![-1; node.index()])
                }
            }
        })
        .await;

        for outcome in &outcomes {
            let agreed = outcome.agreed.expect("agreed");
            assert_eq!(agreed.source, NodeId::new(1));
            assert_eq!(agreed.destination, NodeId::new(2));
            assert_eq!(agreed.length, hub_payload.len());
            assert_eq!(outcome.case, Some(RoutingCase::SpokeToSpoke));
        }
        let outputs = outputs(&outcomes);
        assert_eq!(outputs[2], hub_payload);
        assert_eq!(outputs.iter().filter(|o| !o.is_empty()).count(), 1);
    }

    #[tokio::test]
    async fn test_local_addressing_checked_before_agreement() {
        // A spoke with out-of-range addressing fails validation locally. The
        // others cannot complete the agreement and fail on the fabric.
        let outcomes = relay_with(
            3,
            DeliveryPolicy::DestinationOnly,
            FabricConfig::with_stall_timeout(Duration::from_millis(50)),
            |node| {
                if node.index() == 2 {
                    Request::new(0, 9, vec![1])
                } else {
                    Request::new(0, 1, vec![1])
                }
            },
        )
        .await;

        assert!(matches!(outcomes[2].output, Err(TaskError::Validation(_))));
        assert_eq!(outcomes[2].stage, TaskStage::Failed);
        assert!(outcomes[2].agreed.is_none());
        for outcome in &outcomes[..2] {
            assert!(
                matches!(
                    outcome.output,
                    Err(TaskError::Fabric(
                        FabricError::Stalled { .. } | FabricError::PeerDisconnected(_)
                    ))
                ),
                "{:?}",
                outcome.output
            );
        }
    }

    // =============================================================================
    // STABILITY
    // =============================================================================

    #[tokio::test]
    async fn test_rerun_yields_same_outcome() {
        let request = Request::new(2, 1, vec![100, 200, 300]);
        let first = relay_on_cluster(4, DeliveryPolicy::DestinationOnly, request.clone()).await;
        let second = relay_on_cluster(4, DeliveryPolicy::DestinationOnly, request).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_payload_completes_every_case() {
        for policy in [DeliveryPolicy::DestinationOnly, DeliveryPolicy::ReplicateToAll] {
            for (source, destination) in [(0, 0), (0, 2), (1, 0), (1, 2), (2, 2)] {
                let outcomes =
                    relay_on_cluster(4, policy, Request::new(source, destination, Vec::new()))
                        .await;
                assert!(outcomes.iter().all(|o| o.stage == TaskStage::PostProcessed));
                assert!(outputs(&outcomes).iter().all(Vec::is_empty));
            }
        }
    }

    #[tokio::test]
    async fn test_large_payload_spoke_to_hub() {
        let payload = random_payload(100_000);
        let request = Request::new(1, 0, payload.clone());
        let outcomes = relay_on_cluster(3, DeliveryPolicy::DestinationOnly, request).await;
        let outputs = outputs(&outcomes);
        assert_eq!(outputs[0], payload);
        assert!(outputs[1].is_empty());
        assert!(outputs[2].is_empty());
    }
}
