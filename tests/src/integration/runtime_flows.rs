//! # Runtime Flows
//!
//! The `node-runtime` launchers end to end: parsing command line input,
//! running the cluster and exporting metrics.

#[cfg(test)]
mod tests {
    use crate::fixtures::within_timeout;
    use node_runtime::{
        parse_matrix, parse_payload, run_column_min, run_quadrature, run_relay, RuntimeConfig,
    };
    use shared_types::TaskError;
    use sr_01_star_relay::{DeliveryPolicy, Request};
    use sr_compute::Integral;
    use star_telemetry::{encode_metrics, register_metrics};
    use std::time::Duration;

    #[tokio::test]
    async fn test_relay_from_command_line_input() {
        let payload = parse_payload("100,200,300").unwrap();
        let report = within_timeout(run_relay(&RuntimeConfig::new(3), Request::new(1, 0, payload)))
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.outputs[0], Ok(vec![100, 200, 300]));
        assert_eq!(report.outputs[1], Ok(Vec::new()));
        assert_eq!(report.outputs[2], Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_replicated_relay_report() {
        let config = RuntimeConfig::new(5).with_policy(DeliveryPolicy::ReplicateToAll);
        let report = within_timeout(run_relay(&config, Request::new(3, 4, vec![1, 2])))
            .await
            .unwrap();
        assert_eq!(report.outputs, vec![Ok(vec![1, 2]); 5]);
    }

    #[tokio::test]
    async fn test_column_min_from_command_line_input() {
        let matrix = parse_matrix("3,7,2,8;1,9,6,4;5,2,8,3;7,1,4,9").unwrap();
        let report = within_timeout(run_column_min(&RuntimeConfig::new(3), matrix))
            .await
            .unwrap();
        assert_eq!(report.outputs, vec![Ok(vec![1, 1, 2, 3]); 3]);
    }

    #[tokio::test]
    async fn test_ragged_matrix_fails_every_node() {
        let matrix = parse_matrix("1,2;3").unwrap();
        let report = within_timeout(run_column_min(&RuntimeConfig::new(2), matrix))
            .await
            .unwrap();
        assert_eq!(report.failures(), 2);
    }

    #[tokio::test]
    async fn test_quadrature_report() {
        let integral = Integral::new((0.0, 2.0), (0.0, 3.0), (100, 100));
        let report = within_timeout(run_quadrature(&RuntimeConfig::new(4), integral))
            .await
            .unwrap();
        for value in report.outputs {
            assert!((value.unwrap() - 26.0).abs() < 1e-2);
        }
    }

    #[tokio::test]
    async fn test_relay_metrics_exported() {
        register_metrics().unwrap();
        within_timeout(run_relay(&RuntimeConfig::new(4), Request::new(0, 3, vec![1])))
            .await
            .unwrap();

        let text = encode_metrics().unwrap();
        assert!(text.contains("sr_relay_runs_total{case=\"hub_to_spoke\"}"));
        assert!(text.contains("sr_fabric_messages_total"));
        assert!(text.contains("sr_task_duration_seconds_bucket"));
    }

    #[tokio::test]
    async fn test_stall_timeout_leaves_healthy_run_alone() {
        let config = RuntimeConfig::new(4).with_stall_timeout(Duration::from_millis(500));
        let report = within_timeout(run_relay(&config, Request::new(2, 3, vec![6, 6])))
            .await
            .unwrap();
        assert!(report.succeeded());
        assert_eq!(report.outputs[3], Ok(vec![6, 6]));
    }

    #[tokio::test]
    async fn test_spoke_address_on_single_node_rejected() {
        let config = RuntimeConfig::new(1).with_stall_timeout(Duration::from_millis(20));
        let report = within_timeout(run_relay(&config, Request::new(0, 1, vec![])))
            .await
            .unwrap();
        assert!(matches!(report.outputs[0], Err(TaskError::Validation(_))));
    }
}
