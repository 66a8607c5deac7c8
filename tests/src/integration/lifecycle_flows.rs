//! # Lifecycle Flows
//!
//! Phase ordering with real tasks instead of test doubles: a cluster stepping
//! through the phases one at a time, rejected out-of-order calls and the
//! single-node relay.

#[cfg(test)]
mod tests {
    use crate::fixtures::within_timeout;
    use shared_fabric::{run_nodes, InMemoryFabric};
    use shared_types::{Task, TaskError, TaskRunner, TaskStage};
    use sr_01_star_relay::{Request, StarRelaySeq, StarRelayTask};
    use sr_compute::{ColumnMinSeq, Integral, TrapezoidSeq};

    #[tokio::test]
    async fn test_cluster_steps_through_phases() {
        let fabric = InMemoryFabric::new(3).unwrap();
        let run = run_nodes(fabric, |comm| async move {
            let request = Request::new(0, 2, vec![4, 5]);
            let mut runner = TaskRunner::new(StarRelayTask::new(comm, request));
            let mut stages = Vec::new();

            runner.validation().await?;
            stages.push(runner.stage());
            runner.pre_processing().await?;
            assert!(runner.output().is_empty());
            stages.push(runner.stage());
            runner.run().await?;
            stages.push(runner.stage());
            runner.post_processing().await?;
            stages.push(runner.stage());

            Ok::<_, TaskError>((stages, runner.into_output()))
        });
        let results = within_timeout(run).await.unwrap();

        for (node, result) in results.into_iter().enumerate() {
            let (stages, output) = result.unwrap();
            assert_eq!(
                stages,
                vec![
                    TaskStage::Validated,
                    TaskStage::PreProcessed,
                    TaskStage::Ran,
                    TaskStage::PostProcessed,
                ]
            );
            let expected = if node == 2 { vec![4, 5] } else { Vec::new() };
            assert_eq!(output, expected);
        }
    }

    #[tokio::test]
    async fn test_run_without_validation_is_rejected_locally() {
        // Rejected before any transfer, so no node blocks.
        let fabric = InMemoryFabric::new(3).unwrap();
        let run = run_nodes(fabric, |comm| async move {
            let mut runner = TaskRunner::new(StarRelayTask::new(comm, Request::new(0, 1, vec![1])));
            let result = runner.run().await;
            (result, runner.stage())
        });
        for (result, stage) in within_timeout(run).await.unwrap() {
            assert_eq!(
                result,
                Err(TaskError::OutOfOrder {
                    from: TaskStage::Created,
                    to: TaskStage::Ran,
                })
            );
            assert_eq!(stage, TaskStage::Created);
        }
    }

    #[tokio::test]
    async fn test_failed_task_refuses_further_phases() {
        let mut runner = TaskRunner::new(StarRelaySeq::new(Request::new(0, 1, vec![1])));
        assert!(matches!(
            runner.validation().await,
            Err(TaskError::Validation(_))
        ));
        assert_eq!(runner.stage(), TaskStage::Failed);
        assert!(matches!(
            runner.pre_processing().await,
            Err(TaskError::OutOfOrder {
                from: TaskStage::Failed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_sequential_relay_copies_payload() {
        let mut runner = TaskRunner::new(StarRelaySeq::new(Request::new(0, 0, vec![9, 8, 7])));
        runner.execute().await.unwrap();
        assert_eq!(runner.output(), &vec![9, 8, 7]);
        assert_eq!(runner.task().name(), "star_relay_seq");
    }

    #[tokio::test]
    async fn test_sequential_tasks_share_the_contract() {
        let mut quadrature = TaskRunner::new(TrapezoidSeq::new(Integral::new(
            (0.0, 1.0),
            (0.0, 1.0),
            (0, 4),
        )));
        assert!(matches!(
            quadrature.execute().await,
            Err(TaskError::Validation(_))
        ));

        let mut minima = TaskRunner::new(ColumnMinSeq::new(vec![vec![2, 1], vec![0, 3]]));
        minima.execute().await.unwrap();
        assert_eq!(minima.output(), &vec![0, 1]);
        assert!(minima.execute().await.is_err(), "a lifecycle runs once");
    }
}
