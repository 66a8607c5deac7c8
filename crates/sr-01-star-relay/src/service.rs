//! # Relay Service
//!
//! The relay as a lifecycle task: [`StarRelayTask`] runs on every node of a
//! cluster, [`StarRelaySeq`] is the single-node variant.

use crate::algorithms::{agree, RoutingEngine};
use crate::domain::{
    invariant_addressing_in_range, AgreedParams, DeliveryPolicy, PayloadBuffer, RelayError,
    Request, RoutingCase,
};
use async_trait::async_trait;
use shared_fabric::{Communicator, NodeTopology, Transport};
use shared_types::{NodeId, Payload, Task, TaskError};
use tracing::info;

/// Distributed relay of one payload.
///
/// Construct one per node with the same addressing. Drive it with
/// [`TaskRunner`](shared_types::TaskRunner) so the phases run in order.
pub struct StarRelayTask<T: Transport> {
    comm: Communicator<T>,
    request: Request,
    engine: RoutingEngine,
    buffer: PayloadBuffer,
    agreed: Option<AgreedParams>,
    case: Option<RoutingCase>,
}

impl<T: Transport> StarRelayTask<T> {
    /// Relay `request` with destination-only delivery.
    pub fn new(comm: Communicator<T>, request: Request) -> Self {
        Self {
            comm,
            request,
            engine: RoutingEngine::default(),
            buffer: PayloadBuffer::new(),
            agreed: None,
            case: None,
        }
    }

    /// Use another delivery policy.
    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.engine = RoutingEngine::new(policy);
        self
    }

    /// Id of the node this task runs on.
    pub fn node(&self) -> NodeId {
        self.comm.self_id()
    }

    /// Parameters adopted during the last run.
    pub fn agreed(&self) -> Option<&AgreedParams> {
        self.agreed.as_ref()
    }

    /// Routing case resolved during the last run.
    pub fn case(&self) -> Option<RoutingCase> {
        self.case
    }
}

#[async_trait]
impl<T: Transport> Task for StarRelayTask<T> {
    type Output = Payload;

    fn name(&self) -> &'static str {
        "star_relay"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        invariant_addressing_in_range(
            self.request.source,
            self.request.destination,
            self.comm.node_count(),
        )?;
        Ok(())
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.buffer.clear();
        self.agreed = None;
        self.case = None;
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        let agreed = agree(&mut self.comm, &self.request).await?;
        self.agreed = Some(agreed);

        let case = self
            .engine
            .route(&mut self.comm, &agreed, &self.request.payload, &mut self.buffer)
            .await?;
        self.case = Some(case);

        info!(
            node = %self.comm.self_id(),
            %case,
            source = %agreed.source,
            destination = %agreed.destination,
            len = self.buffer.output().len(),
            "Relay completed"
        );
        Ok(())
    }

    async fn post_process(&mut self) -> Result<(), TaskError> {
        if self.agreed.is_none() {
            return Err(RelayError::ParametersNotAgreed.into());
        }
        Ok(())
    }

    fn output(&self) -> &Payload {
        self.buffer.output()
    }

    fn into_output(self) -> Payload {
        self.buffer.into_output()
    }
}

/// Relay on a single node: node `0` to node `0`, the payload is copied.
#[derive(Clone, Debug)]
pub struct StarRelaySeq {
    request: Request,
    output: Payload,
}

impl StarRelaySeq {
    /// Create the sequential relay.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            output: Payload::new(),
        }
    }
}

#[async_trait]
impl Task for StarRelaySeq {
    type Output = Payload;

    fn name(&self) -> &'static str {
        "star_relay_seq"
    }

    async fn validate(&mut self) -> Result<(), TaskError> {
        invariant_addressing_in_range(self.request.source, self.request.destination, 1)?;
        Ok(())
    }

    async fn pre_process(&mut self) -> Result<(), TaskError> {
        self.output.clear();
        Ok(())
    }

    async fn run(&mut self) -> Result<(), TaskError> {
        self.output = self.request.payload.clone();
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
