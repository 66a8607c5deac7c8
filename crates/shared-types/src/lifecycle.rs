//! # Task Lifecycle
//!
//! Every distributed task is driven through four phases, each called exactly
//! once per logical execution and in this order on every node:
//!
//! ```text
//! Created ──validate──→ Validated ──pre_process──→ PreProcessed
//!                                                      │
//!                                                     run
//!                                                      ↓
//!                         PostProcessed ←──post_process── Ran
//! ```
//!
//! A failing phase moves the task to `Failed`; no further phase may run.
//! [`TaskRunner`] enforces the order so individual tasks only implement the
//! phase bodies.

use crate::errors::TaskError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Position of a task in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStage {
    /// Constructed, nothing has run yet.
    #[default]
    Created,
    /// Input accepted.
    Validated,
    /// Outputs cleared and sized.
    PreProcessed,
    /// Main phase completed.
    Ran,
    /// Lifecycle closed; output may be read.
    PostProcessed,
    /// A phase failed; the task is unusable.
    Failed,
}

impl TaskStage {
    /// Check if moving to `next` respects the phase order.
    pub fn can_transition_to(&self, next: TaskStage) -> bool {
        match (self, next) {
            (Self::Created, Self::Validated) => true,
            (Self::Validated, Self::PreProcessed) => true,
            (Self::PreProcessed, Self::Ran) => true,
            (Self::Ran, Self::PostProcessed) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Check if this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PostProcessed | Self::Failed)
    }
}

/// The four-phase contract every distributed task implements.
///
/// Phases are async because most of them synchronise with peer nodes.
#[async_trait]
pub trait Task: Send {
    /// Result held by this node after `post_process`.
    type Output: Send;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Check the input. Must not mutate the output.
    async fn validate(&mut self) -> Result<(), TaskError>;

    /// Reset the output so nothing leaks from a previous execution.
    async fn pre_process(&mut self) -> Result<(), TaskError>;

    /// Perform the distributed computation.
    async fn run(&mut self) -> Result<(), TaskError>;

    /// Close the lifecycle.
    async fn post_process(&mut self) -> Result<(), TaskError>;

    /// Output held by this node.
    fn output(&self) -> &Self::Output;

    /// Consume the task and return its output.
    fn into_output(self) -> Self::Output
    where
        Self: Sized;
}

/// Drives a [`Task`] through its phases in order.
pub struct TaskRunner<T: Task> {
    task: T,
    stage: TaskStage,
}

impl<T: Task> TaskRunner<T> {
    /// Wrap a freshly constructed task.
    pub fn new(task: T) -> Self {
        Self {
            task,
            stage: TaskStage::Created,
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> TaskStage {
        self.stage
    }

    /// Access the wrapped task.
    pub fn task(&self) -> &T {
        &self.task
    }

    /// Run the validate phase.
    pub async fn validation(&mut self) -> Result<(), TaskError> {
        self.enter(TaskStage::Validated)?;
        let result = self.task.validate().await;
        self.finish(TaskStage::Validated, result)
    }

    /// Run the pre-process phase.
    pub async fn pre_processing(&mut self) -> Result<(), TaskError> {
        self.enter(TaskStage::PreProcessed)?;
        let result = self.task.pre_process().await;
        self.finish(TaskStage::PreProcessed, result)
    }

    /// Run the main phase.
    pub async fn run(&mut self) -> Result<(), TaskError> {
        self.enter(TaskStage::Ran)?;
        let result = self.task.run().await;
        self.finish(TaskStage::Ran, result)
    }

    /// Run the post-process phase.
    pub async fn post_processing(&mut self) -> Result<(), TaskError> {
        self.enter(TaskStage::PostProcessed)?;
        let result = self.task.post_process().await;
        self.finish(TaskStage::PostProcessed, result)
    }

    /// Run all four phases in order, stopping at the first failure.
    pub async fn execute(&mut self) -> Result<(), TaskError> {
        self.validation().await?;
        self.pre_processing().await?;
        self.run().await?;
        self.post_processing().await
    }

    /// Output of the task. Only meaningful once post-processing completed.
    pub fn output(&self) -> &T::Output {
        self.task.output()
    }

    /// Consume the runner and return the task output.
    pub fn into_output(self) -> T::Output {
        self.task.into_output()
    }

    fn enter(&self, next: TaskStage) -> Result<(), TaskError> {
        if self.stage.can_transition_to(next) {
            Ok(())
        } else {
            Err(TaskError::OutOfOrder {
                from: self.stage,
                to: next,
            })
        }
    }

    fn finish(&mut self, next: TaskStage, result: Result<(), TaskError>) -> Result<(), TaskError> {
        match result {
            Ok(()) => {
                debug!(task = self.task.name(), stage = ?next, "Task phase completed");
                self.stage = next;
                Ok(())
            }
            Err(e) => {
                warn!(task = self.task.name(), stage = ?next, error = %e, "Task phase failed");
                self.stage = TaskStage::Failed;
                Err(e)
            }
        }
    }
}
