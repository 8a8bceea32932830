//! Multi-round workflow driver.

use super::strategy::WorkflowStrategies;
use crate::rsp::{domain::Severity, domain::Status, ports::UserInterface};
use crate::workflow::domain::{
    ResponseMap, WorkflowError, WorkflowRequestId, WorkflowResponse, WorkflowResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default cap on protocol round-trips in one workflow run.
pub const DEFAULT_ROUND_LIMIT: usize = 64;

/// Payload for one workflow request.
///
/// The first round of [`WorkflowEngine::run`] carries no correlation id and
/// no data. Every later round carries the accumulated answers, even when
/// that map is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowRound {
    /// Correlation id echoed from the previous response.
    pub request_id: Option<WorkflowRequestId>,
    /// Answers accumulated so far.
    pub data: Option<ResponseMap>,
}

/// Sends workflow rounds for one request shape.
///
/// Each call site (runtime download, server action, server creation)
/// supplies its own implementation; the engine is request-shape agnostic.
#[async_trait]
pub trait WorkflowSubmitter: Send + Sync {
    /// Sends one round and returns the server's response.
    async fn submit(&self, round: WorkflowRound) -> WorkflowResult<WorkflowResponse>;
}

/// How a workflow run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome<T> {
    /// The server reported success.
    Completed(T),
    /// The user dismissed a prompt.
    Canceled,
}

impl<T> WorkflowOutcome<T> {
    /// Returns the completion value, or `None` when canceled.
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Canceled => None,
        }
    }

    /// Returns whether the user canceled.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

enum Step {
    Completed(Status),
    Resolve(WorkflowResponse),
}

/// Drives request, resolve and resubmit loops until the server terminates.
pub struct WorkflowEngine<U>
where
    U: UserInterface + ?Sized,
{
    strategies: WorkflowStrategies<U>,
    round_limit: usize,
}

impl<U> Clone for WorkflowEngine<U>
where
    U: UserInterface + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
            round_limit: self.round_limit,
        }
    }
}

impl<U> WorkflowEngine<U>
where
    U: UserInterface + ?Sized,
{
    /// Creates an engine with the default round cap.
    #[must_use]
    pub const fn new(ui: Arc<U>) -> Self {
        Self {
            strategies: WorkflowStrategies::new(ui),
            round_limit: DEFAULT_ROUND_LIMIT,
        }
    }

    /// Overrides the round cap. A cap of zero is raised to one.
    #[must_use]
    pub fn with_round_limit(mut self, round_limit: usize) -> Self {
        self.round_limit = round_limit.max(1);
        self
    }

    /// Returns the round cap.
    #[must_use]
    pub const fn round_limit(&self) -> usize {
        self.round_limit
    }

    /// Runs a workflow and returns only the terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Rejected`] when the server reports an error
    /// or cancellation, [`WorkflowError::RoundLimitExceeded`] when the
    /// server never terminates, and item resolution or transport errors.
    pub async fn run(
        &self,
        submitter: &dyn WorkflowSubmitter,
    ) -> WorkflowResult<WorkflowOutcome<Status>> {
        let run = Run::new(self, ResponseMap::new());
        let first = submitter.submit(WorkflowRound::default()).await?;
        let outcome = run.drive(first, submitter, false).await?;
        Ok(into_status(outcome))
    }

    /// Runs a workflow seeded with `seed`, returning the terminal status
    /// together with every answer collected.
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::run`].
    pub async fn run_collecting(
        &self,
        submitter: &dyn WorkflowSubmitter,
        seed: ResponseMap,
    ) -> WorkflowResult<WorkflowOutcome<(Status, ResponseMap)>> {
        let run = Run::new(self, seed);
        let first = submitter.submit(run.round(None)).await?;
        run.drive(first, submitter, false).await
    }

    /// Continues a workflow whose first response was obtained elsewhere.
    ///
    /// The prelude's items are resolved and the answers are always
    /// submitted, even when the prelude status is already ok.
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::run`].
    pub async fn resume(
        &self,
        prelude: WorkflowResponse,
        submitter: &dyn WorkflowSubmitter,
    ) -> WorkflowResult<WorkflowOutcome<Status>> {
        let run = Run::new(self, ResponseMap::new());
        let outcome = run.drive(prelude, submitter, true).await?;
        Ok(into_status(outcome))
    }
}

fn into_status(
    outcome: WorkflowOutcome<(Status, ResponseMap)>,
) -> WorkflowOutcome<Status> {
    match outcome {
        WorkflowOutcome::Completed((status, _)) => WorkflowOutcome::Completed(status),
        WorkflowOutcome::Canceled => WorkflowOutcome::Canceled,
    }
}

struct Run<'a, U>
where
    U: UserInterface + ?Sized,
{
    engine: &'a WorkflowEngine<U>,
    id: Uuid,
    responses: ResponseMap,
}

impl<'a, U> Run<'a, U>
where
    U: UserInterface + ?Sized,
{
    fn new(engine: &'a WorkflowEngine<U>, seed: ResponseMap) -> Self {
        Self {
            engine,
            id: Uuid::new_v4(),
            responses: seed,
        }
    }

    fn round(&self, request_id: Option<WorkflowRequestId>) -> WorkflowRound {
        WorkflowRound {
            request_id,
            data: Some(self.responses.clone()),
        }
    }

    async fn drive(
        mut self,
        first: WorkflowResponse,
        submitter: &dyn WorkflowSubmitter,
        resubmit_first: bool,
    ) -> WorkflowResult<WorkflowOutcome<(Status, ResponseMap)>> {
        let mut response = first;
        let mut force = resubmit_first;
        let mut rounds = 1_usize;
        loop {
            let step = if force {
                Step::Resolve(response)
            } else {
                classify(response)?
            };
            force = false;
            let pending = match step {
                Step::Completed(status) => {
                    info!(run = %self.id, rounds, "workflow completed");
                    return Ok(WorkflowOutcome::Completed((status, self.responses)));
                }
                Step::Resolve(pending) => pending,
            };

            for item in &pending.items {
                let outcome = self
                    .engine
                    .strategies
                    .resolve(item, &mut self.responses)
                    .await?;
                if outcome.is_canceled() {
                    info!(run = %self.id, item = %item.id, "workflow canceled by user");
                    return Ok(WorkflowOutcome::Canceled);
                }
            }

            if rounds >= self.engine.round_limit {
                warn!(run = %self.id, limit = self.engine.round_limit, "workflow round cap hit");
                return Err(WorkflowError::RoundLimitExceeded {
                    limit: self.engine.round_limit,
                });
            }
            rounds += 1;
            debug!(run = %self.id, round = rounds, request = ?pending.request_id, "resubmitting workflow");
            response = submitter.submit(self.round(pending.request_id)).await?;
        }
    }
}

fn classify(response: WorkflowResponse) -> WorkflowResult<Step> {
    match response.status.severity {
        Severity::Error | Severity::Cancel => Err(WorkflowError::Rejected(response.status)),
        Severity::Info => Ok(Step::Resolve(response)),
        Severity::Ok | Severity::Warning if !response.items.is_empty() => {
            Ok(Step::Resolve(response))
        }
        Severity::Ok => Ok(Step::Completed(response.status)),
        Severity::Warning => Err(WorkflowError::Rejected(response.status)),
    }
}
