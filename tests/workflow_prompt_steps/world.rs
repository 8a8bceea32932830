//! Shared world state for workflow prompt scenarios.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rsp_conductor::rsp::{adapters::ScriptedUi, domain::Status};
use rsp_conductor::workflow::{
    domain::{WorkflowResponse, WorkflowResult},
    services::{WorkflowOutcome, WorkflowRound, WorkflowSubmitter},
};
use rstest::fixture;

/// Submitter that answers rounds from a queue and records what it saw.
#[derive(Default)]
pub struct ScriptedServer {
    responses: Mutex<VecDeque<WorkflowResponse>>,
    rounds: Mutex<Vec<WorkflowRound>>,
}

impl ScriptedServer {
    /// Queues the response for the next unanswered round.
    pub fn respond(&self, response: WorkflowResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    /// Rounds submitted so far.
    pub fn rounds(&self) -> Vec<WorkflowRound> {
        self.rounds
            .lock()
            .map(|rounds| rounds.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WorkflowSubmitter for ScriptedServer {
    async fn submit(&self, round: WorkflowRound) -> WorkflowResult<WorkflowResponse> {
        if let Ok(mut rounds) = self.rounds.lock() {
            rounds.push(round);
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        Ok(next.unwrap_or_else(|| WorkflowResponse::terminal(Status::ok())))
    }
}

/// Scenario state for workflow runs.
pub struct WorkflowWorld {
    /// Scripted user answers.
    pub ui: ScriptedUi,
    /// Server side of the workflow.
    pub server: Arc<ScriptedServer>,
    /// Outcome of the last run, or its error message.
    pub outcome: Option<Result<WorkflowOutcome<Status>, String>>,
}

impl WorkflowWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ui: ScriptedUi::new(),
            server: Arc::new(ScriptedServer::default()),
            outcome: None,
        }
    }
}

impl Default for WorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture providing a fresh world.
#[fixture]
pub fn world() -> WorkflowWorld {
    WorkflowWorld::new()
}

/// Runs a future to completion from a synchronous step.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
