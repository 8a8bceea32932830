//! Then steps for workflow prompt scenarios.

use super::world::WorkflowWorld;
use eyre::{WrapErr, eyre};
use rsp_conductor::rsp::domain::Status;
use rsp_conductor::workflow::services::WorkflowOutcome;
use rstest_bdd_macros::then;
use serde_json::Value;

fn outcome(world: &WorkflowWorld) -> Result<&WorkflowOutcome<Status>, eyre::Report> {
    match world.outcome.as_ref() {
        Some(Ok(outcome)) => Ok(outcome),
        Some(Err(message)) => Err(eyre!("workflow failed: {message}")),
        None => Err(eyre!("workflow has not run")),
    }
}

#[then("the workflow completes")]
fn workflow_completes(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    match outcome(world)? {
        WorkflowOutcome::Completed(status) if status.is_ok() => Ok(()),
        other => Err(eyre!("expected successful completion, got {other:?}")),
    }
}

#[then("the workflow is canceled")]
fn workflow_canceled(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let result = outcome(world)?;
    if !result.is_canceled() {
        return Err(eyre!("expected cancellation, got {result:?}"));
    }
    Ok(())
}

#[then(r#"the workflow fails with "{message}""#)]
fn workflow_fails(world: &WorkflowWorld, message: String) -> Result<(), eyre::Report> {
    match world.outcome.as_ref() {
        Some(Err(error)) if error.contains(&message) => Ok(()),
        other => Err(eyre!("expected failure mentioning '{message}', got {other:?}")),
    }
}

#[then("the server received {count:usize} rounds")]
fn server_received_rounds(world: &WorkflowWorld, count: usize) -> Result<(), eyre::Report> {
    let rounds = world.server.rounds().len();
    if rounds != count {
        return Err(eyre!("expected {count} rounds, got {rounds}"));
    }
    Ok(())
}

#[then(r#"the last round answered "{item}" with true"#)]
fn last_round_answered(world: &WorkflowWorld, item: String) -> Result<(), eyre::Report> {
    let rounds = world.server.rounds();
    let last = rounds.last().ok_or_else(|| eyre!("no rounds submitted"))?;
    let answer = last
        .data
        .as_ref()
        .and_then(|data| data.get(&item))
        .cloned()
        .ok_or_else(|| eyre!("round carries no answer for '{item}'"))
        .wrap_err("last round should carry the answer")?;
    if answer != Value::Bool(true) {
        return Err(eyre!("expected true for '{item}', got {answer}"));
    }
    Ok(())
}
