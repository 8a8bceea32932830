//! When steps for workflow prompt scenarios.

use std::sync::Arc;

use super::world::{WorkflowWorld, run_async};
use rsp_conductor::workflow::services::WorkflowEngine;
use rstest_bdd_macros::when;

#[when("the workflow runs")]
fn workflow_runs(world: &mut WorkflowWorld) {
    let engine = WorkflowEngine::new(Arc::new(world.ui.clone()));
    let result = run_async(engine.run(world.server.as_ref()));
    world.outcome = Some(result.map_err(|error| error.to_string()));
}
