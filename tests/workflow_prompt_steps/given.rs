//! Given steps for workflow prompt scenarios.

use super::world::WorkflowWorld;
use rsp_conductor::rsp::domain::Status;
use rsp_conductor::workflow::domain::{
    ResponseType, WorkflowPrompt, WorkflowRequestId, WorkflowResponse, WorkflowResponseItem,
};
use rstest_bdd_macros::given;

#[given("the server asks for a licence acceptance in round {round:i64}")]
fn server_asks_for_licence(world: &mut WorkflowWorld, round: i64) {
    let licence = WorkflowResponseItem::new("license.accept", "Accept the licence?")
        .with_prompt(WorkflowPrompt::new(ResponseType::Bool));
    world.server.respond(WorkflowResponse::needs_input(
        Some(WorkflowRequestId::new(round)),
        vec![licence],
    ));
}

#[given(r#"the server rejects the first round with "{message}""#)]
fn server_rejects(world: &mut WorkflowWorld, message: String) {
    world
        .server
        .respond(WorkflowResponse::terminal(Status::error(message)));
}

#[given("the user answers yes")]
fn user_answers_yes(world: &mut WorkflowWorld) {
    world.ui = world.ui.clone().with_pick(Some("Yes"));
}

#[given("the user dismisses the prompt")]
fn user_dismisses(world: &mut WorkflowWorld) {
    world.ui = world.ui.clone().with_pick(None);
}
