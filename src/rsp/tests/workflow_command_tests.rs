//! Tests for commands driven through the workflow engine.

use std::time::Duration;

use super::fixtures::{Harness, server_id, server_in, server_type};
use crate::rsp::{
    adapters::{InMemoryRsp, RecordedRequest, ScriptedRequest, ScriptedUi},
    domain::{
        Attribute, AttributeType, Attributes, DownloadRuntimeDescription, RspDomainError,
        RunState, SERVER_HOME_DIR_ATTRIBUTE, ServerActionWorkflow, ServerAttributes, ServerBean,
        Status,
    },
    services::LifecycleError,
};
use crate::workflow::{
    domain::{
        BROWSER_URL_PROPERTY, ResponseType, WorkflowPrompt, WorkflowRequestId, WorkflowResponse,
        WorkflowResponseItem,
    },
    services::WorkflowOutcome,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const RUNTIME_NAME: &str = "WildFly 30.0.0.Final";

fn required_attributes() -> Attributes {
    Attributes::default()
        .with(
            SERVER_HOME_DIR_ATTRIBUTE,
            Attribute::new(AttributeType::String, "WildFly home directory"),
        )
        .with(
            "vm.install.path",
            Attribute::new(AttributeType::String, "JVM location")
                .with_default(json!("/usr/lib/jvm/default")),
        )
}

#[fixture]
fn rsp() -> InMemoryRsp {
    InMemoryRsp::new()
        .with_server(server_in("srv1", RunState::Stopped))
        .with_server_type(server_type(), required_attributes())
}

fn creations(rsp: &InMemoryRsp) -> Vec<ServerAttributes> {
    rsp.requests()
        .expect("requests")
        .into_iter()
        .filter_map(|request| match request {
            RecordedRequest::Create(attributes) => Some(attributes),
            _ => None,
        })
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_prompts_only_for_attributes_without_default(rsp: InMemoryRsp) {
    let ui = ScriptedUi::new().with_input(Some("/opt/wildfly"));
    let harness = Harness::started(rsp.clone(), ui).await;

    let outcome = harness
        .lifecycle
        .create_server(&harness.provider, server_type(), "wf1")
        .await
        .expect("creation should succeed");

    assert!(outcome.completed().is_some_and(|status| status.is_ok()));
    let prompts = harness.ui.input_requests();
    assert_eq!(prompts.len(), 1);
    assert_eq!(
        prompts.first().map(|request| request.prompt.as_str()),
        Some("WildFly home directory")
    );
    let created = creations(&rsp);
    let attributes = &created.first().expect("one creation").attributes;
    assert_eq!(
        attributes.get(SERVER_HOME_DIR_ATTRIBUTE),
        Some(&json!("/opt/wildfly"))
    );
    assert_eq!(
        attributes.get("vm.install.path"),
        Some(&json!("/usr/lib/jvm/default"))
    );
    harness.await_server("wf1", RunState::Unknown).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_keys_are_prompted_again(rsp: InMemoryRsp) {
    let scripted = rsp.with_create_rejection(vec![SERVER_HOME_DIR_ATTRIBUTE.to_owned()]);
    let ui = ScriptedUi::new()
        .with_input(Some("/tmp/not-wildfly"))
        .with_input(Some("/opt/wildfly"));
    let harness = Harness::started(scripted.clone(), ui).await;

    let outcome = harness
        .lifecycle
        .create_server(&harness.provider, server_type(), "wf1")
        .await
        .expect("creation should succeed");

    assert!(!outcome.is_canceled());
    let created = creations(&scripted);
    assert_eq!(created.len(), 2);
    assert_eq!(
        created
            .last()
            .and_then(|attempt| attempt.attributes.get(SERVER_HOME_DIR_ATTRIBUTE)),
        Some(&json!("/opt/wildfly"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dismissed_prompt_cancels_creation(rsp: InMemoryRsp) {
    let harness = Harness::started(rsp.clone(), ScriptedUi::new().with_input(None)).await;

    let outcome = harness
        .lifecycle
        .create_server(&harness.provider, server_type(), "wf1")
        .await
        .expect("cancellation is not an error");

    assert!(outcome.is_canceled());
    assert!(creations(&rsp).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_server_id_is_rejected(rsp: InMemoryRsp) {
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .create_server(&harness.provider, server_type(), "  ")
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::Domain(RspDomainError::EmptyIdentifier { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bean_location_seeds_home_directory(rsp: InMemoryRsp) {
    let bean = ServerBean {
        location: "/opt/wildfly-30".to_owned(),
        type_category: "WildFly".to_owned(),
        specification_version: "10.0".to_owned(),
        name: "WildFly".to_owned(),
        version: "30.0.0.Final".to_owned(),
        server_adapter_type_id: server_type().id.as_str().to_owned(),
    };
    let scripted = rsp.with_beans("/opt/wildfly-30", vec![bean]);
    let harness = Harness::started(scripted.clone(), ScriptedUi::new()).await;

    let outcome = harness
        .lifecycle
        .create_server_from_bean(&harness.provider, "/opt/wildfly-30", "wf1")
        .await
        .expect("creation should succeed");

    assert!(!outcome.is_canceled());
    assert!(harness.ui.input_requests().is_empty());
    let created = creations(&scripted);
    assert_eq!(
        created
            .first()
            .and_then(|attempt| attempt.attributes.get(SERVER_HOME_DIR_ATTRIBUTE)),
        Some(&json!("/opt/wildfly-30"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bean_discovery_without_match_fails(rsp: InMemoryRsp) {
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .create_server_from_bean(&harness.provider, "/home/user/Downloads", "wf1")
        .await;

    assert!(matches!(result, Err(LifecycleError::NoServerFound(ref path)) if path == "/home/user/Downloads"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn runtime_download_accepts_licence_and_resubmits(rsp: InMemoryRsp) {
    let licence = WorkflowResponseItem::new("license.accept", "Accept the licence?")
        .with_prompt(WorkflowPrompt::new(ResponseType::Bool));
    let scripted = rsp
        .with_runtime(DownloadRuntimeDescription::new("wildfly-30.0.0.Final", RUNTIME_NAME))
        .with_download_round(WorkflowResponse::needs_input(
            Some(WorkflowRequestId::new(3)),
            vec![licence],
        ));
    let ui = ScriptedUi::new()
        .with_pick(Some(RUNTIME_NAME))
        .with_pick(Some("Yes"));
    let harness = Harness::started(scripted.clone(), ui).await;

    let outcome = harness
        .lifecycle
        .download_runtime(&harness.provider)
        .await
        .expect("download should succeed");

    assert_eq!(outcome, WorkflowOutcome::Completed(Status::ok()));
    let rounds: Vec<_> = scripted
        .requests()
        .expect("requests")
        .into_iter()
        .filter_map(|request| match request {
            RecordedRequest::DownloadRuntime(round) => Some(round),
            _ => None,
        })
        .collect();
    assert_eq!(rounds.len(), 2);
    let second = rounds.last().expect("second round");
    assert_eq!(second.download_runtime_id, "wildfly-30.0.0.Final");
    assert_eq!(second.request_id, Some(WorkflowRequestId::new(3)));
    assert_eq!(
        second
            .data
            .as_ref()
            .and_then(|data| data.get("license.accept")),
        Some(&Value::Bool(true))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dismissed_runtime_picker_cancels(rsp: InMemoryRsp) {
    let scripted = rsp.with_runtime(DownloadRuntimeDescription::new("wildfly-30.0.0.Final", RUNTIME_NAME));
    let harness = Harness::started(scripted.clone(), ScriptedUi::new().with_pick(None)).await;

    let outcome = harness
        .lifecycle
        .download_runtime(&harness.provider)
        .await
        .expect("cancellation is not an error");

    assert!(outcome.is_canceled());
    assert!(
        !scripted.requests()
            .expect("requests")
            .iter()
            .any(|request| matches!(request, RecordedRequest::DownloadRuntime(_)))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_runtime_listing_is_reported(rsp: InMemoryRsp) {
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness.lifecycle.download_runtime(&harness.provider).await;

    assert!(matches!(result, Err(LifecycleError::NoRuntimes)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_runtime_listing_times_out(rsp: InMemoryRsp) {
    let scripted = rsp.delaying(ScriptedRequest::RuntimeListing, Duration::from_secs(5));
    let harness = Harness::started(scripted, ScriptedUi::new()).await;

    let result = harness.lifecycle.download_runtime(&harness.provider).await;

    assert!(matches!(
        result,
        Err(LifecycleError::NoResponseInTime { request, .. })
            if request == "downloadable runtime listing"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_action_resolves_prelude_before_executing(rsp: InMemoryRsp) {
    let server = server_id("srv1");
    let open = WorkflowResponseItem::new("open", "Open welcome page")
        .with_item_type("workflow.browser.open")
        .with_property(BROWSER_URL_PROPERTY, "http://localhost:8080");
    let prelude = WorkflowResponse {
        status: Status::ok(),
        request_id: Some(WorkflowRequestId::new(11)),
        items: vec![open],
    };
    let scripted = rsp.with_action(
        &server,
        ServerActionWorkflow {
            action_id: "show-in-browser".to_owned(),
            action_label: "Show in browser".to_owned(),
            action_workflow: prelude,
        },
    );
    let ui = ScriptedUi::new().with_pick(Some("Show in browser"));
    let harness = Harness::started(scripted.clone(), ui).await;

    let outcome = harness
        .lifecycle
        .run_server_action(&harness.provider, &server)
        .await
        .expect("action should succeed");

    assert!(!outcome.is_canceled());
    assert_eq!(harness.ui.browsers(), ["http://localhost:8080"]);
    assert!(scripted.requests().expect("requests").iter().any(|request| matches!(
        request,
        RecordedRequest::ServerAction(round)
            if round.action_id == "show-in-browser"
                && round.request_id == Some(WorkflowRequestId::new(11))
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_without_actions_is_reported(rsp: InMemoryRsp) {
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .run_server_action(&harness.provider, &server_id("srv1"))
        .await;

    assert!(matches!(result, Err(LifecycleError::NoServerActions(_))));
}
