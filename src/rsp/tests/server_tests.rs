//! Tests for server commands beneath a started provider.

use std::time::Duration;

use super::fixtures::{Harness, eventually, server_handle, server_id, server_in};
use crate::rsp::{
    adapters::{InMemoryRsp, RecordedRequest, ScriptedRequest, ScriptedUi},
    domain::{
        DeployableReference, PublishKind, PublishServerRequest, RunMode, RunState,
        StopServerAttributes,
    },
    ports::ClientEvent,
    services::{LifecycleError, ServerLaunch},
};
use rstest::rstest;

fn rsp_with(state: RunState) -> InMemoryRsp {
    InMemoryRsp::new().with_server(server_in("srv1", state))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_requests_run_mode_and_tracks_state() {
    let rsp = rsp_with(RunState::Stopped);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let status = harness
        .lifecycle
        .start_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await
        .expect("start should succeed");

    assert!(status.is_ok());
    assert!(rsp.requests().expect("requests").iter().any(|request| matches!(
        request,
        RecordedRequest::Start(parameters)
            if parameters.mode == RunMode::Run && parameters.params.id == server_id("srv1")
    )));
    harness.await_server("srv1", RunState::Started).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_rejects_running_server() {
    let harness = Harness::started(rsp_with(RunState::Started), ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .start_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::InvalidServerState {
            operation: "start",
            state: RunState::Started,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commands_need_a_connected_provider() {
    let harness = Harness::new(rsp_with(RunState::Stopped), ScriptedUi::new());

    let result = harness
        .lifecycle
        .start_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await;

    assert!(matches!(result, Err(LifecycleError::CannotContactProvider(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn graceful_stop_sends_unforced_request() {
    let rsp = rsp_with(RunState::Started);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    harness
        .lifecycle
        .stop_server(&harness.provider, &server_id("srv1"), false)
        .await
        .expect("stop should succeed");

    assert!(
        rsp.requests()
            .expect("requests")
            .contains(&RecordedRequest::Stop(StopServerAttributes {
                id: server_id("srv1"),
                force: false,
            }))
    );
    harness.await_server("srv1", RunState::Stopped).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forced_stop_skips_state_check() {
    let rsp = rsp_with(RunState::Stopped);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;
    let server = server_id("srv1");

    let graceful = harness
        .lifecycle
        .stop_server(&harness.provider, &server, false)
        .await;
    let forced = harness.lifecycle.stop_server(&harness.provider, &server, true).await;

    assert!(matches!(
        graceful,
        Err(LifecycleError::InvalidServerState {
            operation: "stop",
            ..
        })
    ));
    assert!(forced.is_ok());
    assert!(
        rsp.requests()
            .expect("requests")
            .contains(&RecordedRequest::Stop(StopServerAttributes {
                id: server,
                force: true,
            }))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_stop_surfaces_server_message() {
    let rsp = rsp_with(RunState::Started).failing(ScriptedRequest::StopServer);
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .stop_server(&harness.provider, &server_id("srv1"), false)
        .await;

    let status = match result {
        Err(LifecycleError::StatusRejected(status)) => status,
        other => panic!("expected a rejected status, got {other:?}"),
    };
    assert_eq!(status.message, "Server refused to stop");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_starts_again_after_stop_is_observed() {
    let rsp = rsp_with(RunState::Started);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let launch = harness
        .lifecycle
        .restart_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await
        .expect("restart should succeed");

    assert!(matches!(launch, ServerLaunch::Run(ref status) if status.is_ok()));
    let requests = rsp.requests().expect("requests");
    let stop = requests
        .iter()
        .position(|request| matches!(request, RecordedRequest::Stop(_)));
    let start = requests
        .iter()
        .position(|request| matches!(request, RecordedRequest::Start(_)));
    assert!(matches!((stop, start), (Some(stop), Some(start)) if stop < start));
    harness.await_server("srv1", RunState::Started).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_does_not_start_when_stop_fails() {
    let rsp = rsp_with(RunState::Started).failing(ScriptedRequest::StopServer);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .restart_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await;

    assert!(matches!(result, Err(LifecycleError::StatusRejected(_))));
    assert!(
        !rsp.requests()
            .expect("requests")
            .iter()
            .any(|request| matches!(request, RecordedRequest::Start(_)))
    );
}

fn sent_start(rsp: &InMemoryRsp) -> bool {
    rsp.requests()
        .expect("requests")
        .iter()
        .any(|request| matches!(request, RecordedRequest::Start(_)))
}

#[rstest]
#[case(ClientEvent::ServerStateChanged(server_in("srv1", RunState::Started)), RunState::Started)]
#[case(ClientEvent::ServerRemoved(server_handle("srv1")), RunState::Unknown)]
#[tokio::test(flavor = "multi_thread")]
async fn restart_fails_when_server_does_not_stop(
    #[case] event: ClientEvent,
    #[case] expected: RunState,
) {
    let rsp = rsp_with(RunState::Started).silencing(ScriptedRequest::StopServer);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let id = server_id("srv1");
    let (result, pushed) = tokio::join!(
        harness
            .lifecycle
            .restart_server(&harness.provider, &id, RunMode::Run),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            rsp.push(event).await
        },
    );

    pushed.expect("event should reach the client");
    assert!(matches!(
        result,
        Err(LifecycleError::RestartFailed { state, .. }) if state == expected
    ));
    assert!(!sent_start(&rsp));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_times_out_without_terminal_state() {
    let rsp = rsp_with(RunState::Started).silencing(ScriptedRequest::StopServer);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .restart_server(&harness.provider, &server_id("srv1"), RunMode::Run)
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::RestartTimedOut(server)) if server == server_id("srv1")
    ));
    assert!(!sent_start(&rsp));
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test(flavor = "multi_thread")]
async fn publish_uses_requested_variant(#[case] synchronous: bool) {
    let rsp = rsp_with(RunState::Started);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    harness
        .lifecycle
        .publish(
            &harness.provider,
            &server_id("srv1"),
            PublishKind::Full,
            synchronous,
        )
        .await
        .expect("publish should succeed");

    assert!(rsp.requests().expect("requests").contains(&RecordedRequest::Publish {
        request: PublishServerRequest {
            server: server_handle("srv1"),
            kind: PublishKind::Full,
        },
        synchronous,
    }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_publish_is_rejected() {
    let rsp = rsp_with(RunState::Started).failing(ScriptedRequest::Publish);
    let harness = Harness::started(rsp, ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .publish(
            &harness.provider,
            &server_id("srv1"),
            PublishKind::Incremental,
            true,
        )
        .await;

    assert!(matches!(result, Err(LifecycleError::StatusRejected(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deployments_are_added_and_removed_by_label() {
    let rsp = rsp_with(RunState::Started);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;
    let server = server_id("srv1");

    harness
        .lifecycle
        .add_deployment(
            &harness.provider,
            &server,
            DeployableReference::new("shop.war", "/work/shop/target/shop.war"),
        )
        .await
        .expect("deployment should be added");
    eventually(|| {
        harness
            .lifecycle
            .registry()
            .lookup(&harness.provider, &server)
            .is_ok_and(|state| state.deployable("shop.war").is_some())
    })
    .await;

    harness
        .lifecycle
        .remove_deployment(&harness.provider, &server, "shop.war")
        .await
        .expect("deployment should be removed");

    assert!(rsp.requests().expect("requests").iter().any(|request| matches!(
        request,
        RecordedRequest::RemoveDeployable(reference)
            if reference.deployable_reference.path == "/work/shop/target/shop.war"
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_unknown_deployment_fails_locally() {
    let rsp = rsp_with(RunState::Started);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .remove_deployment(&harness.provider, &server_id("srv1"), "missing.war")
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::NoSuchDeployable { ref label, .. }) if label == "missing.war"
    ));
    assert!(
        !rsp.requests()
            .expect("requests")
            .iter()
            .any(|request| matches!(request, RecordedRequest::RemoveDeployable(_)))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_stopped_server() {
    let rsp = rsp_with(RunState::Stopped);
    let harness = Harness::started(rsp.clone(), ScriptedUi::new()).await;

    harness
        .lifecycle
        .delete_server(&harness.provider, &server_id("srv1"))
        .await
        .expect("delete should succeed");

    assert!(
        rsp.requests()
            .expect("requests")
            .contains(&RecordedRequest::Delete(server_handle("srv1")))
    );
    assert_eq!(harness.server_state("srv1"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_refuses_running_server() {
    let harness = Harness::started(rsp_with(RunState::Started), ScriptedUi::new()).await;

    let result = harness
        .lifecycle
        .delete_server(&harness.provider, &server_id("srv1"))
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::InvalidServerState {
            operation: "delete",
            ..
        })
    ));
    assert_eq!(harness.server_state("srv1"), Some(RunState::Started));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_editor_leaves_server_untouched() {
    let rsp = rsp_with(RunState::Stopped);
    let ui = ScriptedUi::new().with_edit(None);
    let harness = Harness::started(rsp.clone(), ui).await;

    let response = harness
        .lifecycle
        .edit_server(&harness.provider, &server_id("srv1"))
        .await
        .expect("edit should succeed");

    assert!(response.is_none());
    let edits = harness.ui.edit_requests();
    assert_eq!(edits.first().map(|edit| edit.title.as_str()), Some("srv1.json"));
    assert!(
        !rsp.requests()
            .expect("requests")
            .iter()
            .any(|request| matches!(request, RecordedRequest::UpdateServer(_)))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edited_definition_is_submitted() {
    let rsp = rsp_with(RunState::Stopped);
    let ui = ScriptedUi::new().with_edit(Some(r#"{"id": "srv1", "vm.args": "-Xmx1g"}"#));
    let harness = Harness::started(rsp.clone(), ui).await;

    let response = harness
        .lifecycle
        .edit_server(&harness.provider, &server_id("srv1"))
        .await
        .expect("edit should succeed");

    assert!(response.is_some_and(|response| response.validation.status.is_ok()));
    assert!(rsp.requests().expect("requests").iter().any(|request| matches!(
        request,
        RecordedRequest::UpdateServer(update) if update.server_json.contains("-Xmx1g")
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_definition_is_rejected() {
    let rsp = rsp_with(RunState::Stopped);
    let ui = ScriptedUi::new().with_edit(Some("{ not json"));
    let harness = Harness::started(rsp, ui).await;

    let result = harness
        .lifecycle
        .edit_server(&harness.provider, &server_id("srv1"))
        .await;

    assert!(matches!(result, Err(LifecycleError::StatusRejected(_))));
}
