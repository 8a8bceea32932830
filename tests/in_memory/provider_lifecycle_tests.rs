//! In-memory integration tests for RSP provider lifecycle management.

use super::helpers::{Conductor, eventually, server_id, wildfly};
use rsp_conductor::rsp::{
    adapters::{InMemoryController, InMemoryRsp, RecordedRequest, ScriptedUi},
    domain::{RunMode, RunState},
    ports::{MessageLevel, RspLaunch},
    services::{LifecycleError, RegistryEvent},
};
use rstest::{fixture, rstest};

#[fixture]
fn rsp() -> InMemoryRsp {
    InMemoryRsp::new().with_server(wildfly("wildfly-30", RunState::Stopped))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_start_server_start_and_provider_stop(rsp: InMemoryRsp) {
    let conductor = Conductor::new(rsp.clone(), ScriptedUi::new());

    let started = conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");
    assert_eq!(started.status(), RunState::Started);
    assert_eq!(started.servers().len(), 1);

    conductor
        .lifecycle
        .start_server(&conductor.provider, &server_id("wildfly-30"), RunMode::Run)
        .await
        .expect("server start should succeed");
    conductor.await_server("wildfly-30", RunState::Started).await;

    conductor
        .lifecycle
        .stop_provider(&conductor.provider)
        .await
        .expect("provider stop should succeed");

    assert_eq!(conductor.status(), RunState::Stopped);
    assert!(
        conductor
            .lifecycle
            .registry()
            .servers(&conductor.provider)
            .expect("servers")
            .is_empty()
    );
    assert!(
        rsp.requests()
            .expect("requests")
            .contains(&RecordedRequest::Shutdown)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_status_changes_are_broadcast_in_order(rsp: InMemoryRsp) {
    let conductor = Conductor::new(rsp, ScriptedUi::new());
    let mut events = conductor.lifecycle.registry().subscribe();

    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");

    let mut statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let RegistryEvent::ProviderChanged { status, .. } = event {
            statuses.push(status);
        }
    }
    assert_eq!(statuses.first(), Some(&RunState::Starting));
    assert_eq!(statuses.last(), Some(&RunState::Started));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_provider_is_not_launched_twice(rsp: InMemoryRsp) {
    let conductor = Conductor::new(rsp, ScriptedUi::new());
    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");

    let second = conductor.lifecycle.start_provider(&conductor.provider).await;

    assert!(matches!(second, Err(LifecycleError::AlreadyRunning(_))));
    assert_eq!(conductor.controller.start_calls(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_terminate_keeps_provider_running(rsp: InMemoryRsp) {
    let controller =
        InMemoryController::new(RspLaunch::local(8080, true)).failing_stop("kill timed out");
    let conductor = Conductor::with_controller(rsp, controller, ScriptedUi::new());
    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");

    let result = conductor
        .lifecycle
        .terminate_provider(&conductor.provider)
        .await;
    conductor
        .lifecycle
        .report("Failed to terminate Community Server Connector", result);

    assert_eq!(conductor.status(), RunState::Started);
    let messages = conductor.ui.messages();
    assert!(messages.iter().any(|(level, message)| {
        *level == MessageLevel::Error
            && message.starts_with("Failed to terminate Community Server Connector: ")
            && message.contains("kill timed out")
    }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn crashed_rsp_releases_connection(rsp: InMemoryRsp) {
    let conductor = Conductor::new(rsp, ScriptedUi::new());
    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");

    conductor.controller.crash();

    eventually(|| conductor.status() == RunState::Stopped).await;
    let stdout = conductor
        .ui
        .channel("p1 (stdout)")
        .expect("stdout channel should exist");
    eventually(|| stdout.disposals() == 1).await;
    let server = conductor
        .lifecycle
        .start_server(&conductor.provider, &server_id("wildfly-30"), RunMode::Run)
        .await;
    assert!(matches!(server, Err(LifecycleError::CannotContactProvider(_))));
}
