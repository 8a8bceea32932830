//! In-memory integration tests for server commands.

use std::time::Duration;

use super::helpers::{Conductor, eventually, server_id, wildfly};
use rsp_conductor::rsp::{
    adapters::{InMemoryRsp, RecordedRequest, ScriptedUi},
    domain::{
        DeployableReference, OutputStream, PublishKind, PublishState, RunMode, RunState,
        ServerHandle, ServerProcessOutput,
    },
    ports::ClientEvent,
    services::{RegistryEvent, ServerLaunch},
};
use rstest::rstest;

async fn started(state: RunState) -> Conductor {
    let rsp = InMemoryRsp::new().with_server(wildfly("wildfly-30", state));
    let conductor = Conductor::new(rsp, ScriptedUi::new());
    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");
    conductor
}

fn handle() -> ServerHandle {
    wildfly("wildfly-30", RunState::Unknown).server
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_cycles_through_stopped() {
    let conductor = started(RunState::Started).await;
    let mut events = conductor.lifecycle.registry().subscribe();

    let launch = conductor
        .lifecycle
        .restart_server(&conductor.provider, &server_id("wildfly-30"), RunMode::Run)
        .await
        .expect("restart should succeed");

    assert!(matches!(launch, ServerLaunch::Run(_)));
    let mut observed = Vec::new();
    while observed.last() != Some(&RunState::Started) {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("registry event should arrive")
            .expect("registry channel should stay open");
        if let RegistryEvent::ServerChanged { server, .. } = event {
            observed.push(server.state);
        }
    }
    assert_eq!(
        observed,
        [RunState::Stopped, RunState::Starting, RunState::Started]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deployment_is_tracked_and_published() {
    let conductor = started(RunState::Started).await;
    let server = server_id("wildfly-30");

    conductor
        .lifecycle
        .add_deployment(
            &conductor.provider,
            &server,
            DeployableReference::new("petstore.war", "/work/petstore/target/petstore.war"),
        )
        .await
        .expect("deployment should be added");
    eventually(|| {
        conductor
            .lifecycle
            .registry()
            .lookup(&conductor.provider, &server)
            .is_ok_and(|state| state.publish_state == PublishState::PublishRequired)
    })
    .await;

    conductor
        .lifecycle
        .publish(&conductor.provider, &server, PublishKind::Incremental, false)
        .await
        .expect("publish should succeed");

    let requests = conductor.rsp.requests().expect("requests");
    assert!(requests.iter().any(|request| matches!(
        request,
        RecordedRequest::Publish { synchronous: false, request }
            if request.kind == PublishKind::Incremental
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_server_disposes_its_output_channel_once() {
    let conductor = started(RunState::Stopped).await;
    conductor
        .rsp
        .push(ClientEvent::ServerProcessOutputAppended(ServerProcessOutput {
            server: handle(),
            process_id: "31337".to_owned(),
            stream_type: OutputStream::Stderr,
            text: "WFLYSRV0050: stopped\n".to_owned(),
        }))
        .await
        .expect("push");
    eventually(|| conductor.ui.channel("wildfly-30").is_some()).await;

    conductor
        .lifecycle
        .delete_server(&conductor.provider, &server_id("wildfly-30"))
        .await
        .expect("delete should succeed");

    let channel = conductor
        .ui
        .channel("wildfly-30")
        .expect("channel should exist");
    assert!(channel.text().contains("WFLYSRV0050"));
    assert_eq!(channel.disposals(), 1);
    assert_eq!(conductor.server_state("wildfly-30"), None);
}
