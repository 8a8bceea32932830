//! In-memory integration tests for workflow-driven server creation.

use super::helpers::{Conductor, WILDFLY_TYPE, server_id, wildfly_type};
use rsp_conductor::rsp::{
    adapters::{InMemoryRsp, RecordedRequest, ScriptedUi},
    domain::{Attribute, AttributeType, Attributes, RunMode, RunState, SERVER_HOME_DIR_ATTRIBUTE},
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn rsp() -> InMemoryRsp {
    let required = Attributes::default()
        .with(
            SERVER_HOME_DIR_ATTRIBUTE,
            Attribute::new(AttributeType::String, "Server home directory"),
        )
        .with(
            "server.http.port",
            Attribute::new(AttributeType::Int, "HTTP port").with_default(json!(8080)),
        );
    InMemoryRsp::new().with_server_type(wildfly_type(), required)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_server_can_be_started(rsp: InMemoryRsp) {
    let ui = ScriptedUi::new().with_input(Some("/opt/wildfly-30.0.0.Final"));
    let conductor = Conductor::new(rsp, ui);
    conductor
        .lifecycle
        .start_provider(&conductor.provider)
        .await
        .expect("provider start should succeed");

    let types = conductor
        .lifecycle
        .server_types(&conductor.provider)
        .await
        .expect("server types should be listed");
    let server_type = types.into_iter().next().expect("one server type");
    let outcome = conductor
        .lifecycle
        .create_server(&conductor.provider, server_type, "petstore-dev")
        .await
        .expect("creation should succeed");
    assert!(!outcome.is_canceled());
    conductor.await_server("petstore-dev", RunState::Unknown).await;

    conductor
        .lifecycle
        .start_server(&conductor.provider, &server_id("petstore-dev"), RunMode::Run)
        .await
        .expect("start should succeed");
    conductor.await_server("petstore-dev", RunState::Started).await;

    let requests = conductor.rsp.requests().expect("requests");
    assert!(requests.iter().any(|request| matches!(
        request,
        RecordedRequest::Create(attributes)
            if attributes.server_type.as_str() == WILDFLY_TYPE
                && attributes.attributes.get("server.http.port") == Some(&json!(8080))
    )));
}
