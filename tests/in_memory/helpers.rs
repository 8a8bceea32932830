//! Shared wiring for in-memory orchestrator integration tests.

use std::sync::Arc;
use std::time::Duration;

use rsp_conductor::config::OrchestratorConfig;
use rsp_conductor::rsp::{
    adapters::{InMemoryController, InMemoryRsp, RecordingDebugBridge, ScriptedUi},
    domain::{
        ProviderId, RunState, ServerHandle, ServerId, ServerState, ServerType, ServerTypeId,
    },
    ports::{ControllerDirectory, RspLaunch},
    services::{LifecycleController, LifecycleDependencies, StateRegistry},
};
use mockable::DefaultClock;

/// Lifecycle controller over scripted UI and the system clock.
pub type TestLifecycle = LifecycleController<ScriptedUi, DefaultClock>;

/// Type identifier of the WildFly adapter used throughout the tests.
pub const WILDFLY_TYPE: &str = "org.jboss.ide.eclipse.as.wildfly.300";

/// An orchestrator wired to in-memory collaborators for provider `p1`.
pub struct Conductor {
    /// The registered provider.
    pub provider: ProviderId,
    /// Scripted RSP behind the provider.
    pub rsp: InMemoryRsp,
    /// Controller that launches the RSP.
    pub controller: InMemoryController,
    /// Scripted user interface.
    pub ui: ScriptedUi,
    /// Command surface under test.
    pub lifecycle: TestLifecycle,
}

impl Conductor {
    /// Wires a conductor with a working controller.
    #[must_use]
    pub fn new(rsp: InMemoryRsp, ui: ScriptedUi) -> Self {
        Self::with_controller(rsp, InMemoryController::new(RspLaunch::local(8080, true)), ui)
    }

    /// Wires a conductor around the given controller.
    ///
    /// # Panics
    ///
    /// Panics if the provider cannot be registered.
    #[must_use]
    pub fn with_controller(rsp: InMemoryRsp, controller: InMemoryController, ui: ScriptedUi) -> Self {
        let provider = ProviderId::new("p1").expect("valid provider id");
        let config = OrchestratorConfig::fast();
        let registry = Arc::new(StateRegistry::new(
            Arc::new(ui.clone()),
            Arc::new(DefaultClock),
            config.event_buffer,
        ));
        let lifecycle = LifecycleController::new(LifecycleDependencies {
            registry,
            controllers: ControllerDirectory::new()
                .with(provider.clone(), Arc::new(controller.clone())),
            connector: Arc::new(rsp.clone()),
            ui: Arc::new(ui.clone()),
            debugger: Arc::new(RecordingDebugBridge::new()),
            config,
        });
        lifecycle
            .register_provider(provider.clone(), "Community Server Connector")
            .expect("provider registration should succeed");
        Self {
            provider,
            rsp,
            controller,
            ui,
            lifecycle,
        }
    }

    /// Current provider status.
    ///
    /// # Panics
    ///
    /// Panics if the provider is no longer registered.
    #[must_use]
    pub fn status(&self) -> RunState {
        self.lifecycle
            .registry()
            .provider(&self.provider)
            .expect("provider should be registered")
            .status()
    }

    /// Current state of a server, if the registry knows it.
    #[must_use]
    pub fn server_state(&self, server: &str) -> Option<RunState> {
        self.lifecycle
            .registry()
            .lookup(&self.provider, &server_id(server))
            .ok()
            .map(|state| state.state)
    }

    /// Waits until the registry reports `server` in `state`.
    pub async fn await_server(&self, server: &str, state: RunState) {
        eventually(|| self.server_state(server) == Some(state)).await;
    }
}

/// Builds a server identifier.
///
/// # Panics
///
/// Panics on a blank identifier.
#[must_use]
pub fn server_id(value: &str) -> ServerId {
    ServerId::new(value).expect("valid server id")
}

/// The WildFly server type.
///
/// # Panics
///
/// Panics if the type identifier is rejected.
#[must_use]
pub fn wildfly_type() -> ServerType {
    ServerType::new(ServerTypeId::new(WILDFLY_TYPE).expect("valid type id"), "WildFly 30")
}

/// A WildFly server in the given state.
#[must_use]
pub fn wildfly(id: &str, state: RunState) -> ServerState {
    let mut server = ServerState::unknown(ServerHandle::new(server_id(id), wildfly_type()));
    server.state = state;
    server
}

/// Polls `condition` until it holds, failing after two seconds.
///
/// # Panics
///
/// Panics when the condition does not hold in time.
pub async fn eventually(condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition did not hold in time");
}
