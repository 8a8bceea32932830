//! Command-level provider and server lifecycle operations.
//!
//! The controller reads and mutates the [`StateRegistry`], calls the
//! protocol client and the RSP controller, and applies the provider and
//! server state machines. Multi-round requests are handed to the
//! [`WorkflowEngine`].

mod debug;
mod provider;
mod report;
mod server;
mod workflows;

pub use debug::DebugAttachWatch;
pub use report::failure_message;
pub use server::ServerLaunch;

use super::{LifecycleError, LifecycleResult, StateRegistry};
use crate::config::OrchestratorConfig;
use crate::rsp::{
    domain::{ProviderId, ServerId, ServerState, Status},
    ports::{ControllerDirectory, DebugBridge, RspClient, RspConnector, UserInterface},
};
use crate::workflow::services::WorkflowEngine;
use mockable::Clock;
use std::sync::Arc;

/// Collaborators a [`LifecycleController`] is built from.
pub struct LifecycleDependencies<U, C>
where
    U: UserInterface + ?Sized,
    C: Clock + Send + Sync,
{
    /// Shared state registry.
    pub registry: Arc<StateRegistry<C>>,
    /// Controllers keyed by provider.
    pub controllers: ControllerDirectory,
    /// Opens protocol connections.
    pub connector: Arc<dyn RspConnector>,
    /// UI capabilities.
    pub ui: Arc<U>,
    /// Debugger integration.
    pub debugger: Arc<dyn DebugBridge>,
    /// Tunables.
    pub config: OrchestratorConfig,
}

/// Provider and server lifecycle commands.
pub struct LifecycleController<U, C>
where
    U: UserInterface + ?Sized,
    C: Clock + Send + Sync,
{
    registry: Arc<StateRegistry<C>>,
    controllers: ControllerDirectory,
    connector: Arc<dyn RspConnector>,
    ui: Arc<U>,
    debugger: Arc<dyn DebugBridge>,
    engine: WorkflowEngine<U>,
    config: OrchestratorConfig,
}

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a controller.
    #[must_use]
    pub fn new(dependencies: LifecycleDependencies<U, C>) -> Self {
        let LifecycleDependencies {
            registry,
            controllers,
            connector,
            ui,
            debugger,
            config,
        } = dependencies;
        let engine =
            WorkflowEngine::new(Arc::clone(&ui)).with_round_limit(config.workflow_round_limit);
        Self {
            registry,
            controllers,
            connector,
            ui,
            debugger,
            engine,
            config,
        }
    }

    /// The registry this controller mutates.
    #[must_use]
    pub const fn registry(&self) -> &Arc<StateRegistry<C>> {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn client_for(&self, provider: &ProviderId) -> LifecycleResult<Arc<dyn RspClient>> {
        self.registry
            .client(provider)?
            .ok_or_else(|| LifecycleError::CannotContactProvider(provider.clone()))
    }

    fn connected_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> LifecycleResult<(Arc<dyn RspClient>, ServerState)> {
        let client = self.client_for(provider)?;
        let state = self.registry.lookup(provider, server)?;
        Ok((client, state))
    }
}

fn accept(status: Status) -> LifecycleResult<Status> {
    if status.is_ok() {
        Ok(status)
    } else {
        Err(LifecycleError::StatusRejected(status))
    }
}
