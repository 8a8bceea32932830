//! Server commands beneath a started provider.

use super::{DebugAttachWatch, LifecycleController, accept};
use crate::rsp::{
    domain::{
        DeployableReference, LaunchParameters, ProviderId, PublishKind, PublishServerRequest,
        RunMode, RunState, ServerAttributes, ServerDeployableReference, ServerId, ServerState,
        Status, StopServerAttributes, UpdateServerRequest, UpdateServerResponse,
    },
    ports::{EditRequest, UserInterface},
    services::{LifecycleError, LifecycleResult, RegistryEvent},
};
use mockable::Clock;
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What a server start produced.
#[derive(Debug)]
pub enum ServerLaunch {
    /// Started in run mode.
    Run(Status),
    /// Started in debug mode; the watch resolves once the debugger is
    /// attached.
    Debug(DebugAttachWatch),
}

impl ServerLaunch {
    /// Returns the run-mode status, if any.
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::Run(status) => Some(status),
            Self::Debug(_) => None,
        }
    }
}

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Starts a server in run mode.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected,
    /// [`LifecycleError::InvalidServerState`] unless the server is stopped
    /// or unknown, and [`LifecycleError::StatusRejected`] for a non-ok
    /// answer.
    pub async fn start_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        mode: RunMode,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        ensure_state(&state, "start", state.state.can_start())?;
        let response = client.start_server_async(&launch_parameters(&state, mode)).await?;
        info!(provider = %provider, server = %server, mode = %mode, "server start requested");
        accept(response.status)
    }

    /// Starts a server in run or debug mode.
    ///
    /// # Errors
    ///
    /// As [`LifecycleController::start_server`] and
    /// [`LifecycleController::debug_server`].
    pub async fn launch_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        mode: RunMode,
    ) -> LifecycleResult<ServerLaunch> {
        match mode {
            RunMode::Run => Ok(ServerLaunch::Run(
                self.start_server(provider, server, RunMode::Run).await?,
            )),
            RunMode::Debug => Ok(ServerLaunch::Debug(self.debug_server(provider, server).await?)),
        }
    }

    /// Requests a server stop. A forced stop skips the state check.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected,
    /// [`LifecycleError::InvalidServerState`] when a graceful stop targets
    /// a server that is not running, and
    /// [`LifecycleError::StatusRejected`] for a non-ok answer.
    pub async fn stop_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        force: bool,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        if !force {
            ensure_state(&state, "stop", state.state.can_stop())?;
        }
        let request = StopServerAttributes {
            id: server.clone(),
            force,
        };
        let status = client.stop_server_async(&request).await?;
        info!(provider = %provider, server = %server, force, "server stop requested");
        accept(status)
    }

    /// Stops a server and starts it again in `mode`.
    ///
    /// The state listener is registered before the stop request and
    /// dropped if that request fails. Observing `Stopped` triggers the
    /// start; observing `Started` again fails without retrying.
    ///
    /// # Errors
    ///
    /// Returns the stop error, [`LifecycleError::RestartFailed`],
    /// [`LifecycleError::RestartTimedOut`] or the start error.
    pub async fn restart_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        mode: RunMode,
    ) -> LifecycleResult<ServerLaunch> {
        let listener = self.registry.subscribe();
        if let Err(err) = self.stop_server(provider, server, false).await {
            drop(listener);
            return Err(err);
        }
        let observed = timeout(
            self.config.restart_timeout(),
            await_terminal_state(listener, provider, server),
        )
        .await
        .map_err(|_| LifecycleError::RestartTimedOut(server.clone()))?;
        match observed {
            Some(RunState::Stopped) => self.launch_server(provider, server, mode).await,
            Some(state) => Err(LifecycleError::RestartFailed {
                server: server.clone(),
                state,
            }),
            None => Err(LifecycleError::CannotContactProvider(provider.clone())),
        }
    }

    /// Publishes a server, waiting for completion when `synchronous`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected
    /// and [`LifecycleError::StatusRejected`] for a non-ok answer.
    pub async fn publish(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        kind: PublishKind,
        synchronous: bool,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        let request = PublishServerRequest {
            server: state.server,
            kind,
        };
        let status = if synchronous {
            client.publish(&request).await?
        } else {
            client.publish_async(&request).await?
        };
        debug!(provider = %provider, server = %server, ?kind, synchronous, "publish requested");
        accept(status)
    }

    /// Adds a deployment to a server.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected
    /// and [`LifecycleError::StatusRejected`] for a non-ok answer.
    pub async fn add_deployment(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        reference: DeployableReference,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        let request = ServerDeployableReference {
            server: state.server,
            deployable_reference: reference,
        };
        accept(client.add_deployable(&request).await?)
    }

    /// Removes the deployment with `label` from a server.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoSuchDeployable`] when the label is not
    /// deployed, and the errors of [`LifecycleController::add_deployment`].
    pub async fn remove_deployment(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        label: &str,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        let reference = state
            .deployable(label)
            .map(|deployable| deployable.reference.clone())
            .ok_or_else(|| LifecycleError::NoSuchDeployable {
                server: server.clone(),
                label: label.to_owned(),
            })?;
        let request = ServerDeployableReference {
            server: state.server,
            deployable_reference: reference,
        };
        accept(client.remove_deployable(&request).await?)
    }

    /// Deletes a stopped server.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidServerState`] unless the server is
    /// stopped, and [`LifecycleError::StatusRejected`] for a non-ok answer.
    pub async fn delete_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> LifecycleResult<Status> {
        let (client, state) = self.connected_server(provider, server)?;
        ensure_state(&state, "delete", state.state == RunState::Stopped)?;
        let status = accept(client.delete_server(&state.server).await?)?;
        self.registry.remove_server(provider, server)?;
        Ok(status)
    }

    /// Opens the server definition for editing and submits the result.
    ///
    /// Returns `None` when the user closes the editor without changes.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::StatusRejected`] when the server refuses
    /// to export or accept the definition.
    pub async fn edit_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> LifecycleResult<Option<UpdateServerResponse>> {
        let (client, state) = self.connected_server(provider, server)?;
        let exported = client.get_server_as_json(&state.server).await?;
        accept(exported.status)?;
        let request = EditRequest::buffer(format!("{server}.json"), exported.server_json.clone());
        let Some(edited) = self.ui.edit(request).await else {
            return Ok(None);
        };
        if edited == exported.server_json {
            return Ok(None);
        }
        let response = client
            .update_server(&UpdateServerRequest {
                handle: state.server,
                server_json: edited,
            })
            .await?;
        if !response.validation.status.is_ok() {
            return Err(LifecycleError::StatusRejected(response.validation.status));
        }
        Ok(Some(response))
    }
}

pub(super) fn launch_parameters(state: &ServerState, mode: RunMode) -> LaunchParameters {
    LaunchParameters {
        mode,
        params: ServerAttributes {
            server_type: state.server.server_type.id.clone(),
            id: state.server.id.clone(),
            attributes: BTreeMap::new(),
        },
    }
}

fn ensure_state(state: &ServerState, operation: &'static str, allowed: bool) -> LifecycleResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::InvalidServerState {
            server: state.id().clone(),
            operation,
            state: state.state,
        })
    }
}

async fn await_terminal_state(
    mut listener: broadcast::Receiver<RegistryEvent>,
    provider: &ProviderId,
    server: &ServerId,
) -> Option<RunState> {
    loop {
        match listener.recv().await {
            Ok(RegistryEvent::ServerChanged {
                provider: changed_provider,
                server: state,
            }) if &changed_provider == provider && state.id() == server => {
                if matches!(state.state, RunState::Stopped | RunState::Started) {
                    return Some(state.state);
                }
            }
            Ok(RegistryEvent::ServerRemoved {
                provider: changed_provider,
                server: removed,
            }) if &changed_provider == provider && &removed == server => {
                return Some(RunState::Unknown);
            }
            Ok(RegistryEvent::ProviderRemoved(removed)) if &removed == provider => return None,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(server = %server, skipped, "restart listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
