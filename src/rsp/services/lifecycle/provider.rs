//! Provider state machine: start, stop, terminate, disconnect.

use super::LifecycleController;
use crate::rsp::{
    domain::{ProviderId, RspProviderState, RunState, ServerState},
    ports::{Connection, ProcessSinks, RspController, RspLaunch, UserInterface},
    services::{
        ConnectionContext, LifecycleError, LifecycleResult, Teardown, spawn_event_pump,
    },
};
use mockable::Clock;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Registers a provider in stopped state.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn register_provider(
        &self,
        provider: ProviderId,
        display_name: &str,
    ) -> LifecycleResult<RspProviderState> {
        let state = RspProviderState::new(
            provider,
            display_name,
            RunState::Stopped,
            self.registry.clock().as_ref(),
        );
        self.registry.register(state.clone())?;
        Ok(state)
    }

    /// Forgets a provider, shutting down an RSP this client spawned and
    /// disconnecting from one it attached to.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Registry`] for unknown providers and the
    /// client error when the release request fails.
    pub async fn deregister_provider(&self, provider: &ProviderId) -> LifecycleResult<()> {
        let Some(connection) = self.registry.deregister(provider)? else {
            return Ok(());
        };
        let teardown = if connection.launch().spawned {
            Teardown::Shutdown
        } else {
            Teardown::Disconnect
        };
        connection.release(teardown).await?;
        Ok(())
    }

    /// Starts a provider's RSP and connects to it.
    ///
    /// The provider reaches `Started` only after the capability exchange
    /// and the initial server sync succeed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] without contacting the
    /// controller when the provider is not stopped, and controller,
    /// protocol or timeout errors otherwise.
    pub async fn start_provider(&self, provider: &ProviderId) -> LifecycleResult<RspProviderState> {
        let controller = self
            .controllers
            .resolve(provider)
            .ok_or_else(|| LifecycleError::NoController(provider.clone()))?;
        if !self.registry.begin_start(provider)? {
            return Err(LifecycleError::AlreadyRunning(provider.clone()));
        }

        let sinks = self.process_sinks(provider);
        let launch = match controller.start_rsp(sinks.clone()).await {
            Ok(launch) => launch,
            Err(err) => {
                sinks.stdout.dispose();
                sinks.stderr.dispose();
                self.registry.set_provider_status(provider, RunState::Stopped)?;
                return Err(err.into());
            }
        };
        info!(provider = %provider, port = launch.port, spawned = launch.spawned, "RSP launched");

        let Connection { client, events } = match self.connector.connect(provider, &launch).await {
            Ok(connection) => connection,
            Err(err) => {
                sinks.stdout.dispose();
                sinks.stderr.dispose();
                abandon_launch(controller.as_ref(), provider, &launch).await;
                self.registry.set_provider_status(provider, RunState::Unknown)?;
                return Err(err.into());
            }
        };
        let pump = spawn_event_pump(
            provider.clone(),
            events,
            controller.state_changes(),
            Arc::clone(&self.registry),
            Arc::clone(&self.ui),
        );
        let context = ConnectionContext::new(client, launch.clone(), sinks).with_pump(pump);
        if let Some(previous) = self.registry.attach_connection(provider, context)? {
            previous.release(Teardown::Release).await?;
        }

        if let Err(err) = self.handshake(provider).await {
            warn!(provider = %provider, error = %err, "RSP handshake failed");
            if let Some(connection) = self.registry.dispose(provider)? {
                if let Err(release_err) = connection.release(Teardown::Disconnect).await {
                    warn!(provider = %provider, error = %release_err, "disconnect after failed handshake");
                }
            }
            abandon_launch(controller.as_ref(), provider, &launch).await;
            self.registry.set_provider_status(provider, RunState::Unknown)?;
            return Err(err);
        }

        self.registry.set_provider_status(provider, RunState::Started)?;
        Ok(self.registry.provider(provider)?)
    }

    /// Replaces a provider's inventory with the servers its RSP reports.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected
    /// and protocol errors from the listing.
    pub async fn sync_servers(&self, provider: &ProviderId) -> LifecycleResult<Vec<ServerState>> {
        let client = self.client_for(provider)?;
        let handles = client.get_server_handles().await?;
        let mut servers = Vec::with_capacity(handles.len());
        for handle in &handles {
            servers.push(client.get_server_state(handle).await?);
        }
        self.registry.replace_servers(provider, servers.clone())?;
        info!(provider = %provider, servers = servers.len(), "server inventory synchronised");
        Ok(servers)
    }

    /// Gracefully stops a provider's RSP.
    ///
    /// The provider moves to `Stopping` before the shutdown request and
    /// stays there if the request fails.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotRunning`],
    /// [`LifecycleError::CannotContactProvider`] or the shutdown error.
    pub async fn stop_provider(&self, provider: &ProviderId) -> LifecycleResult<()> {
        self.ensure_running(provider)?;
        let client = self.client_for(provider)?;
        self.registry.set_provider_status(provider, RunState::Stopping)?;
        client.shutdown_server().await?;
        self.release(provider, Teardown::Release).await;
        self.registry.set_provider_status(provider, RunState::Stopped)?;
        Ok(())
    }

    /// Forcibly stops a provider's RSP through its controller.
    ///
    /// When the controller fails the status observed before the call is
    /// restored.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TerminateFailed`] when the controller
    /// fails, and [`LifecycleError::NotRunning`] or
    /// [`LifecycleError::NoController`] when the request is invalid.
    pub async fn terminate_provider(&self, provider: &ProviderId) -> LifecycleResult<()> {
        let snapshot = self.ensure_running(provider)?;
        let controller = self
            .controllers
            .resolve(provider)
            .ok_or_else(|| LifecycleError::NoController(provider.clone()))?;
        self.registry.set_provider_status(provider, RunState::Stopping)?;
        if let Err(source) = controller.stop_rsp().await {
            self.registry.restore_provider_status(provider, snapshot)?;
            return Err(LifecycleError::TerminateFailed {
                provider: provider.clone(),
                source,
            });
        }
        self.release(provider, Teardown::Release).await;
        self.registry.set_provider_status(provider, RunState::Stopped)?;
        Ok(())
    }

    /// Detaches from a provider's RSP without stopping it.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Registry`] for unknown providers.
    pub async fn disconnect_provider(&self, provider: &ProviderId) -> LifecycleResult<()> {
        self.registry.provider(provider)?;
        self.release(provider, Teardown::Disconnect).await;
        self.registry.set_provider_status(provider, RunState::Stopped)?;
        Ok(())
    }

    async fn handshake(&self, provider: &ProviderId) -> LifecycleResult<()> {
        let client = self.client_for(provider)?;
        let capabilities = self.config.capabilities();
        timeout(
            self.config.capability_timeout(),
            client.register_client_capabilities(&capabilities),
        )
        .await
        .map_err(|_| LifecycleError::NoResponseInTime {
            provider: provider.clone(),
            request: "client capability registration",
        })??;
        self.sync_servers(provider).await?;
        Ok(())
    }

    fn ensure_running(&self, provider: &ProviderId) -> LifecycleResult<RunState> {
        let status = self.registry.provider(provider)?.status();
        if status.can_stop() {
            Ok(status)
        } else {
            Err(LifecycleError::NotRunning {
                provider: provider.clone(),
                status,
            })
        }
    }

    async fn release(&self, provider: &ProviderId, teardown: Teardown) {
        match self.registry.dispose(provider) {
            Ok(Some(connection)) => {
                if let Err(err) = connection.release(teardown).await {
                    warn!(provider = %provider, error = %err, ?teardown, "connection release failed");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(provider = %provider, error = %err, "dispose failed"),
        }
    }

    fn process_sinks(&self, provider: &ProviderId) -> ProcessSinks {
        ProcessSinks {
            stdout: self.ui.open_channel(&format!("{provider} (stdout)")),
            stderr: self.ui.open_channel(&format!("{provider} (stderr)")),
        }
    }
}

/// Stops an RSP this client spawned for a start that did not complete.
async fn abandon_launch(controller: &dyn RspController, provider: &ProviderId, launch: &RspLaunch) {
    if !launch.spawned {
        return;
    }
    if let Err(err) = controller.stop_rsp().await {
        warn!(provider = %provider, error = %err, "could not stop RSP after failed start");
    }
}
