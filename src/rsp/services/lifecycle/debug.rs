//! Debug-mode start and the one-shot debugger attach watcher.

use super::{LifecycleController, server::launch_parameters};
use crate::rsp::{
    domain::{ProviderId, RunMode, RunState, ServerId},
    ports::{DebugBridge, DebugSession, MessageLevel, UserInterface},
    services::{LifecycleError, LifecycleResult, RegistryEvent},
};
use mockable::Clock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pending debugger attach for a server started in debug mode.
///
/// The watcher fires at most once, when the server's output first contains
/// the readiness marker, and then exits. It also exits when the server
/// stops or disappears first.
#[derive(Debug)]
pub struct DebugAttachWatch {
    handle: JoinHandle<LifecycleResult<bool>>,
}

impl DebugAttachWatch {
    /// Waits for the watcher and returns whether the debugger attached.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Debug`] when the attach itself failed.
    pub async fn attached(self) -> LifecycleResult<bool> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "debug attach watcher did not complete");
                Ok(false)
            }
        }
    }

    /// Stops watching.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Starts a server in debug mode and arms the debugger attach.
    ///
    /// The launch command must advertise a debug type and port, a debugger
    /// must handle that type and its extension must be installed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::DebugNotSupported`],
    /// [`LifecycleError::UnsupportedDebugType`] or
    /// [`LifecycleError::MissingDebugExtension`] when a check fails, and
    /// the errors of [`LifecycleController::start_server`].
    pub async fn debug_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> LifecycleResult<DebugAttachWatch> {
        let (client, state) = self.connected_server(provider, server)?;
        let command = client
            .get_launch_command(&launch_parameters(&state, RunMode::Debug))
            .await?;
        let (debug_type, port) = command
            .debug_details()
            .ok_or_else(|| LifecycleError::DebugNotSupported(server.clone()))?;
        let extension = self
            .debugger
            .required_extension(&debug_type)
            .ok_or_else(|| LifecycleError::UnsupportedDebugType(debug_type.clone()))?;
        if !self.debugger.is_extension_installed(&extension) {
            return Err(LifecycleError::MissingDebugExtension(extension));
        }

        let listener = self.registry.subscribe();
        self.start_server(provider, server, RunMode::Debug).await?;
        let session = DebugSession {
            provider: provider.clone(),
            server: state.server,
            debug_type,
            port,
        };
        let watcher = AttachWatcher {
            debugger: Arc::clone(&self.debugger),
            ui: Arc::clone(&self.ui),
            marker: self.config.debug_ready_marker.clone(),
        };
        Ok(DebugAttachWatch {
            handle: tokio::spawn(watcher.run(listener, session)),
        })
    }
}

struct AttachWatcher<U>
where
    U: UserInterface + ?Sized,
{
    debugger: Arc<dyn DebugBridge>,
    ui: Arc<U>,
    marker: String,
}

impl<U> AttachWatcher<U>
where
    U: UserInterface + ?Sized + 'static,
{
    async fn run(
        self,
        mut listener: broadcast::Receiver<RegistryEvent>,
        session: DebugSession,
    ) -> LifecycleResult<bool> {
        loop {
            let event = match listener.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(server = %session.server.id, skipped, "debug watcher lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(false),
            };
            if event.provider() != &session.provider {
                continue;
            }
            match event {
                RegistryEvent::OutputAppended { server, text, .. }
                    if server == session.server.id && text.contains(&self.marker) =>
                {
                    // Unsubscribe first so the attach fires exactly once.
                    drop(listener);
                    return self.attach(session).await;
                }
                RegistryEvent::ServerChanged { server, .. }
                    if server.id() == &session.server.id && server.state == RunState::Stopped =>
                {
                    debug!(server = %session.server.id, "server stopped before debug attach");
                    return Ok(false);
                }
                RegistryEvent::ServerRemoved { server, .. } if server == session.server.id => {
                    return Ok(false);
                }
                RegistryEvent::ProviderRemoved(_) => return Ok(false),
                _ => {}
            }
        }
    }

    async fn attach(self, session: DebugSession) -> LifecycleResult<bool> {
        let server = session.server.id.clone();
        match self.debugger.attach(session).await {
            Ok(()) => {
                info!(server = %server, "debugger attached");
                Ok(true)
            }
            Err(err) => {
                let message = format!("Failed to attach debugger to {server}: {err}");
                self.ui.show_message(MessageLevel::Error, &message);
                Err(err.into())
            }
        }
    }
}
