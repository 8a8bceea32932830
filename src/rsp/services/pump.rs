//! Per-connection task translating push events into registry mutations.

use super::{PumpGuard, StateRegistry, Teardown};
use crate::rsp::{
    domain::{ProviderId, RunState, Severity},
    ports::{ClientEvent, InputRequest, MessageLevel, StringPrompt, UserInterface},
};
use mockable::Clock;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Spawns the event pump for one connection.
///
/// The pump consumes client push events and the controller's process state
/// changes until the connection closes, the controller reports the process
/// stopped, or the returned guard is dropped.
pub fn spawn_event_pump<U, C>(
    provider: ProviderId,
    events: mpsc::Receiver<ClientEvent>,
    process_states: broadcast::Receiver<RunState>,
    registry: Arc<StateRegistry<C>>,
    ui: Arc<U>,
) -> PumpGuard
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let pump = EventPump {
        provider,
        registry,
        ui,
    };
    PumpGuard::new(tokio::spawn(pump.run(events, process_states)))
}

struct EventPump<U, C>
where
    U: UserInterface + ?Sized,
    C: Clock + Send + Sync,
{
    provider: ProviderId,
    registry: Arc<StateRegistry<C>>,
    ui: Arc<U>,
}

impl<U, C> EventPump<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn run(
        self,
        mut events: mpsc::Receiver<ClientEvent>,
        mut process_states: broadcast::Receiver<RunState>,
    ) {
        debug!(provider = %self.provider, "event pump started");
        let mut controller_attached = true;
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        self.close("event stream ended").await;
                        break;
                    };
                    if self.handle(event).await.is_break() {
                        break;
                    }
                }
                state = process_states.recv(), if controller_attached => match state {
                    Ok(RunState::Stopped) => {
                        self.close("RSP process stopped").await;
                        break;
                    }
                    Ok(state) => debug!(provider = %self.provider, state = %state, "RSP process state"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(provider = %self.provider, skipped, "missed RSP process state changes");
                    }
                    Err(broadcast::error::RecvError::Closed) => controller_attached = false,
                },
            }
        }
        debug!(provider = %self.provider, "event pump finished");
    }

    async fn handle(&self, event: ClientEvent) -> ControlFlow<()> {
        let provider = &self.provider;
        let result = match event {
            ClientEvent::ServerAdded(handle) => {
                self.registry.ensure_server(provider, handle).map(drop)
            }
            ClientEvent::ServerRemoved(handle) => {
                self.registry.remove_server(provider, &handle.id).map(drop)
            }
            ClientEvent::ServerStateChanged(state) => self.registry.upsert_server(provider, state),
            ClientEvent::ServerProcessOutputAppended(output) => {
                self.registry
                    .append_output(provider, &output.server.id, &output.text)
            }
            ClientEvent::PromptString(prompt) => {
                self.answer(prompt);
                Ok(())
            }
            ClientEvent::MessageBox(notification) => {
                self.ui
                    .show_message(message_level(notification.severity), &notification.message);
                Ok(())
            }
            ClientEvent::ConnectionClosed => {
                self.close("connection closed").await;
                return ControlFlow::Break(());
            }
        };
        if let Err(err) = result {
            warn!(provider = %provider, error = %err, "push event dropped");
        }
        ControlFlow::Continue(())
    }

    fn answer(&self, prompt: StringPrompt) {
        let ui = Arc::clone(&self.ui);
        tokio::spawn(async move {
            let request = InputRequest {
                prompt: prompt.message.clone(),
                secret: prompt.secret,
                ..InputRequest::default()
            };
            let answer = ui.input(request).await;
            if !prompt.respond(answer) {
                debug!("string prompt abandoned by the RSP");
            }
        });
    }

    async fn close(&self, reason: &str) {
        info!(provider = %self.provider, reason, "RSP connection lost");
        match self.registry.dispose(&self.provider) {
            Ok(Some(connection)) => {
                if let Err(err) = connection.release(Teardown::Closed).await {
                    warn!(provider = %self.provider, error = %err, "releasing closed connection failed");
                }
                if let Err(err) = self.registry.set_provider_status(&self.provider, RunState::Stopped) {
                    warn!(provider = %self.provider, error = %err, "could not mark provider stopped");
                }
            }
            Ok(None) => debug!(provider = %self.provider, "connection already released"),
            Err(err) => warn!(provider = %self.provider, error = %err, "dispose after close failed"),
        }
    }
}

const fn message_level(severity: Severity) -> MessageLevel {
    match severity {
        Severity::Error => MessageLevel::Error,
        Severity::Warning => MessageLevel::Warning,
        Severity::Ok | Severity::Info | Severity::Cancel => MessageLevel::Info,
    }
}
