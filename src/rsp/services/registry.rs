//! Canonical state of every RSP provider and the servers beneath it.

use super::{ConnectionContext, RegistryEvent};
use crate::rsp::{
    domain::{
        ProviderId, RspDomainError, RspProviderState, RunState, ServerHandle, ServerId,
        ServerState,
    },
    ports::{OutputChannel, OutputChannelFactory, RspClient, RspLaunch},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// Errors raised by registry lookups and mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No provider is registered under the identifier.
    #[error("no such RSP provider: {0}")]
    NoSuchProvider(ProviderId),

    /// The provider does not track a server with the identifier.
    #[error("no such server {server} on RSP provider {provider}")]
    NoSuchServer {
        /// Provider searched.
        provider: ProviderId,
        /// Missing server.
        server: ServerId,
    },

    /// A domain rule rejected the mutation.
    #[error(transparent)]
    Domain(#[from] RspDomainError),

    /// The registry lock was poisoned by a panicking writer.
    #[error("state registry lock poisoned")]
    LockPoisoned,
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

struct ProviderEntry {
    state: RspProviderState,
    connection: Option<ConnectionContext>,
    outputs: HashMap<ServerId, Arc<dyn OutputChannel>>,
}

impl ProviderEntry {
    fn take_outputs(&mut self) -> Vec<Arc<dyn OutputChannel>> {
        self.outputs.drain().map(|(_, channel)| channel).collect()
    }
}

/// The single mutation entry point for provider and server state.
///
/// The container is never exposed; callers read snapshots and mutate
/// through the methods below. Every mutation broadcasts a
/// [`RegistryEvent`]. The lock is never held across an await.
pub struct StateRegistry<C>
where
    C: Clock + Send + Sync,
{
    providers: RwLock<HashMap<ProviderId, ProviderEntry>>,
    events: broadcast::Sender<RegistryEvent>,
    channels: Arc<dyn OutputChannelFactory>,
    clock: Arc<C>,
}

impl<C> StateRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new(channels: Arc<dyn OutputChannelFactory>, clock: Arc<C>, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            providers: RwLock::new(HashMap::new()),
            events,
            channels,
            clock,
        }
    }

    /// Clock stamping provider changes.
    #[must_use]
    pub const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Registers a provider, overwriting the state of an existing one.
    ///
    /// A live connection of an overwritten provider is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the lock is poisoned.
    pub fn register(&self, state: RspProviderState) -> RegistryResult<()> {
        let provider = state.id().clone();
        let status = state.status();
        {
            let mut providers = self.write()?;
            match providers.get_mut(&provider) {
                Some(entry) => entry.state = state,
                None => {
                    providers.insert(
                        provider.clone(),
                        ProviderEntry {
                            state,
                            connection: None,
                            outputs: HashMap::new(),
                        },
                    );
                }
            }
        }
        info!(provider = %provider, status = %status, "registered RSP provider");
        self.notify(RegistryEvent::ProviderChanged { provider, status });
        Ok(())
    }

    /// Moves a provider along its state machine.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers and
    /// [`RegistryError::Domain`] for illegal transitions.
    pub fn set_provider_status(&self, provider: &ProviderId, status: RunState) -> RegistryResult<()> {
        self.with_provider(provider, |entry, clock| {
            entry.state.transition_to(status, clock).map_err(RegistryError::from)
        })?;
        debug!(provider = %provider, status = %status, "RSP provider status changed");
        self.notify(RegistryEvent::ProviderChanged {
            provider: provider.clone(),
            status,
        });
        Ok(())
    }

    /// Moves a startable provider to `Starting` in one locked step.
    ///
    /// Returns `false`, leaving the provider untouched, when its status does
    /// not allow a start, so concurrent starts cannot both proceed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn begin_start(&self, provider: &ProviderId) -> RegistryResult<bool> {
        let claimed = self.with_provider(provider, |entry, clock| {
            if !entry.state.status().can_start() {
                return Ok(false);
            }
            entry
                .state
                .transition_to(RunState::Starting, clock)
                .map_err(RegistryError::from)?;
            Ok(true)
        })?;
        if claimed {
            debug!(provider = %provider, "RSP provider starting");
            self.notify(RegistryEvent::ProviderChanged {
                provider: provider.clone(),
                status: RunState::Starting,
            });
        }
        Ok(claimed)
    }

    /// Restores a status snapshot without validating the transition.
    ///
    /// Only compensating rollbacks use this.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn restore_provider_status(
        &self,
        provider: &ProviderId,
        snapshot: RunState,
    ) -> RegistryResult<()> {
        self.with_provider(provider, |entry, clock| {
            entry.state.restore_status(snapshot, clock);
            Ok(())
        })?;
        info!(provider = %provider, status = %snapshot, "RSP provider status restored");
        self.notify(RegistryEvent::ProviderChanged {
            provider: provider.clone(),
            status: snapshot,
        });
        Ok(())
    }

    /// Appends a server, or replaces the one with the same id, deployables
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn upsert_server(&self, provider: &ProviderId, server: ServerState) -> RegistryResult<()> {
        let event_state = server.clone();
        self.with_provider(provider, |entry, clock| {
            entry.state.upsert_server(server, clock);
            Ok(())
        })?;
        self.notify(RegistryEvent::ServerChanged {
            provider: provider.clone(),
            server: event_state,
        });
        Ok(())
    }

    /// Adds a server in unknown state unless one with the id exists.
    ///
    /// Returns whether a server was added.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn ensure_server(&self, provider: &ProviderId, handle: ServerHandle) -> RegistryResult<bool> {
        let server = ServerState::unknown(handle);
        let event_state = server.clone();
        let added = self.with_provider(provider, |entry, clock| {
            Ok(entry.state.insert_server_if_absent(server, clock))
        })?;
        if added {
            self.notify(RegistryEvent::ServerChanged {
                provider: provider.clone(),
                server: event_state,
            });
        }
        Ok(added)
    }

    /// Replaces the whole server inventory.
    ///
    /// Output channels of servers that disappear are disposed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn replace_servers(
        &self,
        provider: &ProviderId,
        servers: Vec<ServerState>,
    ) -> RegistryResult<()> {
        let snapshot = servers.clone();
        let stale = self.with_provider(provider, |entry, clock| {
            let stale_ids: Vec<ServerId> = entry
                .outputs
                .keys()
                .filter(|id| !servers.iter().any(|server| server.id() == *id))
                .cloned()
                .collect();
            entry.state.replace_servers(servers, clock);
            Ok(stale_ids
                .iter()
                .filter_map(|id| entry.outputs.remove(id))
                .collect::<Vec<_>>())
        })?;
        dispose_all(stale);
        for server in snapshot {
            self.notify(RegistryEvent::ServerChanged {
                provider: provider.clone(),
                server,
            });
        }
        Ok(())
    }

    /// Removes a server and disposes its output channel.
    ///
    /// Returns the removed state, or `None` when the server was not
    /// tracked. The channel is disposed at most once however often the
    /// removal repeats.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn remove_server(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> RegistryResult<Option<ServerState>> {
        let (removed, channel) = self.with_provider(provider, |entry, clock| {
            Ok((entry.state.remove_server(server, clock), entry.outputs.remove(server)))
        })?;
        if let Some(channel) = channel {
            channel.dispose();
        }
        if removed.is_some() {
            debug!(provider = %provider, server = %server, "server removed");
            self.notify(RegistryEvent::ServerRemoved {
                provider: provider.clone(),
                server: server.clone(),
            });
        }
        Ok(removed)
    }

    /// Appends process output for a server, opening its channel on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn append_output(
        &self,
        provider: &ProviderId,
        server: &ServerId,
        text: &str,
    ) -> RegistryResult<()> {
        let channels = Arc::clone(&self.channels);
        let channel = self.with_provider(provider, |entry, _| {
            Ok(Arc::clone(
                entry
                    .outputs
                    .entry(server.clone())
                    .or_insert_with(|| channels.open_channel(server.as_str())),
            ))
        })?;
        channel.append(text);
        self.notify(RegistryEvent::OutputAppended {
            provider: provider.clone(),
            server: server.clone(),
            text: text.to_owned(),
        });
        Ok(())
    }

    /// Stores the live connection, returning any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn attach_connection(
        &self,
        provider: &ProviderId,
        connection: ConnectionContext,
    ) -> RegistryResult<Option<ConnectionContext>> {
        self.with_provider(provider, |entry, _| Ok(entry.connection.replace(connection)))
    }

    /// Returns the live client, or `None` when disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn client(&self, provider: &ProviderId) -> RegistryResult<Option<Arc<dyn RspClient>>> {
        self.read_provider(provider, |entry| {
            entry
                .connection
                .as_ref()
                .map(|connection| Arc::clone(connection.client()))
        })
    }

    /// Returns the launch metadata of the live connection.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn launch(&self, provider: &ProviderId) -> RegistryResult<Option<RspLaunch>> {
        self.read_provider(provider, |entry| {
            entry
                .connection
                .as_ref()
                .map(|connection| connection.launch().clone())
        })
    }

    /// Detaches a provider: takes its connection, disposes its output
    /// channels and resets the inventory to detached.
    ///
    /// The caller releases the returned connection the way it chooses.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn dispose(&self, provider: &ProviderId) -> RegistryResult<Option<ConnectionContext>> {
        let (connection, outputs, status) = self.with_provider(provider, |entry, clock| {
            entry.state.detach(clock);
            Ok((entry.connection.take(), entry.take_outputs(), entry.state.status()))
        })?;
        dispose_all(outputs);
        debug!(provider = %provider, connected = connection.is_some(), "RSP provider disposed");
        self.notify(RegistryEvent::ProviderChanged {
            provider: provider.clone(),
            status,
        });
        Ok(connection)
    }

    /// Disposes and forgets a provider.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn deregister(&self, provider: &ProviderId) -> RegistryResult<Option<ConnectionContext>> {
        let mut entry = self
            .write()?
            .remove(provider)
            .ok_or_else(|| RegistryError::NoSuchProvider(provider.clone()))?;
        dispose_all(entry.take_outputs());
        info!(provider = %provider, "deregistered RSP provider");
        self.notify(RegistryEvent::ProviderRemoved(provider.clone()));
        Ok(entry.connection.take())
    }

    /// Returns one server.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] or
    /// [`RegistryError::NoSuchServer`].
    pub fn lookup(&self, provider: &ProviderId, server: &ServerId) -> RegistryResult<ServerState> {
        self.read_provider(provider, |entry| entry.state.server(server).cloned())?
            .ok_or_else(|| RegistryError::NoSuchServer {
                provider: provider.clone(),
                server: server.clone(),
            })
    }

    /// Returns a provider snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn provider(&self, provider: &ProviderId) -> RegistryResult<RspProviderState> {
        self.read_provider(provider, |entry| entry.state.clone())
    }

    /// Returns every provider, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the lock is poisoned.
    pub fn providers(&self) -> RegistryResult<Vec<RspProviderState>> {
        let mut states: Vec<RspProviderState> = self
            .read()?
            .values()
            .map(|entry| entry.state.clone())
            .collect();
        states.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(states)
    }

    /// Returns the servers of a provider; empty when detached.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchProvider`] for unknown providers.
    pub fn servers(&self, provider: &ProviderId) -> RegistryResult<Vec<ServerState>> {
        self.read_provider(provider, |entry| entry.state.servers().to_vec())
    }

    fn notify(&self, event: RegistryEvent) {
        if self.events.send(event).is_err() {
            trace!("no registry subscribers");
        }
    }

    fn read(
        &self,
    ) -> RegistryResult<std::sync::RwLockReadGuard<'_, HashMap<ProviderId, ProviderEntry>>> {
        self.providers.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(
        &self,
    ) -> RegistryResult<std::sync::RwLockWriteGuard<'_, HashMap<ProviderId, ProviderEntry>>> {
        self.providers.write().map_err(|_| RegistryError::LockPoisoned)
    }

    fn read_provider<T>(
        &self,
        provider: &ProviderId,
        read: impl FnOnce(&ProviderEntry) -> T,
    ) -> RegistryResult<T> {
        let providers = self.read()?;
        let entry = providers
            .get(provider)
            .ok_or_else(|| RegistryError::NoSuchProvider(provider.clone()))?;
        Ok(read(entry))
    }

    fn with_provider<T>(
        &self,
        provider: &ProviderId,
        mutate: impl FnOnce(&mut ProviderEntry, &C) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut providers = self.write()?;
        let entry = providers
            .get_mut(provider)
            .ok_or_else(|| RegistryError::NoSuchProvider(provider.clone()))?;
        mutate(entry, &*self.clock)
    }
}

fn dispose_all(channels: Vec<Arc<dyn OutputChannel>>) {
    for channel in channels {
        channel.dispose();
    }
}
