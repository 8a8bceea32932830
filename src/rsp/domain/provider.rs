//! RSP provider aggregate: one per provider type, owning its servers.

use super::{ProviderId, RspDomainError, RunState, ServerId, ServerState};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Servers known beneath a provider.
///
/// `Detached` means the provider is known but has no live connection, so
/// nothing is being tracked. `Tracked` holds the last synchronised list,
/// which may legitimately be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "inventory", content = "servers", rename_all = "snake_case")]
pub enum ServerInventory {
    /// No connection; servers are not tracked.
    #[default]
    Detached,
    /// Servers reported by the live connection, in arrival order.
    Tracked(Vec<ServerState>),
}

impl ServerInventory {
    /// Returns the tracked servers, or an empty slice when detached.
    #[must_use]
    pub fn servers(&self) -> &[ServerState] {
        match self {
            Self::Detached => &[],
            Self::Tracked(servers) => servers,
        }
    }

    /// Returns whether the inventory is being tracked.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked(_))
    }
}

/// Canonical state of one RSP provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RspProviderState {
    id: ProviderId,
    display_name: String,
    status: RunState,
    inventory: ServerInventory,
    updated_at: DateTime<Utc>,
}

impl RspProviderState {
    /// Creates a detached provider state.
    #[must_use]
    pub fn new(
        id: ProviderId,
        display_name: impl Into<String>,
        status: RunState,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            status,
            inventory: ServerInventory::Detached,
            updated_at: clock.utc(),
        }
    }

    /// Returns the provider identifier.
    #[must_use]
    pub const fn id(&self) -> &ProviderId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> RunState {
        self.status
    }

    /// Returns the server inventory.
    #[must_use]
    pub const fn inventory(&self) -> &ServerInventory {
        &self.inventory
    }

    /// Returns the tracked servers (empty when detached).
    #[must_use]
    pub fn servers(&self) -> &[ServerState] {
        self.inventory.servers()
    }

    /// Returns the timestamp of the last mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Finds a tracked server by identifier.
    #[must_use]
    pub fn server(&self, server_id: &ServerId) -> Option<&ServerState> {
        self.servers().iter().find(|server| server.id() == server_id)
    }

    /// Moves the provider along its state machine.
    ///
    /// # Errors
    ///
    /// Returns [`RspDomainError::InvalidProviderTransition`] when the move is
    /// not allowed from the current status.
    pub fn transition_to(
        &mut self,
        target: RunState,
        clock: &impl Clock,
    ) -> Result<(), RspDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(RspDomainError::InvalidProviderTransition {
                provider: self.id.clone(),
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Restores a previously snapshotted status without validation.
    ///
    /// Only a failed forced stop may use this.
    pub fn restore_status(&mut self, snapshot: RunState, clock: &impl Clock) {
        self.status = snapshot;
        self.touch(clock);
    }

    /// Appends the server, or replaces the entry with the same identifier.
    ///
    /// A replace takes the incoming deployable list wholesale. A detached
    /// inventory becomes tracked.
    pub fn upsert_server(&mut self, server: ServerState, clock: &impl Clock) {
        let mut servers = self.take_servers();
        match servers.iter_mut().find(|existing| existing.id() == server.id()) {
            Some(existing) => *existing = server,
            None => servers.push(server),
        }
        self.inventory = ServerInventory::Tracked(servers);
        self.touch(clock);
    }

    /// Inserts the server only when no entry with its identifier exists.
    ///
    /// Returns whether an insert happened.
    pub fn insert_server_if_absent(&mut self, server: ServerState, clock: &impl Clock) -> bool {
        if self.server(server.id()).is_some() {
            return false;
        }
        let mut servers = self.take_servers();
        servers.push(server);
        self.inventory = ServerInventory::Tracked(servers);
        self.touch(clock);
        true
    }

    /// Replaces the whole inventory with a freshly synchronised list.
    pub fn replace_servers(&mut self, servers: Vec<ServerState>, clock: &impl Clock) {
        self.inventory = ServerInventory::Tracked(servers);
        self.touch(clock);
    }

    /// Removes a server by identifier, returning it when present.
    pub fn remove_server(&mut self, server_id: &ServerId, clock: &impl Clock) -> Option<ServerState> {
        let ServerInventory::Tracked(servers) = &mut self.inventory else {
            return None;
        };
        let position = servers.iter().position(|server| server.id() == server_id)?;
        let removed = servers.remove(position);
        self.touch(clock);
        Some(removed)
    }

    /// Drops every tracked server and marks the inventory detached.
    pub fn detach(&mut self, clock: &impl Clock) -> Vec<ServerState> {
        let servers = self.take_servers();
        self.touch(clock);
        servers
    }

    /// Takes the tracked list out, leaving the inventory detached.
    fn take_servers(&mut self) -> Vec<ServerState> {
        match std::mem::take(&mut self.inventory) {
            ServerInventory::Detached => Vec::new(),
            ServerInventory::Tracked(servers) => servers,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
