//! Change notifications broadcast by the state registry.

use crate::rsp::domain::{ProviderId, RunState, ServerId, ServerState};

/// A mutation observed on the state registry.
///
/// Every event names the node it touched so dependent views refresh only
/// that node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A provider was registered, changed status or was disposed.
    ProviderChanged {
        /// Affected provider.
        provider: ProviderId,
        /// Status after the change.
        status: RunState,
    },
    /// A provider was deregistered.
    ProviderRemoved(ProviderId),
    /// A server was added or its state replaced.
    ServerChanged {
        /// Owning provider.
        provider: ProviderId,
        /// Fresh server state.
        server: ServerState,
    },
    /// A server was removed.
    ServerRemoved {
        /// Owning provider.
        provider: ProviderId,
        /// Removed server.
        server: ServerId,
    },
    /// A server process wrote output.
    OutputAppended {
        /// Owning provider.
        provider: ProviderId,
        /// Writing server.
        server: ServerId,
        /// Appended text.
        text: String,
    },
}

impl RegistryEvent {
    /// Returns the provider the event concerns.
    #[must_use]
    pub const fn provider(&self) -> &ProviderId {
        match self {
            Self::ProviderChanged { provider, .. }
            | Self::ProviderRemoved(provider)
            | Self::ServerChanged { provider, .. }
            | Self::ServerRemoved { provider, .. }
            | Self::OutputAppended { provider, .. } => provider,
        }
    }
}
