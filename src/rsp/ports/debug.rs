//! Debugger bridge port.

use crate::rsp::domain::{ProviderId, ServerHandle};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Debug session to attach once a server reports it is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSession {
    /// Provider owning the server.
    pub provider: ProviderId,
    /// Server being debugged.
    pub server: ServerHandle,
    /// Debugger protocol, such as `java`.
    pub debug_type: String,
    /// Port the debug agent listens on.
    pub port: u16,
}

/// Errors raised by a debugger bridge.
#[derive(Debug, Clone, Error)]
#[error("debugger attach failed: {0}")]
pub struct DebugError(pub Arc<dyn std::error::Error + Send + Sync>);

impl DebugError {
    /// Wraps an attach failure.
    pub fn attach(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Host debugger integration.
#[async_trait]
pub trait DebugBridge: Send + Sync {
    /// Returns the companion extension needed for a debugger protocol, or
    /// `None` when the protocol is unsupported.
    fn required_extension(&self, debug_type: &str) -> Option<String>;

    /// Returns whether an extension is installed.
    fn is_extension_installed(&self, extension_id: &str) -> bool;

    /// Attaches the debugger.
    async fn attach(&self, session: DebugSession) -> Result<(), DebugError>;
}
