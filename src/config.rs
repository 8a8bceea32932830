//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::rsp::domain::ClientCapabilities;
use crate::workflow::services::DEFAULT_ROUND_LIMIT;

/// Output line an RSP-launched JVM prints once its debug agent listens.
pub const DEFAULT_DEBUG_READY_MARKER: &str = "Listening for transport dt_socket at address:";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid orchestrator configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for the lifecycle controller and workflow engine.
///
/// Every field has a default, so a partial JSON document is accepted.
///
/// # Examples
///
/// ```
/// use rsp_conductor::config::OrchestratorConfig;
///
/// let config = OrchestratorConfig::from_json(r#"{"workflowRoundLimit": 8}"#)
///     .expect("valid configuration");
/// assert_eq!(config.workflow_round_limit, 8);
/// assert_eq!(config.capability_timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Maximum protocol round-trips in one workflow run.
    pub workflow_round_limit: usize,
    /// Budget for the initial capability exchange, in milliseconds.
    pub capability_timeout_ms: u64,
    /// Budget for listing downloadable runtimes, in milliseconds.
    pub runtime_listing_timeout_ms: u64,
    /// How long a restart waits for the server to stop, in milliseconds.
    pub restart_timeout_ms: u64,
    /// Output text that signals a debug agent is ready for attach.
    pub debug_ready_marker: String,
    /// Capacity of the registry change-event channel.
    pub event_buffer: usize,
    /// Capabilities announced to every RSP on connect.
    pub client_capabilities: BTreeMap<String, String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workflow_round_limit: DEFAULT_ROUND_LIMIT,
            capability_timeout_ms: 5_000,
            runtime_listing_timeout_ms: 20_000,
            restart_timeout_ms: 300_000, // 5 minutes
            debug_ready_marker: DEFAULT_DEBUG_READY_MARKER.to_owned(),
            event_buffer: 256,
            client_capabilities: BTreeMap::from([
                ("protocol.version".to_owned(), "0.23.0".to_owned()),
                ("prompt.string".to_owned(), "true".to_owned()),
            ]),
        }
    }
}

impl OrchestratorConfig {
    /// Creates a configuration with short budgets.
    ///
    /// Useful for tests against in-memory adapters.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            capability_timeout_ms: 200,
            runtime_listing_timeout_ms: 200,
            restart_timeout_ms: 1_000,
            ..Self::default()
        }
    }

    /// Parses a JSON document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Capability-exchange budget.
    #[must_use]
    pub const fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }

    /// Runtime-listing budget.
    #[must_use]
    pub const fn runtime_listing_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime_listing_timeout_ms)
    }

    /// Restart wait budget.
    #[must_use]
    pub const fn restart_timeout(&self) -> Duration {
        Duration::from_millis(self.restart_timeout_ms)
    }

    /// Client capabilities as the protocol value.
    #[must_use]
    pub fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            map: self.client_capabilities.clone(),
        }
    }
}
