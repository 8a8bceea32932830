//! Error types for RSP domain validation and wire-code parsing.

use super::{ProviderId, RunState};
use thiserror::Error;

/// Errors returned while constructing or transitioning RSP domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RspDomainError {
    /// An identifier is empty after trimming.
    #[error("{kind} identifier must not be empty")]
    EmptyIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// A run-state wire code is outside the protocol's range.
    #[error("unknown run state code: {0}")]
    UnknownRunState(i32),

    /// A publish-state wire code is outside the protocol's range.
    #[error("unknown publish state code: {0}")]
    UnknownPublishState(i32),

    /// A publish-kind wire code is outside the protocol's range.
    #[error("unknown publish kind code: {0}")]
    UnknownPublishKind(i32),

    /// A severity wire code is outside the protocol's range.
    #[error("unknown status severity code: {0}")]
    UnknownSeverity(i32),

    /// A run mode string is neither `run` nor `debug`.
    #[error("unknown run mode: {0}")]
    UnknownRunMode(String),

    /// The provider state machine does not allow the requested move.
    #[error("invalid RSP provider transition for {provider}: {from} -> {to}")]
    InvalidProviderTransition {
        /// Provider whose status was being changed.
        provider: ProviderId,
        /// Current status.
        from: RunState,
        /// Requested status.
        to: RunState,
    },
}
