//! Error types for workflow resolution and round-trips.

use crate::rsp::{domain::Status, ports::ProtocolError};
use thiserror::Error;

/// Errors that end a workflow run without a result.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// An item declared a kind with no resolution strategy.
    #[error("workflow item '{item}' has unsupported kind '{kind}'")]
    UnsupportedItemKind {
        /// Item identifier.
        item: String,
        /// Declared kind string.
        kind: String,
    },

    /// The server ended the run with an error, cancel or otherwise non-ok
    /// status. The full status is kept for callers that need more than the
    /// message.
    #[error("workflow rejected: {}", .0.message)]
    Rejected(Status),

    /// The server kept asking for input past the configured round cap.
    #[error("protocol violation: workflow did not complete within {limit} rounds")]
    RoundLimitExceeded {
        /// Configured round cap.
        limit: usize,
    },

    /// An integer prompt was answered with something that is not a number.
    #[error("workflow item '{item}' expects a whole number, got '{value}'")]
    InvalidIntegerResponse {
        /// Item identifier.
        item: String,
        /// Raw answer.
        value: String,
    },

    /// A round-trip failed below the protocol level.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
