//! Closed status vocabularies shared by providers, servers and deployables.
//!
//! The protocol transmits these as integer codes; the domain keeps them as
//! enums so that every `match` over a state is exhaustive.

use super::RspDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run state of an RSP provider, a server or a deployable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RunState {
    /// State has not been reported yet.
    Unknown,
    /// Start has been requested and is in progress.
    Starting,
    /// Running.
    Started,
    /// Stop has been requested and is in progress.
    Stopping,
    /// Not running.
    Stopped,
}

impl RunState {
    /// Returns the protocol wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Starting => 1,
            Self::Started => 2,
            Self::Stopping => 3,
            Self::Stopped => 4,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }

    /// Returns whether a start may be requested from this state.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Unknown | Self::Stopped)
    }

    /// Returns whether a stop may be requested from this state.
    #[must_use]
    pub const fn can_stop(self) -> bool {
        matches!(self, Self::Starting | Self::Started | Self::Stopping)
    }

    /// Returns whether the provider state machine allows moving to `target`.
    ///
    /// Moving to the current state is always allowed, as is moving to
    /// `Stopped` (disconnects and closed connections end every lifecycle).
    /// Rolling back a failed forced stop is not a transition; it goes
    /// through an explicit restore instead.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (_, Self::Stopped)
                | (Self::Unknown, Self::Unknown)
                | (Self::Starting, Self::Starting)
                | (Self::Started, Self::Started)
                | (Self::Stopping, Self::Stopping)
                | (Self::Unknown | Self::Stopped, Self::Starting | Self::Started)
                | (Self::Starting, Self::Started | Self::Stopping | Self::Unknown)
                | (Self::Started, Self::Stopping)
        )
    }
}

impl TryFrom<i32> for RunState {
    type Error = RspDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Starting),
            2 => Ok(Self::Started),
            3 => Ok(Self::Stopping),
            4 => Ok(Self::Stopped),
            other => Err(RspDomainError::UnknownRunState(other)),
        }
    }
}

impl From<RunState> for i32 {
    fn from(value: RunState) -> Self {
        value.code()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Publish state of a server or deployable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PublishState {
    /// Deployed content matches the workspace.
    Synchronized,
    /// An incremental publish is required.
    PublishRequired,
    /// A full publish is required.
    FullPublishRequired,
    /// A deployable was added and awaits publishing.
    IncrementalAddRequired,
    /// A deployable was removed and awaits publishing.
    IncrementalRemoveRequired,
    /// Publish state has not been reported.
    Unknown,
}

impl PublishState {
    /// Returns the protocol wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Synchronized => 1,
            Self::PublishRequired => 2,
            Self::FullPublishRequired => 3,
            Self::IncrementalAddRequired => 4,
            Self::IncrementalRemoveRequired => 5,
            Self::Unknown => 6,
        }
    }
}

impl TryFrom<i32> for PublishState {
    type Error = RspDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Synchronized),
            2 => Ok(Self::PublishRequired),
            3 => Ok(Self::FullPublishRequired),
            4 => Ok(Self::IncrementalAddRequired),
            5 => Ok(Self::IncrementalRemoveRequired),
            6 => Ok(Self::Unknown),
            other => Err(RspDomainError::UnknownPublishState(other)),
        }
    }
}

impl From<PublishState> for i32 {
    fn from(value: PublishState) -> Self {
        value.code()
    }
}

/// Mode a server was launched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Normal launch.
    #[default]
    Run,
    /// Launch with a debug agent listening.
    Debug,
}

impl RunMode {
    /// Returns the protocol string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Debug => "debug",
        }
    }
}

impl TryFrom<&str> for RunMode {
    type Error = RspDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "run" => Ok(Self::Run),
            "debug" => Ok(Self::Debug),
            _ => Err(RspDomainError::UnknownRunMode(value.to_owned())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Kind of publish requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PublishKind {
    /// Publish only changed resources.
    Incremental,
    /// Republish everything.
    Full,
    /// Remove deployed content and republish.
    Clean,
    /// Let the server decide.
    Auto,
}

impl PublishKind {
    /// Returns the protocol wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Incremental => 1,
            Self::Full => 2,
            Self::Clean => 3,
            Self::Auto => 4,
        }
    }
}

impl TryFrom<i32> for PublishKind {
    type Error = RspDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Incremental),
            2 => Ok(Self::Full),
            3 => Ok(Self::Clean),
            4 => Ok(Self::Auto),
            other => Err(RspDomainError::UnknownPublishKind(other)),
        }
    }
}

impl From<PublishKind> for i32 {
    fn from(value: PublishKind) -> Self {
        value.code()
    }
}

/// Severity carried by every protocol [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Severity {
    /// The request succeeded.
    Ok,
    /// The request needs more input before it can finish.
    Info,
    /// The request finished with a warning.
    Warning,
    /// The request failed.
    Error,
    /// The request was canceled remotely.
    Cancel,
}

impl Severity {
    /// Returns the protocol wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 4,
            Self::Cancel => 8,
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = RspDomainError;

    fn try_from(value: i32) -> Result<Severity, RspDomainError> {
        match value {
            0 => Ok(Severity::Ok),
            1 => Ok(Severity::Info),
            2 => Ok(Severity::Warning),
            4 => Ok(Severity::Error),
            8 => Ok(Severity::Cancel),
            other => Err(RspDomainError::UnknownSeverity(other)),
        }
    }
}

impl From<Severity> for i32 {
    fn from(value: Severity) -> Self {
        value.code()
    }
}

/// Outcome status returned by every outgoing protocol call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Severity of the outcome.
    pub severity: Severity,
    /// Identifier of the server-side plugin that produced the status.
    #[serde(default)]
    pub plugin: String,
    /// Plugin-specific code.
    #[serde(default)]
    pub code: i32,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Optional stack trace.
    #[serde(default)]
    pub trace: Option<String>,
}

impl Status {
    /// Creates a status with the given severity and message.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            plugin: String::new(),
            code: 0,
            message: message.into(),
            trace: None,
        }
    }

    /// Creates an `Ok` status with an empty message.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(Severity::Ok, "")
    }

    /// Creates an `Info` status, the protocol's "need more input" signal.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Creates an `Error` status.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Creates a `Cancel` status.
    #[must_use]
    pub fn cancel(message: impl Into<String>) -> Self {
        Self::new(Severity::Cancel, message)
    }

    /// Returns whether the severity is strictly `Ok`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }
}
