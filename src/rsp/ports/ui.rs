//! UI capability port.
//!
//! Only the capabilities the orchestrator needs are modelled: pickers,
//! input boxes, an editable surface, external browser and terminal
//! launchers, output logs and toast messages. Every blocking capability
//! returns `None` when the user dismisses it.

use async_trait::async_trait;
use std::path::PathBuf;

/// Severity of a toast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

/// Multi-choice picker request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    /// Title or question.
    pub title: String,
    /// Choices, in display order.
    pub options: Vec<String>,
}

impl PickRequest {
    /// Creates a picker request.
    #[must_use]
    pub fn new(title: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            title: title.into(),
            options,
        }
    }
}

/// What an input box accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputKind {
    /// Any text.
    #[default]
    Text,
    /// Whole numbers only.
    Integer,
}

/// Free-text input request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputRequest {
    /// Prompt text.
    pub prompt: String,
    /// Pre-filled value.
    pub default_value: Option<String>,
    /// Whether input is masked.
    pub secret: bool,
    /// Accepted input.
    pub kind: InputKind,
}

impl InputRequest {
    /// Creates a plain text request.
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Request to show text in an editable surface and wait for save or close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Title of the surface.
    pub title: String,
    /// File to open; `None` opens a virtual buffer.
    pub path: Option<PathBuf>,
    /// Initial buffer content when no file is given.
    pub content: Option<String>,
}

impl EditRequest {
    /// Opens a virtual buffer with the given content.
    #[must_use]
    pub fn buffer(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: None,
            content: Some(content.into()),
        }
    }

    /// Opens a file.
    #[must_use]
    pub fn file(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            path: Some(path.into()),
            content: None,
        }
    }
}

/// A named output log.
pub trait OutputChannel: Send + Sync {
    /// Appends text.
    fn append(&self, text: &str);

    /// Releases the channel. Called at most once per channel.
    fn dispose(&self);
}

/// Creates output logs.
pub trait OutputChannelFactory: Send + Sync {
    /// Opens a log with the given name.
    fn open_channel(&self, name: &str) -> std::sync::Arc<dyn OutputChannel>;
}

/// Interactive capabilities consumed by workflows and lifecycle commands.
#[async_trait]
pub trait UserInterface: OutputChannelFactory {
    /// Shows a picker; returns the chosen option.
    async fn pick(&self, request: PickRequest) -> Option<String>;

    /// Shows an input box; returns the entered text.
    async fn input(&self, request: InputRequest) -> Option<String>;

    /// Shows an editable surface; returns the content at save/close.
    async fn edit(&self, request: EditRequest) -> Option<String>;

    /// Opens a URI externally. Does not block.
    fn open_browser(&self, uri: &str);

    /// Runs a command in a new terminal. Does not block.
    fn open_terminal(&self, name: &str, command: &str);

    /// Shows a toast.
    fn show_message(&self, level: MessageLevel, message: &str);
}
