//! Closed set of workflow item kinds.

use super::{WorkflowError, WorkflowResponseItem};
use std::fmt;

/// Wire prefix some RSP implementations put in front of item types.
const WIRE_PREFIX: &str = "workflow.";

/// Property naming the URL a `browser.open` item points at.
pub const BROWSER_URL_PROPERTY: &str = "workflow.browser.url";
/// Property naming a file an editor item should open.
pub const EDITOR_PATH_PROPERTY: &str = "workflow.editor.file.path";
/// Property carrying replacement editor content.
pub const EDITOR_CONTENT_PROPERTY: &str = "workflow.editor.file.content";
/// Property carrying the command a `terminal.open` item runs.
pub const TERMINAL_COMMAND_PROPERTY: &str = "workflow.terminal.cmd";

/// How a workflow item gets resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowItemKind {
    /// Inline prompt, or an editor when the content spans several lines.
    PromptSmall,
    /// Editor-backed prompt.
    PromptLarge,
    /// Opens a file or buffer in an editor.
    EditorOpen,
    /// Opens a URI externally.
    BrowserOpen,
    /// Runs a command in a terminal.
    TerminalOpen,
}

impl WorkflowItemKind {
    /// Returns the canonical short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PromptSmall => "prompt.small",
            Self::PromptLarge => "prompt.large",
            Self::EditorOpen => "editor.open",
            Self::BrowserOpen => "browser.open",
            Self::TerminalOpen => "terminal.open",
        }
    }

    /// Parses an item-type string, with or without the `workflow.` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnsupportedItemKind`] for any other name.
    pub fn parse(item_id: &str, item_type: &str) -> Result<Self, WorkflowError> {
        let trimmed = item_type.trim();
        let name = trimmed.strip_prefix(WIRE_PREFIX).unwrap_or(trimmed);
        match name {
            "prompt.small" => Ok(Self::PromptSmall),
            "prompt.large" => Ok(Self::PromptLarge),
            "editor.open" => Ok(Self::EditorOpen),
            "browser.open" => Ok(Self::BrowserOpen),
            "terminal.open" => Ok(Self::TerminalOpen),
            _ => Err(WorkflowError::UnsupportedItemKind {
                item: item_id.to_owned(),
                kind: item_type.to_owned(),
            }),
        }
    }

    /// Returns the kind declared by an item; an absent type means `prompt.small`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnsupportedItemKind`] for unknown type names.
    pub fn of(item: &WorkflowResponseItem) -> Result<Self, WorkflowError> {
        item.item_type
            .as_deref()
            .map_or(Ok(Self::PromptSmall), |item_type| {
                Self::parse(&item.id, item_type)
            })
    }
}

impl fmt::Display for WorkflowItemKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
