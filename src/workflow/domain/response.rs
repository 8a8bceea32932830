//! Values exchanged in one round of an interactive workflow.

use crate::rsp::domain::Status;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque correlation identifier linking one round to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowRequestId(i64);

impl WorkflowRequestId {
    /// Wraps a raw request identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw request identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WorkflowRequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Kind of answer a prompt expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Informational; nothing is recorded.
    #[default]
    None,
    /// Yes/no.
    Bool,
    /// Whole number.
    Int,
    /// Free text.
    String,
}

/// Constraints on how an item should be answered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPrompt {
    /// Expected answer type.
    #[serde(default)]
    pub response_type: ResponseType,
    /// Whether input must be masked.
    #[serde(default)]
    pub response_secret: bool,
    /// Closed set of acceptable answers; empty means unconstrained.
    #[serde(default)]
    pub valid_responses: Vec<String>,
}

impl WorkflowPrompt {
    /// Creates a prompt expecting the given answer type.
    #[must_use]
    pub const fn new(response_type: ResponseType) -> Self {
        Self {
            response_type,
            response_secret: false,
            valid_responses: Vec::new(),
        }
    }

    /// Marks the answer as secret.
    #[must_use]
    pub const fn secret(mut self) -> Self {
        self.response_secret = true;
        self
    }

    /// Restricts the answer to a closed set.
    #[must_use]
    pub fn with_valid_responses(mut self, responses: impl IntoIterator<Item = String>) -> Self {
        self.valid_responses = responses.into_iter().collect();
        self
    }
}

/// One question or action the server asks the client to handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponseItem {
    /// Key under which the answer is recorded.
    pub id: String,
    /// Short label.
    #[serde(default)]
    pub label: String,
    /// Body text shown to the user.
    #[serde(default)]
    pub content: Option<String>,
    /// Resolution strategy name; absent means `prompt.small`.
    #[serde(default)]
    pub item_type: Option<String>,
    /// Answer constraints.
    #[serde(default)]
    pub prompt: Option<WorkflowPrompt>,
    /// Strategy-specific properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl WorkflowResponseItem {
    /// Creates an item with an identifier and label.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            content: None,
            item_type: None,
            prompt: None,
            properties: BTreeMap::new(),
        }
    }

    /// Sets the item type string.
    #[must_use]
    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the prompt constraints.
    #[must_use]
    pub fn with_prompt(mut self, prompt: WorkflowPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Adds a strategy property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the declared answer type, `None` when no prompt is attached.
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        self.prompt
            .as_ref()
            .map_or(ResponseType::None, |prompt| prompt.response_type)
    }
}

/// Response received from one workflow round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponse {
    /// Outcome status of this round.
    pub status: Status,
    /// Correlation identifier for the next round.
    #[serde(default)]
    pub request_id: Option<WorkflowRequestId>,
    /// Items to resolve before resubmitting, in declared order.
    #[serde(default)]
    pub items: Vec<WorkflowResponseItem>,
}

impl WorkflowResponse {
    /// Creates a response without items.
    #[must_use]
    pub const fn terminal(status: Status) -> Self {
        Self {
            status,
            request_id: None,
            items: Vec::new(),
        }
    }

    /// Creates a "need more input" response carrying items.
    #[must_use]
    pub fn needs_input(
        request_id: Option<WorkflowRequestId>,
        items: Vec<WorkflowResponseItem>,
    ) -> Self {
        Self {
            status: Status::info("more input required"),
            request_id,
            items,
        }
    }
}
