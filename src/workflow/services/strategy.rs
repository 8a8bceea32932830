//! Resolution strategies for workflow items.

use crate::rsp::ports::{EditRequest, InputKind, InputRequest, MessageLevel, PickRequest, UserInterface};
use crate::workflow::domain::{
    BROWSER_URL_PROPERTY, EDITOR_CONTENT_PROPERTY, EDITOR_PATH_PROPERTY, ResponseMap,
    ResponseType, TERMINAL_COMMAND_PROPERTY, WorkflowError, WorkflowItemKind, WorkflowResponseItem,
    WorkflowResult,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const YES: &str = "Yes";
const NO: &str = "No";

/// Result of resolving a single workflow item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The item was handled; any answer has been recorded.
    Resolved,
    /// The user dismissed the prompt.
    Canceled,
}

impl ItemOutcome {
    /// Returns whether the user dismissed the prompt.
    #[must_use]
    pub const fn is_canceled(self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Dispatches workflow items to the UI capability that resolves them.
///
/// Routing is an exhaustive match over [`WorkflowItemKind`]; an item whose
/// kind string is not recognised fails with
/// [`WorkflowError::UnsupportedItemKind`] before any UI is shown.
pub struct WorkflowStrategies<U>
where
    U: UserInterface + ?Sized,
{
    ui: Arc<U>,
}

impl<U> Clone for WorkflowStrategies<U>
where
    U: UserInterface + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            ui: Arc::clone(&self.ui),
        }
    }
}

impl<U> WorkflowStrategies<U>
where
    U: UserInterface + ?Sized,
{
    /// Creates a dispatcher over the given UI.
    #[must_use]
    pub const fn new(ui: Arc<U>) -> Self {
        Self { ui }
    }

    /// Resolves one item, writing its answer into `responses` under the
    /// item id unless the user cancels.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnsupportedItemKind`] for unknown kinds and
    /// [`WorkflowError::InvalidIntegerResponse`] when an integer prompt
    /// receives text that is not a whole number.
    pub async fn resolve(
        &self,
        item: &WorkflowResponseItem,
        responses: &mut ResponseMap,
    ) -> WorkflowResult<ItemOutcome> {
        let kind = WorkflowItemKind::of(item)?;
        debug!(item = %item.id, kind = %kind, "resolving workflow item");
        match kind {
            WorkflowItemKind::PromptSmall => self.prompt_small(item, responses).await,
            WorkflowItemKind::PromptLarge => self.prompt_large(item, responses).await,
            WorkflowItemKind::EditorOpen => {
                self.open_editor(item).await;
                Ok(ItemOutcome::Resolved)
            }
            WorkflowItemKind::BrowserOpen => {
                self.open_browser(item);
                Ok(ItemOutcome::Resolved)
            }
            WorkflowItemKind::TerminalOpen => {
                self.open_terminal(item);
                Ok(ItemOutcome::Resolved)
            }
        }
    }

    async fn prompt_small(
        &self,
        item: &WorkflowResponseItem,
        responses: &mut ResponseMap,
    ) -> WorkflowResult<ItemOutcome> {
        if let Some(content) = item.content.as_deref().filter(|text| text.contains('\n')) {
            let request = EditRequest::buffer(&item.label, content);
            return Ok(record(responses, item, self.ui.edit(request).await.map(Value::String)));
        }

        let prompt = item.prompt.clone().unwrap_or_default();
        let question = question_for(item);
        match prompt.response_type {
            ResponseType::None => {
                self.ui.show_message(MessageLevel::Info, &question);
                Ok(ItemOutcome::Resolved)
            }
            ResponseType::Bool => {
                let request = PickRequest::new(question, vec![YES.to_owned(), NO.to_owned()]);
                let answer = self.ui.pick(request).await;
                Ok(record(responses, item, answer.map(|choice| Value::Bool(choice == YES))))
            }
            response_type @ (ResponseType::Int | ResponseType::String)
                if !prompt.valid_responses.is_empty() =>
            {
                let request = PickRequest::new(question, prompt.valid_responses);
                let Some(choice) = self.ui.pick(request).await else {
                    return Ok(ItemOutcome::Canceled);
                };
                let value = if response_type == ResponseType::Int {
                    Value::from(parse_integer(item, &choice)?)
                } else {
                    Value::String(choice)
                };
                Ok(record(responses, item, Some(value)))
            }
            ResponseType::Int => {
                let request = InputRequest {
                    prompt: question,
                    secret: prompt.response_secret,
                    kind: InputKind::Integer,
                    ..InputRequest::default()
                };
                let Some(text) = self.ui.input(request).await else {
                    return Ok(ItemOutcome::Canceled);
                };
                let value = parse_integer(item, &text)?;
                Ok(record(responses, item, Some(Value::from(value))))
            }
            ResponseType::String => {
                let request = InputRequest {
                    prompt: question,
                    secret: prompt.response_secret,
                    ..InputRequest::default()
                };
                Ok(record(responses, item, self.ui.input(request).await.map(Value::String)))
            }
        }
    }

    async fn prompt_large(
        &self,
        item: &WorkflowResponseItem,
        responses: &mut ResponseMap,
    ) -> WorkflowResult<ItemOutcome> {
        let answer = self.ui.edit(editor_request(item)).await;
        Ok(record(responses, item, answer.map(Value::String)))
    }

    async fn open_editor(&self, item: &WorkflowResponseItem) {
        // Informational: closing the editor does not abandon the workflow.
        let _ = self.ui.edit(editor_request(item)).await;
    }

    fn open_browser(&self, item: &WorkflowResponseItem) {
        let target = item
            .property(BROWSER_URL_PROPERTY)
            .or(item.content.as_deref());
        match target {
            Some(uri) => self.ui.open_browser(uri),
            None => debug!(item = %item.id, "browser item carries no url"),
        }
    }

    fn open_terminal(&self, item: &WorkflowResponseItem) {
        if let Some(command) = item.property(TERMINAL_COMMAND_PROPERTY) {
            self.ui.open_terminal(&item.label, command);
        }
    }
}

fn question_for(item: &WorkflowResponseItem) -> String {
    match item.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content.to_owned(),
        _ => item.label.clone(),
    }
}

fn editor_request(item: &WorkflowResponseItem) -> EditRequest {
    if let Some(path) = item.property(EDITOR_PATH_PROPERTY) {
        return EditRequest::file(&item.label, path);
    }
    let content = item
        .property(EDITOR_CONTENT_PROPERTY)
        .or(item.content.as_deref())
        .unwrap_or_default();
    EditRequest::buffer(&item.label, content)
}

fn parse_integer(item: &WorkflowResponseItem, text: &str) -> WorkflowResult<i64> {
    text.trim()
        .parse()
        .map_err(|_| WorkflowError::InvalidIntegerResponse {
            item: item.id.clone(),
            value: text.to_owned(),
        })
}

fn record(
    responses: &mut ResponseMap,
    item: &WorkflowResponseItem,
    answer: Option<Value>,
) -> ItemOutcome {
    match answer {
        Some(value) => {
            responses.insert(item.id.clone(), value);
            ItemOutcome::Resolved
        }
        None => ItemOutcome::Canceled,
    }
}
