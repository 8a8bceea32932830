//! Domain model for interactive workflows.
//!
//! A workflow is a sequence of rounds. Each round returns a
//! [`WorkflowResponse`] whose items must be resolved into a [`ResponseMap`]
//! before the next request can be sent.

mod error;
mod kind;
mod response;
mod response_map;

pub use error::{WorkflowError, WorkflowResult};
pub use kind::{
    BROWSER_URL_PROPERTY, EDITOR_CONTENT_PROPERTY, EDITOR_PATH_PROPERTY,
    TERMINAL_COMMAND_PROPERTY, WorkflowItemKind,
};
pub use response::{
    ResponseType, WorkflowPrompt, WorkflowRequestId, WorkflowResponse, WorkflowResponseItem,
};
pub use response_map::ResponseMap;
