//! Single presentation point for command failures.

use super::LifecycleController;
use crate::rsp::{
    ports::{MessageLevel, UserInterface},
    services::{LifecycleError, LifecycleResult},
};
use mockable::Clock;
use tracing::warn;

/// Formats a failure as `"{context}: {lower-cased error}"`.
#[must_use]
pub fn failure_message(context: &str, error: &LifecycleError) -> String {
    format!("{context}: {}", error.to_string().to_lowercase())
}

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Shows a failed command result as an error toast.
    ///
    /// Successful results, including user cancellations, are passed through
    /// without any message.
    pub fn report<T>(&self, context: &str, result: LifecycleResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                let message = failure_message(context, &err);
                warn!(error = %err, context, "command failed");
                self.ui.show_message(MessageLevel::Error, &message);
                None
            }
        }
    }
}
