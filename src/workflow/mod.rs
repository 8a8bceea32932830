//! Interactive workflows.
//!
//! An RSP request may answer with a sequence of "more input required"
//! responses before it terminates. This module resolves each response's
//! items through the UI and resubmits the accumulated answers until the
//! server reports a terminal status.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::WorkflowResponse`], [`domain::WorkflowItemKind`]
//!   and the [`domain::ResponseMap`] accumulator
//! - **Services**: [`services::WorkflowStrategies`] and
//!   [`services::WorkflowEngine`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
