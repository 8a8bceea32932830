//! Workflow services: the item strategy dispatcher and the round-trip engine.

mod engine;
mod strategy;

pub use engine::{
    DEFAULT_ROUND_LIMIT, WorkflowEngine, WorkflowOutcome, WorkflowRound, WorkflowSubmitter,
};
pub use strategy::{ItemOutcome, WorkflowStrategies};
