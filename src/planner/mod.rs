//! Planning and execution of tree reconciliation.
//!
//! This module compares desired and live trees, turns the difference into
//! an ordered action sequence, and replays that sequence through pluggable
//! handlers.

mod diff;
mod executor;
mod handler;
mod plan;

pub use diff::DiffEngine;
pub use executor::{ActionExecutor, ExecutionMode, ExecutionReport};
pub use handler::{
    report_line, ActionHandler, Confirmation, InteractiveHandler, ReportingHandler, SilentHandler,
};
pub use plan::{Action, ActionKind, ReconcilePlan};
