//! Error types for the Execution actor.
//!
//! The execution orchestrates the Schedule and Delivery actors, so their errors are wrapped
//! with `#[from]` and propagate with `?`.

use thiserror::Error;

use crate::delivery_actor::DeliveryError;
use crate::model::ExecutionStatus;
use crate::schedule_actor::ScheduleError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    /// The execution (or one of its issues) does not exist in the caller's tenant.
    #[error("Execution not found: {0}")]
    NotFound(String),

    #[error("Illegal execution transition from {current} to {requested}")]
    InvalidTransition {
        current: ExecutionStatus,
        requested: ExecutionStatus,
    },

    #[error("Execution precondition failed: {0}")]
    Precondition(String),

    #[error("Duplicate execution action: {0}")]
    DuplicateAction(String),

    /// Completion refused because the run is not finished.
    #[error(
        "Execution cannot complete: {reason} ({open_issues} open issues, {pending_deliveries} pending deliveries)"
    )]
    InvariantViolation {
        reason: String,
        open_issues: usize,
        pending_deliveries: usize,
    },

    #[error("Execution validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// An error occurred while communicating with the actor system.
    #[error("Execution service unavailable: {0}")]
    Unavailable(String),
}
