//! Error types for the Schedule actor.

use thiserror::Error;

use crate::model::ScheduleStatus;

/// Errors that can occur during schedule and vehicle-assignment operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScheduleError {
    /// The schedule (or one of its assignments) does not exist in the caller's tenant.
    #[error("Schedule not found: {0}")]
    NotFound(String),

    #[error("Illegal schedule transition from {current} to {requested}")]
    InvalidTransition {
        current: ScheduleStatus,
        requested: ScheduleStatus,
    },

    /// The schedule is not in a state that allows the operation.
    #[error("Schedule precondition failed: {0}")]
    Precondition(String),

    #[error("Duplicate schedule action: {0}")]
    DuplicateAction(String),

    #[error("Schedule validation error: {0}")]
    Validation(String),

    /// An error occurred while communicating with the actor system.
    #[error("Schedule service unavailable: {0}")]
    Unavailable(String),
}
