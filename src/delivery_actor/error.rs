//! Error types for the Delivery actor.

use thiserror::Error;

use crate::model::DeliveryStatus;

/// Errors that can occur while driving a delivery through its state machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    /// The delivery does not exist in the caller's tenant.
    #[error("Delivery not found: {0}")]
    NotFound(String),

    /// The transition table does not allow `current` → `requested`.
    #[error("Illegal delivery transition from {current} to {requested}")]
    InvalidTransition {
        current: DeliveryStatus,
        requested: DeliveryStatus,
    },

    /// A prior step is missing, e.g. arrive before start.
    #[error("Delivery precondition failed: {0}")]
    Precondition(String),

    /// The step was already recorded; the submission is a duplicate.
    #[error("Duplicate delivery action: {0}")]
    DuplicateAction(String),

    #[error("Delivery validation error: {0}")]
    Validation(String),

    /// An error occurred while communicating with the actor system.
    #[error("Delivery service unavailable: {0}")]
    Unavailable(String),
}
