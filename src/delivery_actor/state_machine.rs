//! # Delivery State Machine
//!
//! The single definition of delivery transition legality, shared by `start`, `arrive`,
//! `complete` and `update_status`.
//!
//! ```text
//!  ASSIGNED ──start──▶ DEPARTED ──complete──▶ DELIVERED | FAILED
//!     │                   │ (arrive: milestone only)
//!     └──────────┬────────┘
//!                ▼
//!       CANCELLED | FAILED   (update_status)
//! ```
//!
//! Arrival is not a state. It is the `arrived_at` milestone, set while the delivery stays
//! DEPARTED. Milestones are write-once and double as the guards against duplicate submissions.

use super::DeliveryError;
use crate::model::{DeliveryStatus, Milestones};

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered | DeliveryStatus::Failed | DeliveryStatus::Cancelled
        )
    }

    /// The explicit transition table. Terminal states allow nothing.
    pub fn allowed_targets(self) -> &'static [DeliveryStatus] {
        use DeliveryStatus::*;
        match self {
            Assigned => &[Departed, Cancelled, Failed],
            Departed => &[Delivered, Failed, Cancelled],
            Delivered | Failed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        self.allowed_targets().contains(&next)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEvent {
    Start,
    Arrive,
    /// `fulfilled` selects DELIVERED over FAILED.
    Complete { fulfilled: bool },
    /// Generic status change requested through `update_status`.
    Transition(DeliveryStatus),
}

fn table(current: DeliveryStatus, requested: DeliveryStatus) -> Result<DeliveryStatus, DeliveryError> {
    if current.can_transition_to(requested) {
        Ok(requested)
    } else {
        Err(DeliveryError::InvalidTransition { current, requested })
    }
}

fn require_departed(status: DeliveryStatus, milestones: &Milestones) -> Result<(), DeliveryError> {
    if milestones.departed_at.is_none() {
        return Err(DeliveryError::Precondition("departure not recorded".to_string()));
    }
    if status != DeliveryStatus::Departed {
        return Err(DeliveryError::InvalidTransition {
            current: status,
            requested: DeliveryStatus::Departed,
        });
    }
    Ok(())
}

/// Returns the status the delivery moves to for `event`, or why the event is refused.
///
/// Guards run in a fixed order: duplicate, missing prior step, table.
pub fn next_status(
    status: DeliveryStatus,
    milestones: &Milestones,
    event: DeliveryEvent,
) -> Result<DeliveryStatus, DeliveryError> {
    match event {
        DeliveryEvent::Start => {
            if milestones.departed_at.is_some() {
                return Err(DeliveryError::DuplicateAction(
                    "departure already recorded".to_string(),
                ));
            }
            table(status, DeliveryStatus::Departed)
        }
        DeliveryEvent::Arrive => {
            if milestones.arrived_at.is_some() {
                return Err(DeliveryError::DuplicateAction(
                    "arrival already recorded".to_string(),
                ));
            }
            require_departed(status, milestones)?;
            Ok(status)
        }
        DeliveryEvent::Complete { fulfilled } => {
            if milestones.completed_at.is_some() {
                return Err(DeliveryError::DuplicateAction(
                    "delivery already completed".to_string(),
                ));
            }
            require_departed(status, milestones)?;
            if milestones.arrived_at.is_none() {
                return Err(DeliveryError::Precondition("arrival not recorded".to_string()));
            }
            let target = if fulfilled {
                DeliveryStatus::Delivered
            } else {
                DeliveryStatus::Failed
            };
            table(status, target)
        }
        DeliveryEvent::Transition(requested) => table(status, requested),
    }
}
