//! One destination's share of an execution.
//!
//! # Actor Framework
//! [`Delivery`] implements the [`ActorEntity`](crate::framework::ActorEntity) trait; see
//! [`crate::delivery_actor`] for the state machine that drives it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::framework::TenantId;
use crate::model::{DeliveryId, ExecutionId, GeoPoint, TrackingLog, TrackingPoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub tenant_id: TenantId,
    pub execution_id: ExecutionId,
    pub destination_ref: String,
    pub status: DeliveryStatus,
    pub milestones: Milestones,
    pub portions_planned: u32,
    pub portions_delivered: Option<u32>,
    pub planned_arrival: Option<DateTime<Utc>>,
    pub departure_location: Option<GeoPoint>,
    pub arrival_location: Option<GeoPoint>,
    pub vehicle_info: Option<String>,
    pub driver_name: Option<String>,
    pub helper_names: Vec<String>,
    pub recipient: Option<RecipientConfirmation>,
    pub food_quality_checked: bool,
    pub food_quality_notes: Option<String>,
    /// Degrees Celsius at handover.
    pub food_temperature: Option<f64>,
    /// Field notes, oldest first.
    pub notes: Vec<String>,
    pub tracking: TrackingLog,
    pub photos: Vec<Photo>,
}

impl Delivery {
    /// Latest known position, derived from the tracking log.
    pub fn current_location(&self) -> Option<&TrackingPoint> {
        self.tracking.latest()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Primary delivery status. Arrival is not a status; see [`Milestones::arrived_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Assigned,
    Departed,
    Delivered,
    Failed,
    Cancelled,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Assigned => "ASSIGNED",
            Self::Departed => "DEPARTED",
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Timestamps that are set exactly once and act as the per-delivery idempotency guards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    pub departed_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientConfirmation {
    pub name: String,
    pub title: Option<String>,
    /// Opaque media-store reference of the signature image.
    pub signature_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoKind {
    DeliveryProof,
    FoodQuality,
    Other,
}

/// Reference to an image held by the media store. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub kind: PhotoKind,
    pub media_ref: String,
    pub caption: Option<String>,
    pub taken_at: DateTime<Utc>,
}

/// Payload for creating a new delivery. Issued by the Execution actor, one per destination.
#[derive(Debug, Clone)]
pub struct DeliveryCreate {
    pub execution_id: ExecutionId,
    pub destination_ref: String,
    pub portions_planned: u32,
    pub planned_arrival: Option<DateTime<Utc>>,
}
