//! Custom actions for the Delivery actor.
//!
//! Every payload carries the device-side timestamp of the event; the engine never substitutes
//! its own clock for field data.

use chrono::{DateTime, Utc};

use crate::model::{DeliveryStatus, GeoPoint, PhotoKind};

#[derive(Debug, Clone)]
pub enum DeliveryAction {
    Start(StartDelivery),
    Arrive(ArriveDelivery),
    Complete(CompleteDelivery),
    UpdateStatus(StatusUpdate),
    RecordWaypoint(Waypoint),
    AttachPhoto(NewPhoto),
}

/// Results from DeliveryActions - variants match 1:1 with DeliveryAction.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryActionResult {
    Started(DeliveryStatus),
    Arrived(DateTime<Utc>),
    /// DELIVERED or FAILED.
    Completed(DeliveryStatus),
    StatusUpdated(DeliveryStatus),
    /// Number of tracking points after the append.
    WaypointRecorded(usize),
    /// Number of photos after the append.
    PhotoAttached(usize),
}

#[derive(Debug, Clone)]
pub struct StartDelivery {
    pub departure_time: DateTime<Utc>,
    pub departure_location: GeoPoint,
    pub vehicle_info: Option<String>,
    pub driver_name: Option<String>,
    pub helper_names: Vec<String>,
    pub notes: Option<String>,
}

impl StartDelivery {
    pub fn new(departure_time: DateTime<Utc>, departure_location: GeoPoint) -> Self {
        Self {
            departure_time,
            departure_location,
            vehicle_info: None,
            driver_name: None,
            helper_names: Vec::new(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArriveDelivery {
    pub arrival_time: DateTime<Utc>,
    pub arrival_location: GeoPoint,
    pub notes: Option<String>,
}

impl ArriveDelivery {
    pub fn new(arrival_time: DateTime<Utc>, arrival_location: GeoPoint) -> Self {
        Self {
            arrival_time,
            arrival_location,
            notes: None,
        }
    }
}

/// Recipient confirmation and handover details.
#[derive(Debug, Clone)]
pub struct CompleteDelivery {
    pub completed_at: DateTime<Utc>,
    pub portions_delivered: u32,
    pub recipient_name: String,
    pub recipient_title: Option<String>,
    /// Media-store reference of the signature image.
    pub recipient_signature: Option<String>,
    pub food_quality_checked: bool,
    pub food_quality_notes: Option<String>,
    pub food_temperature: Option<f64>,
    pub notes: Option<String>,
    /// Attached as a DELIVERY_PROOF photo.
    pub photo_ref: Option<String>,
}

impl CompleteDelivery {
    pub fn new(
        completed_at: DateTime<Utc>,
        portions_delivered: u32,
        recipient_name: impl Into<String>,
    ) -> Self {
        Self {
            completed_at,
            portions_delivered,
            recipient_name: recipient_name.into(),
            recipient_title: None,
            recipient_signature: None,
            food_quality_checked: false,
            food_quality_notes: None,
            food_temperature: None,
            notes: None,
            photo_ref: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: DeliveryStatus,
    pub occurred_at: DateTime<Utc>,
    pub current_location: Option<GeoPoint>,
    pub notes: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: DeliveryStatus, occurred_at: DateTime<Utc>) -> Self {
        Self {
            status,
            occurred_at,
            current_location: None,
            notes: None,
        }
    }
}

/// A free GPS sample between departure and arrival markers.
#[derive(Debug, Clone)]
pub struct Waypoint {
    pub location: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub kind: PhotoKind,
    pub media_ref: String,
    pub caption: Option<String>,
    pub taken_at: DateTime<Utc>,
}
