use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AssignmentId, ScheduleId};

/// Binds a vehicle, its driver and helpers to a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub id: AssignmentId,
    pub schedule_id: ScheduleId,
    pub vehicle_ref: String,
    pub plate_number: String,
    pub driver_ref: String,
    pub helpers: Vec<String>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVehicleAssignment {
    pub vehicle_ref: String,
    pub plate_number: String,
    pub driver_ref: String,
    pub helpers: Vec<String>,
    pub assigned_at: DateTime<Utc>,
}
