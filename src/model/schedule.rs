use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::framework::TenantId;
use crate::model::{ExecutionId, ScheduleId, VehicleAssignment};

/// The planned distribution day, prior to execution.
///
/// Destinations, batch reference and planned portions are supplied by the production catalog
/// at creation time. Vehicle composition may change only while the schedule is
/// [`ScheduleStatus::Planned`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub tenant_id: TenantId,
    pub production_batch_ref: String,
    pub distribution_date: NaiveDate,
    pub destinations: Vec<Destination>,
    pub status: ScheduleStatus,
    pub vehicles: Vec<VehicleAssignment>,
    /// Set once, when an execution is spawned from this schedule.
    pub execution_id: Option<ExecutionId>,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Planned => "PLANNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// One recipient site on the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub destination_ref: String,
    pub portions_planned: u32,
    pub beneficiaries: Option<u32>,
    /// Used to compute the on-time flag of the resulting delivery.
    pub planned_arrival: Option<DateTime<Utc>>,
}

impl Destination {
    pub fn new(destination_ref: impl Into<String>, portions_planned: u32) -> Self {
        Self {
            destination_ref: destination_ref.into(),
            portions_planned,
            beneficiaries: None,
            planned_arrival: None,
        }
    }

    pub fn arriving_by(mut self, planned_arrival: DateTime<Utc>) -> Self {
        self.planned_arrival = Some(planned_arrival);
        self
    }

    pub fn serving(mut self, beneficiaries: u32) -> Self {
        self.beneficiaries = Some(beneficiaries);
        self
    }
}

/// Payload for creating a new schedule.
#[derive(Debug, Clone)]
pub struct ScheduleCreate {
    pub production_batch_ref: String,
    pub distribution_date: NaiveDate,
    pub destinations: Vec<Destination>,
}

/// Replanning payload, accepted only while the schedule is PLANNED.
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    pub distribution_date: Option<NaiveDate>,
    pub destinations: Option<Vec<Destination>>,
}
