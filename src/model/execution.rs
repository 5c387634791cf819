use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::framework::TenantId;
use crate::model::{DeliveryId, ExecutionId, Issue, ScheduleId};

/// One operational run of a schedule.
///
/// Owns the ids of its deliveries (the deliveries themselves live in the Delivery actor) and
/// its issues, which are stored inline so that the open-issue scan and the completion write
/// happen within one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub tenant_id: TenantId,
    pub schedule_id: ScheduleId,
    pub status: ExecutionStatus,
    pub delivery_ids: Vec<DeliveryId>,
    pub issues: Vec<Issue>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub total_portions_planned: u64,
    /// Persisted on completion.
    pub total_portions_delivered: Option<u64>,
    pub total_beneficiaries_reached: Option<u32>,
    pub completion_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_by: String,
}

impl Execution {
    pub fn open_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_open())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Created, deliveries spawned, run not yet started.
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Payload for creating a new execution.
#[derive(Debug, Clone)]
pub struct ExecutionCreate {
    pub schedule_id: ScheduleId,
}
