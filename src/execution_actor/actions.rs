//! Custom actions for the Execution actor.

use chrono::{DateTime, Utc};

use crate::model::{DeliveryId, GeoPoint, IssueId, IssueScope, IssueSeverity, IssueType};

#[derive(Debug, Clone)]
pub enum ExecutionAction {
    /// PENDING → IN_PROGRESS; cascades the schedule to IN_PROGRESS.
    Start { actual_start_time: DateTime<Utc> },
    Complete(CompleteExecution),
    ReportIssue(NewIssue),
    ResolveIssue(ResolveIssue),
    /// Cancels every non-terminal delivery and the schedule.
    Cancel {
        reason: String,
        cancelled_at: DateTime<Utc>,
    },
}

/// Results from ExecutionActions - variants match 1:1 with ExecutionAction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionActionResult {
    Started,
    /// Persisted total of delivered portions.
    Completed { total_portions_delivered: u64 },
    IssueReported(IssueId),
    IssueResolved(IssueId),
    Cancelled { deliveries_cancelled: usize },
}

#[derive(Debug, Clone)]
pub struct CompleteExecution {
    pub actual_end_time: DateTime<Utc>,
    /// Field-reported total. Defaults to the sum over deliveries.
    pub total_portions_delivered: Option<u64>,
    pub total_beneficiaries_reached: Option<u32>,
    pub completion_notes: Option<String>,
}

impl CompleteExecution {
    pub fn at(actual_end_time: DateTime<Utc>) -> Self {
        Self {
            actual_end_time,
            total_portions_delivered: None,
            total_beneficiaries_reached: None,
            completion_notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub scope: IssueScope,
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub affected_deliveries: Vec<DeliveryId>,
    pub reported_at: DateTime<Utc>,
}

impl NewIssue {
    pub fn new(
        issue_type: IssueType,
        severity: IssueSeverity,
        description: impl Into<String>,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scope: IssueScope::Execution,
            issue_type,
            severity,
            description: description.into(),
            location: None,
            affected_deliveries: Vec::new(),
            reported_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolveIssue {
    pub issue_id: IssueId,
    pub resolved_at: DateTime<Utc>,
    pub notes: String,
}
