use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{DeliveryId, GeoPoint, IssueId};

/// An operational problem reported from the field.
///
/// Issues are never edited; the only change an issue ever sees is its single resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub scope: IssueScope,
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub affected_deliveries: Vec<DeliveryId>,
    pub reported_at: DateTime<Utc>,
    pub reported_by: String,
    pub resolution: Option<IssueResolution>,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Whether the issue concerns the whole run or a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "deliveryId")]
pub enum IssueScope {
    Execution,
    Delivery(DeliveryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    VehicleBreakdown,
    TrafficDelay,
    FoodQuality,
    RecipientUnavailable,
    AccessProblem,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueResolution {
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: String,
    pub notes: String,
}
