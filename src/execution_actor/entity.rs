//! [`ActorEntity`] implementation for [`Execution`].
//!
//! The execution is the only aggregate whose hooks call other actors: it reads and cascades
//! its schedule and creates, reads and cancels its deliveries through the clients injected as
//! its context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::actions::*;
use super::ExecutionError;
use crate::clients::{ActorClient, DeliveryClient, ScheduleClient};
use crate::delivery_actor::{DeliveryError, StatusUpdate};
use crate::framework::{ActorEntity, Principal, TenantId};
use crate::model::{
    sum_delivered, DeliveryCreate, DeliveryStatus, Execution, ExecutionCreate, ExecutionId,
    ExecutionStatus, ScheduleStatus,
};
use crate::schedule_actor::ScheduleError;

/// Late-bound dependencies of the Execution actor.
pub type ExecutionContext = (ScheduleClient, DeliveryClient);

/// Schedule cascade result where a schedule already in `target` counts as done.
///
/// A cascade can land while the execution's own commit fails; the retried step then finds the
/// schedule already moved.
fn settled(
    result: Result<ScheduleStatus, ScheduleError>,
    target: ScheduleStatus,
) -> Result<(), ScheduleError> {
    match result {
        Ok(_) => Ok(()),
        Err(ScheduleError::InvalidTransition { current, .. }) if current == target => Ok(()),
        Err(e) => Err(e),
    }
}

impl Execution {
    /// Best-effort cancellation of deliveries created for an execution that was never stored.
    async fn abandon_deliveries(&self, principal: &Principal, deliveries: &DeliveryClient) {
        for id in &self.delivery_ids {
            let mut update = StatusUpdate::new(DeliveryStatus::Cancelled, Utc::now());
            update.notes = Some("execution could not be created".to_string());
            if let Err(e) = deliveries.update_status(principal, *id, update).await {
                warn!(delivery = %id, error = %e, "Failed to cancel orphaned delivery");
            }
        }
    }

    async fn start(
        &mut self,
        actual_start_time: DateTime<Utc>,
        principal: &Principal,
        (schedules, _): &ExecutionContext,
    ) -> Result<ExecutionActionResult, ExecutionError> {
        match self.status {
            ExecutionStatus::Pending => {}
            ExecutionStatus::InProgress => {
                return Err(ExecutionError::DuplicateAction(
                    "execution already started".to_string(),
                ))
            }
            current => {
                return Err(ExecutionError::InvalidTransition {
                    current,
                    requested: ExecutionStatus::InProgress,
                })
            }
        }

        settled(
            schedules.mark_in_progress(principal, self.schedule_id).await,
            ScheduleStatus::InProgress,
        )?;
        self.status = ExecutionStatus::InProgress;
        self.actual_start_time = Some(actual_start_time);
        Ok(ExecutionActionResult::Started)
    }

    /// Completion: the open-issue scan, the delivery scan and the status write all happen
    /// inside this one request, so no report or resolve can interleave.
    async fn complete(
        &mut self,
        params: CompleteExecution,
        principal: &Principal,
        (schedules, deliveries): &ExecutionContext,
    ) -> Result<ExecutionActionResult, ExecutionError> {
        match self.status {
            ExecutionStatus::InProgress => {}
            ExecutionStatus::Completed => {
                return Err(ExecutionError::DuplicateAction(
                    "execution already completed".to_string(),
                ))
            }
            ExecutionStatus::Cancelled => {
                return Err(ExecutionError::InvalidTransition {
                    current: ExecutionStatus::Cancelled,
                    requested: ExecutionStatus::Completed,
                })
            }
            ExecutionStatus::Pending => {
                return Err(ExecutionError::Precondition(
                    "execution not started".to_string(),
                ))
            }
        }
        if let Some(started) = self.actual_start_time {
            if params.actual_end_time < started {
                return Err(ExecutionError::Validation(format!(
                    "end time ({}) precedes start time ({started})",
                    params.actual_end_time
                )));
            }
        }

        let open_issues = self.open_issues().count();
        let mut snapshot = Vec::with_capacity(self.delivery_ids.len());
        for id in &self.delivery_ids {
            snapshot.push(deliveries.fetch(principal, *id).await?);
        }
        let pending_deliveries = snapshot.iter().filter(|d| !d.is_terminal()).count();

        let reason = match (snapshot.is_empty(), open_issues > 0, pending_deliveries > 0) {
            (true, _, _) => Some("execution has no deliveries"),
            (false, true, true) => Some("unresolved issues and deliveries still in flight"),
            (false, true, false) => Some("unresolved issues"),
            (false, false, true) => Some("deliveries still in flight"),
            (false, false, false) => None,
        };
        if let Some(reason) = reason {
            return Err(ExecutionError::InvariantViolation {
                reason: reason.to_string(),
                open_issues,
                pending_deliveries,
            });
        }

        let reconciled = sum_delivered(&snapshot);
        let total = match params.total_portions_delivered {
            Some(reported) if reported != reconciled => {
                warn!(
                    execution = %self.id,
                    reported,
                    reconciled,
                    "Reported portions differ from delivery records"
                );
                reported
            }
            Some(reported) => reported,
            None => reconciled,
        };

        settled(
            schedules.mark_completed(principal, self.schedule_id).await,
            ScheduleStatus::Completed,
        )?;
        self.status = ExecutionStatus::Completed;
        self.actual_end_time = Some(params.actual_end_time);
        self.total_portions_delivered = Some(total);
        self.total_beneficiaries_reached = params.total_beneficiaries_reached;
        self.completion_notes = params.completion_notes;
        info!(execution = %self.id, total, planned = self.total_portions_planned, "Execution completed");
        Ok(ExecutionActionResult::Completed {
            total_portions_delivered: total,
        })
    }

    async fn cancel(
        &mut self,
        reason: String,
        cancelled_at: DateTime<Utc>,
        principal: &Principal,
        (schedules, deliveries): &ExecutionContext,
    ) -> Result<ExecutionActionResult, ExecutionError> {
        match self.status {
            ExecutionStatus::Cancelled => {
                return Err(ExecutionError::DuplicateAction(
                    "execution already cancelled".to_string(),
                ))
            }
            ExecutionStatus::Completed => {
                return Err(ExecutionError::InvalidTransition {
                    current: ExecutionStatus::Completed,
                    requested: ExecutionStatus::Cancelled,
                })
            }
            ExecutionStatus::Pending | ExecutionStatus::InProgress => {}
        }
        if reason.trim().is_empty() {
            return Err(ExecutionError::Validation(
                "cancellation reason is required".to_string(),
            ));
        }

        let mut deliveries_cancelled = 0;
        for id in &self.delivery_ids {
            let mut update = StatusUpdate::new(DeliveryStatus::Cancelled, cancelled_at);
            update.notes = Some(reason.clone());
            match deliveries.update_status(principal, *id, update).await {
                Ok(_) => deliveries_cancelled += 1,
                // Already finished in the field; leave it as it is.
                Err(DeliveryError::InvalidTransition { current, .. }) if current.is_terminal() => {}
                Err(e) => return Err(e.into()),
            }
        }

        settled(
            schedules.cancel(principal, self.schedule_id).await,
            ScheduleStatus::Cancelled,
        )?;
        self.status = ExecutionStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        Ok(ExecutionActionResult::Cancelled {
            deliveries_cancelled,
        })
    }
}

#[async_trait]
impl ActorEntity for Execution {
    const KIND: &'static str = "Execution";
    type Id = ExecutionId;
    type Create = ExecutionCreate;
    type Update = std::convert::Infallible;
    type Action = ExecutionAction;
    type ActionResult = ExecutionActionResult;
    type Context = ExecutionContext;
    type Error = ExecutionError;

    fn from_create_params(
        id: ExecutionId,
        principal: &Principal,
        params: ExecutionCreate,
    ) -> Result<Self, ExecutionError> {
        Ok(Self {
            id,
            tenant_id: principal.tenant_id.clone(),
            schedule_id: params.schedule_id,
            status: ExecutionStatus::Pending,
            delivery_ids: Vec::new(),
            issues: Vec::new(),
            actual_start_time: None,
            actual_end_time: None,
            total_portions_planned: 0,
            total_portions_delivered: None,
            total_beneficiaries_reached: None,
            completion_notes: None,
            cancellation_reason: None,
            created_by: principal.actor.clone(),
        })
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn audit_state(&self) -> Value {
        json!({
            "status": self.status,
            "deliveries": self.delivery_ids.len(),
            "issues": self.issues.len(),
            "openIssues": self.open_issues().count(),
            "totalPortionsDelivered": self.total_portions_delivered,
        })
    }

    fn action_name(action: &ExecutionAction) -> &'static str {
        match action {
            ExecutionAction::Start { .. } => "execution.start",
            ExecutionAction::Complete(_) => "execution.complete",
            ExecutionAction::ReportIssue(_) => "issue.report",
            ExecutionAction::ResolveIssue(_) => "issue.resolve",
            ExecutionAction::Cancel { .. } => "execution.cancel",
        }
    }

    fn audit_metadata(&self, action: &ExecutionAction) -> Value {
        match action {
            ExecutionAction::ReportIssue(issue) => json!({
                "type": issue.issue_type,
                "severity": issue.severity,
                "scope": issue.scope,
            }),
            ExecutionAction::ResolveIssue(resolve) => json!({ "issueId": resolve.issue_id }),
            ExecutionAction::Cancel { reason, .. } => json!({ "reason": reason }),
            _ => Value::Null,
        }
    }

    /// Spawns one ASSIGNED delivery per destination and links the execution to its schedule.
    ///
    /// Deliveries are created before the schedule link. Deliveries created before a failure
    /// are cancelled; a create that fails after this hook is undone by `on_create_aborted`.
    async fn on_create(
        &mut self,
        principal: &Principal,
        (schedules, deliveries): &ExecutionContext,
    ) -> Result<(), ExecutionError> {
        let schedule = schedules.fetch(principal, self.schedule_id).await?;
        if schedule.status != ScheduleStatus::Planned {
            return Err(ExecutionError::Precondition(format!(
                "schedule is {}, expected PLANNED",
                schedule.status
            )));
        }
        if let Some(existing) = schedule.execution_id {
            return Err(ExecutionError::DuplicateAction(format!(
                "schedule already has execution {existing}"
            )));
        }
        if schedule.destinations.is_empty() {
            return Err(ExecutionError::Precondition(
                "schedule has no destinations".to_string(),
            ));
        }

        for destination in &schedule.destinations {
            let params = DeliveryCreate {
                execution_id: self.id,
                destination_ref: destination.destination_ref.clone(),
                portions_planned: destination.portions_planned,
                planned_arrival: destination.planned_arrival,
            };
            match deliveries.create_delivery(principal, params).await {
                Ok(id) => self.delivery_ids.push(id),
                Err(e) => {
                    self.abandon_deliveries(principal, deliveries).await;
                    return Err(e.into());
                }
            }
        }
        if let Err(e) = schedules
            .attach_execution(principal, self.schedule_id, self.id)
            .await
        {
            self.abandon_deliveries(principal, deliveries).await;
            return Err(e.into());
        }

        self.total_portions_planned = schedule
            .destinations
            .iter()
            .map(|destination| u64::from(destination.portions_planned))
            .sum();
        info!(
            execution = %self.id,
            deliveries = self.delivery_ids.len(),
            planned = self.total_portions_planned,
            "Deliveries assigned"
        );
        Ok(())
    }

    async fn on_create_aborted(
        &self,
        principal: &Principal,
        (schedules, deliveries): &ExecutionContext,
    ) {
        if let Err(e) = schedules
            .detach_execution(principal, self.schedule_id, self.id)
            .await
        {
            warn!(execution = %self.id, schedule = %self.schedule_id, error = %e, "Failed to unlink schedule");
        }
        self.abandon_deliveries(principal, deliveries).await;
    }

    async fn on_update(
        &mut self,
        update: std::convert::Infallible,
        _principal: &Principal,
        _ctx: &ExecutionContext,
    ) -> Result<(), ExecutionError> {
        match update {}
    }

    async fn handle_action(
        &mut self,
        action: ExecutionAction,
        principal: &Principal,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionActionResult, ExecutionError> {
        match action {
            ExecutionAction::Start { actual_start_time } => {
                self.start(actual_start_time, principal, ctx).await
            }
            ExecutionAction::Complete(params) => self.complete(params, principal, ctx).await,
            ExecutionAction::ReportIssue(issue) => self
                .report_issue(issue, &principal.actor)
                .map(ExecutionActionResult::IssueReported),
            ExecutionAction::ResolveIssue(resolve) => self
                .resolve_issue(resolve, &principal.actor)
                .map(ExecutionActionResult::IssueResolved),
            ExecutionAction::Cancel {
                reason,
                cancelled_at,
            } => self.cancel(reason, cancelled_at, principal, ctx).await,
        }
    }
}
