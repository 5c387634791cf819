//! # Execution Client
//!
//! Coordinator-facing API: create a run from a schedule, start it, file and resolve issues,
//! complete or cancel it, and read it back with derived metrics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::clients::actor_client::ActorClient;
use crate::clients::DeliveryClient;
use crate::execution_actor::{
    CompleteExecution, ExecutionAction, ExecutionActionResult, ExecutionError, NewIssue,
    ResolveIssue,
};
use crate::framework::{FrameworkError, Principal, ResourceClient};
use crate::model::{
    Execution, ExecutionCreate, ExecutionId, ExecutionMetrics, ExecutionView, IssueId, ScheduleId,
};

/// Client for interacting with the Execution actor.
///
/// Holds a [`DeliveryClient`] to assemble [`ExecutionView`]s; all mutations go through the
/// Execution actor itself.
#[derive(Clone)]
pub struct ExecutionClient {
    inner: ResourceClient<Execution>,
    deliveries: DeliveryClient,
}

#[async_trait]
impl ActorClient<Execution> for ExecutionClient {
    type Error = ExecutionError;

    fn inner(&self) -> &ResourceClient<Execution> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> ExecutionError {
        match e.into_entity_error::<ExecutionError>() {
            Ok(err) => err,
            Err(FrameworkError::NotFound(id)) => ExecutionError::NotFound(id),
            Err(other) => ExecutionError::Unavailable(other.to_string()),
        }
    }
}

fn unexpected(result: ExecutionActionResult) -> ExecutionError {
    ExecutionError::Unavailable(format!("unexpected action result: {result:?}"))
}

impl ExecutionClient {
    pub fn new(inner: ResourceClient<Execution>, deliveries: DeliveryClient) -> Self {
        Self { inner, deliveries }
    }

    /// Spawns an execution (and its deliveries) from a PLANNED schedule.
    #[instrument(skip(self, principal))]
    pub async fn create_execution(
        &self,
        principal: &Principal,
        schedule_id: ScheduleId,
    ) -> Result<ExecutionId, ExecutionError> {
        debug!("Sending request");
        self.inner
            .create(principal, ExecutionCreate { schedule_id })
            .await
            .map_err(Self::map_error)
    }

    async fn act(
        &self,
        principal: &Principal,
        id: ExecutionId,
        action: ExecutionAction,
    ) -> Result<ExecutionActionResult, ExecutionError> {
        self.inner
            .perform_action(principal, id, action)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self, principal))]
    pub async fn start(
        &self,
        principal: &Principal,
        id: ExecutionId,
        actual_start_time: DateTime<Utc>,
    ) -> Result<(), ExecutionError> {
        match self
            .act(principal, id, ExecutionAction::Start { actual_start_time })
            .await?
        {
            ExecutionActionResult::Started => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Completes the run; returns the persisted total of delivered portions.
    #[instrument(skip(self, principal, params))]
    pub async fn complete(
        &self,
        principal: &Principal,
        id: ExecutionId,
        params: CompleteExecution,
    ) -> Result<u64, ExecutionError> {
        match self
            .act(principal, id, ExecutionAction::Complete(params))
            .await?
        {
            ExecutionActionResult::Completed {
                total_portions_delivered,
            } => Ok(total_portions_delivered),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal, issue), fields(severity = ?issue.severity))]
    pub async fn report_issue(
        &self,
        principal: &Principal,
        id: ExecutionId,
        issue: NewIssue,
    ) -> Result<IssueId, ExecutionError> {
        match self
            .act(principal, id, ExecutionAction::ReportIssue(issue))
            .await?
        {
            ExecutionActionResult::IssueReported(issue_id) => Ok(issue_id),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal, resolve), fields(issue = %resolve.issue_id))]
    pub async fn resolve_issue(
        &self,
        principal: &Principal,
        id: ExecutionId,
        resolve: ResolveIssue,
    ) -> Result<(), ExecutionError> {
        match self
            .act(principal, id, ExecutionAction::ResolveIssue(resolve))
            .await?
        {
            ExecutionActionResult::IssueResolved(_) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Cancels the run; returns how many deliveries were still open and got cancelled.
    #[instrument(skip(self, principal, reason))]
    pub async fn cancel(
        &self,
        principal: &Principal,
        id: ExecutionId,
        reason: impl Into<String>,
        cancelled_at: DateTime<Utc>,
    ) -> Result<usize, ExecutionError> {
        let action = ExecutionAction::Cancel {
            reason: reason.into(),
            cancelled_at,
        };
        match self.act(principal, id, action).await? {
            ExecutionActionResult::Cancelled {
                deliveries_cancelled,
            } => Ok(deliveries_cancelled),
            other => Err(unexpected(other)),
        }
    }

    /// The execution, its deliveries and metrics derived at read time.
    pub async fn view(
        &self,
        principal: &Principal,
        id: ExecutionId,
    ) -> Result<ExecutionView, ExecutionError> {
        let execution = self.fetch(principal, id).await?;
        let mut deliveries = Vec::with_capacity(execution.delivery_ids.len());
        for delivery_id in &execution.delivery_ids {
            deliveries.push(self.deliveries.fetch(principal, *delivery_id).await?);
        }
        let metrics = ExecutionMetrics::compute(&execution, &deliveries, self.deliveries.rules());
        Ok(ExecutionView {
            execution,
            deliveries,
            metrics,
        })
    }
}
