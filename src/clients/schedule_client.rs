//! # Schedule Client
//!
//! High-level API for the Schedule actor: planning, vehicle assignment and the status
//! cascade driven by executions.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, Principal, ResourceClient};
use crate::model::{
    AssignmentId, ExecutionId, NewVehicleAssignment, Schedule, ScheduleCreate, ScheduleId,
    ScheduleStatus, ScheduleUpdate, VehicleAssignment,
};
use crate::schedule_actor::{ScheduleAction, ScheduleActionResult, ScheduleError};

/// Client for interacting with the Schedule actor.
#[derive(Clone)]
pub struct ScheduleClient {
    inner: ResourceClient<Schedule>,
}

#[async_trait]
impl ActorClient<Schedule> for ScheduleClient {
    type Error = ScheduleError;

    fn inner(&self) -> &ResourceClient<Schedule> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> ScheduleError {
        match e.into_entity_error::<ScheduleError>() {
            Ok(err) => err,
            Err(FrameworkError::NotFound(id)) => ScheduleError::NotFound(id),
            Err(other) => ScheduleError::Unavailable(other.to_string()),
        }
    }
}

fn unexpected(result: ScheduleActionResult) -> ScheduleError {
    ScheduleError::Unavailable(format!("unexpected action result: {result:?}"))
}

impl ScheduleClient {
    pub fn new(inner: ResourceClient<Schedule>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, principal, params), fields(batch = %params.production_batch_ref))]
    pub async fn create_schedule(
        &self,
        principal: &Principal,
        params: ScheduleCreate,
    ) -> Result<ScheduleId, ScheduleError> {
        debug!(destinations = params.destinations.len(), "Sending request");
        self.inner
            .create(principal, params)
            .await
            .map_err(Self::map_error)
    }

    /// Replaces destinations and/or date while the schedule is still PLANNED.
    #[instrument(skip(self, principal, update))]
    pub async fn replan(
        &self,
        principal: &Principal,
        id: ScheduleId,
        update: ScheduleUpdate,
    ) -> Result<Schedule, ScheduleError> {
        self.inner
            .update(principal, id, update)
            .await
            .map_err(Self::map_error)
    }

    async fn act(
        &self,
        principal: &Principal,
        id: ScheduleId,
        action: ScheduleAction,
    ) -> Result<ScheduleActionResult, ScheduleError> {
        self.inner
            .perform_action(principal, id, action)
            .await
            .map_err(Self::map_error)
    }

    async fn change_status(
        &self,
        principal: &Principal,
        id: ScheduleId,
        action: ScheduleAction,
    ) -> Result<ScheduleStatus, ScheduleError> {
        match self.act(principal, id, action).await? {
            ScheduleActionResult::StatusChanged(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal))]
    pub async fn attach_execution(
        &self,
        principal: &Principal,
        id: ScheduleId,
        execution_id: ExecutionId,
    ) -> Result<(), ScheduleError> {
        match self
            .act(principal, id, ScheduleAction::AttachExecution(execution_id))
            .await?
        {
            ScheduleActionResult::ExecutionAttached => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Undoes [`ScheduleClient::attach_execution`] for an execution that was never committed.
    #[instrument(skip(self, principal))]
    pub async fn detach_execution(
        &self,
        principal: &Principal,
        id: ScheduleId,
        execution_id: ExecutionId,
    ) -> Result<(), ScheduleError> {
        match self
            .act(principal, id, ScheduleAction::DetachExecution(execution_id))
            .await?
        {
            ScheduleActionResult::ExecutionDetached => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal))]
    pub async fn mark_in_progress(
        &self,
        principal: &Principal,
        id: ScheduleId,
    ) -> Result<ScheduleStatus, ScheduleError> {
        self.change_status(principal, id, ScheduleAction::MarkInProgress)
            .await
    }

    #[instrument(skip(self, principal))]
    pub async fn mark_completed(
        &self,
        principal: &Principal,
        id: ScheduleId,
    ) -> Result<ScheduleStatus, ScheduleError> {
        self.change_status(principal, id, ScheduleAction::MarkCompleted)
            .await
    }

    #[instrument(skip(self, principal))]
    pub async fn cancel(
        &self,
        principal: &Principal,
        id: ScheduleId,
    ) -> Result<ScheduleStatus, ScheduleError> {
        self.change_status(principal, id, ScheduleAction::Cancel).await
    }

    #[instrument(skip(self, principal, vehicle), fields(plate = %vehicle.plate_number))]
    pub async fn add_vehicle(
        &self,
        principal: &Principal,
        id: ScheduleId,
        vehicle: NewVehicleAssignment,
    ) -> Result<AssignmentId, ScheduleError> {
        match self
            .act(principal, id, ScheduleAction::AddVehicle(vehicle))
            .await?
        {
            ScheduleActionResult::VehicleAdded(assignment_id) => Ok(assignment_id),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal))]
    pub async fn remove_vehicle(
        &self,
        principal: &Principal,
        id: ScheduleId,
        assignment_id: AssignmentId,
    ) -> Result<VehicleAssignment, ScheduleError> {
        match self
            .act(principal, id, ScheduleAction::RemoveVehicle(assignment_id))
            .await?
        {
            ScheduleActionResult::VehicleRemoved(assignment) => Ok(assignment),
            other => Err(unexpected(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::TenantId;

    fn principal() -> Principal {
        Principal::new("planner", TenantId::new("kitchen-north"))
    }

    #[tokio::test]
    async fn test_entity_errors_come_back_typed() {
        let mut mock = MockClient::<Schedule>::new();
        let id = ScheduleId::new();
        mock.expect_action(id)
            .return_err(FrameworkError::EntityError(Box::new(
                ScheduleError::Precondition("cannot remove vehicles from a IN_PROGRESS schedule".to_string()),
            )));

        let client = ScheduleClient::new(mock.client());
        let err = client
            .remove_vehicle(&principal(), id, AssignmentId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Precondition(_)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_plumbing_errors_map_to_unavailable_or_not_found() {
        let mut mock = MockClient::<Schedule>::new();
        let id = ScheduleId::new();
        mock.expect_get(id).return_ok(None);
        mock.expect_action(id).return_err(FrameworkError::ActorClosed);

        let client = ScheduleClient::new(mock.client());
        assert!(matches!(
            client.fetch(&principal(), id).await,
            Err(ScheduleError::NotFound(_))
        ));
        assert!(matches!(
            client.mark_in_progress(&principal(), id).await,
            Err(ScheduleError::Unavailable(_))
        ));
        mock.verify();
    }
}
