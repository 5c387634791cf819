//! [`ActorEntity`] implementation for [`Schedule`].
//!
//! A schedule is planned with its destinations and vehicles, then driven through
//! IN_PROGRESS and COMPLETED by the execution spawned from it.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;

use super::actions::{ScheduleAction, ScheduleActionResult};
use super::ScheduleError;
use crate::framework::{ActorEntity, Principal, TenantId};
use crate::model::{Destination, Schedule, ScheduleCreate, ScheduleId, ScheduleStatus, ScheduleUpdate};

impl ScheduleStatus {
    /// PLANNED→{IN_PROGRESS, CANCELLED}; IN_PROGRESS→{COMPLETED, CANCELLED}.
    pub fn can_transition_to(self, next: ScheduleStatus) -> bool {
        use ScheduleStatus::*;
        matches!(
            (self, next),
            (Planned, InProgress) | (Planned, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }
}

impl Schedule {
    fn transition(&mut self, next: ScheduleStatus) -> Result<ScheduleActionResult, ScheduleError> {
        if !self.status.can_transition_to(next) {
            return Err(ScheduleError::InvalidTransition {
                current: self.status,
                requested: next,
            });
        }
        self.status = next;
        Ok(ScheduleActionResult::StatusChanged(next))
    }
}

fn validate_destinations(destinations: &[Destination]) -> Result<(), ScheduleError> {
    let mut seen = HashSet::new();
    for destination in destinations {
        if destination.destination_ref.trim().is_empty() {
            return Err(ScheduleError::Validation("destination_ref is required".to_string()));
        }
        if !seen.insert(destination.destination_ref.as_str()) {
            return Err(ScheduleError::Validation(format!(
                "destination {} listed twice",
                destination.destination_ref
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ActorEntity for Schedule {
    const KIND: &'static str = "Schedule";
    type Id = ScheduleId;
    type Create = ScheduleCreate;
    type Update = ScheduleUpdate;
    type Action = ScheduleAction;
    type ActionResult = ScheduleActionResult;
    type Context = ();
    type Error = ScheduleError;

    fn from_create_params(
        id: ScheduleId,
        principal: &Principal,
        params: ScheduleCreate,
    ) -> Result<Self, ScheduleError> {
        if params.production_batch_ref.trim().is_empty() {
            return Err(ScheduleError::Validation(
                "production_batch_ref is required".to_string(),
            ));
        }
        validate_destinations(&params.destinations)?;

        Ok(Self {
            id,
            tenant_id: principal.tenant_id.clone(),
            production_batch_ref: params.production_batch_ref,
            distribution_date: params.distribution_date,
            destinations: params.destinations,
            status: ScheduleStatus::Planned,
            vehicles: Vec::new(),
            execution_id: None,
            created_by: principal.actor.clone(),
        })
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn audit_state(&self) -> Value {
        json!({
            "status": self.status,
            "distributionDate": self.distribution_date,
            "destinations": self.destinations.len(),
            "vehicles": self.vehicles.iter().map(|v| &v.plate_number).collect::<Vec<_>>(),
            "executionId": self.execution_id,
        })
    }

    fn action_name(action: &ScheduleAction) -> &'static str {
        match action {
            ScheduleAction::AttachExecution(_) => "schedule.attach_execution",
            ScheduleAction::DetachExecution(_) => "schedule.detach_execution",
            ScheduleAction::MarkInProgress => "schedule.start",
            ScheduleAction::MarkCompleted => "schedule.complete",
            ScheduleAction::Cancel => "schedule.cancel",
            ScheduleAction::AddVehicle(_) => "vehicle_assignment.add",
            ScheduleAction::RemoveVehicle(_) => "vehicle_assignment.remove",
        }
    }

    fn audit_metadata(&self, action: &ScheduleAction) -> Value {
        match action {
            ScheduleAction::AddVehicle(vehicle) => json!({
                "vehicleRef": vehicle.vehicle_ref,
                "plateNumber": vehicle.plate_number,
                "driverRef": vehicle.driver_ref,
            }),
            ScheduleAction::RemoveVehicle(assignment_id) => match self.find_vehicle(*assignment_id) {
                Some(vehicle) => json!({
                    "assignmentId": vehicle.id,
                    "vehicleRef": vehicle.vehicle_ref,
                    "plateNumber": vehicle.plate_number,
                }),
                None => Value::Null,
            },
            ScheduleAction::AttachExecution(execution_id)
            | ScheduleAction::DetachExecution(execution_id) => json!({ "executionId": execution_id }),
            _ => Value::Null,
        }
    }

    /// Replans destinations or date. Only while PLANNED and before an execution is attached.
    async fn on_update(
        &mut self,
        update: ScheduleUpdate,
        _principal: &Principal,
        _ctx: &(),
    ) -> Result<(), ScheduleError> {
        if self.status != ScheduleStatus::Planned {
            return Err(ScheduleError::Precondition(format!(
                "only PLANNED schedules can be replanned, schedule is {}",
                self.status
            )));
        }
        if self.execution_id.is_some() {
            return Err(ScheduleError::Precondition(
                "execution already attached".to_string(),
            ));
        }
        if let Some(destinations) = update.destinations {
            validate_destinations(&destinations)?;
            self.destinations = destinations;
        }
        if let Some(date) = update.distribution_date {
            self.distribution_date = date;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ScheduleAction,
        _principal: &Principal,
        _ctx: &(),
    ) -> Result<ScheduleActionResult, ScheduleError> {
        match action {
            ScheduleAction::AttachExecution(execution_id) => {
                if let Some(existing) = self.execution_id {
                    return Err(ScheduleError::DuplicateAction(format!(
                        "schedule already has execution {existing}"
                    )));
                }
                if self.status != ScheduleStatus::Planned {
                    return Err(ScheduleError::Precondition(format!(
                        "schedule is {}, expected PLANNED",
                        self.status
                    )));
                }
                self.execution_id = Some(execution_id);
                Ok(ScheduleActionResult::ExecutionAttached)
            }
            ScheduleAction::DetachExecution(execution_id) => {
                if self.execution_id != Some(execution_id) {
                    return Err(ScheduleError::Precondition(format!(
                        "execution {execution_id} is not attached"
                    )));
                }
                if self.status != ScheduleStatus::Planned {
                    return Err(ScheduleError::Precondition(format!(
                        "schedule is {}, expected PLANNED",
                        self.status
                    )));
                }
                self.execution_id = None;
                Ok(ScheduleActionResult::ExecutionDetached)
            }
            ScheduleAction::MarkInProgress => self.transition(ScheduleStatus::InProgress),
            ScheduleAction::MarkCompleted => self.transition(ScheduleStatus::Completed),
            ScheduleAction::Cancel => self.transition(ScheduleStatus::Cancelled),
            ScheduleAction::AddVehicle(vehicle) => self
                .add_vehicle(vehicle)
                .map(ScheduleActionResult::VehicleAdded),
            ScheduleAction::RemoveVehicle(assignment_id) => self
                .remove_vehicle(assignment_id)
                .map(ScheduleActionResult::VehicleRemoved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn principal() -> Principal {
        Principal::new("planner", TenantId::new("kitchen-north"))
    }

    fn create(destinations: Vec<Destination>) -> Result<Schedule, ScheduleError> {
        Schedule::from_create_params(
            ScheduleId::new(),
            &principal(),
            ScheduleCreate {
                production_batch_ref: "batch-7".to_string(),
                distribution_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                destinations,
            },
        )
    }

    #[test]
    fn test_create_stamps_tenant_and_creator() {
        let schedule = create(vec![Destination::new("school-1", 50)]).unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Planned);
        assert_eq!(schedule.tenant_id, TenantId::new("kitchen-north"));
        assert_eq!(schedule.created_by, "planner");
    }

    #[test]
    fn test_duplicate_destinations_rejected() {
        let err = create(vec![
            Destination::new("school-1", 50),
            Destination::new("school-1", 20),
        ])
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let mut schedule = create(vec![Destination::new("school-1", 50)]).unwrap();
        let p = principal();

        let err = schedule
            .handle_action(ScheduleAction::MarkCompleted, &p, &())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidTransition {
                current: ScheduleStatus::Planned,
                requested: ScheduleStatus::Completed
            }
        );

        schedule
            .handle_action(ScheduleAction::MarkInProgress, &p, &())
            .await
            .unwrap();
        schedule
            .handle_action(ScheduleAction::MarkCompleted, &p, &())
            .await
            .unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Completed);
    }

    #[tokio::test]
    async fn test_attach_execution_once() {
        let mut schedule = create(vec![Destination::new("school-1", 50)]).unwrap();
        let p = principal();
        let execution = crate::model::ExecutionId::new();

        schedule
            .handle_action(ScheduleAction::AttachExecution(execution), &p, &())
            .await
            .unwrap();
        let err = schedule
            .handle_action(ScheduleAction::AttachExecution(execution), &p, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateAction(_)));

        let err = schedule
            .on_update(ScheduleUpdate::default(), &p, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_detach_only_the_attached_execution() {
        let mut schedule = create(vec![Destination::new("school-1", 50)]).unwrap();
        let p = principal();
        let execution = crate::model::ExecutionId::new();
        schedule
            .handle_action(ScheduleAction::AttachExecution(execution), &p, &())
            .await
            .unwrap();

        let err = schedule
            .handle_action(
                ScheduleAction::DetachExecution(crate::model::ExecutionId::new()),
                &p,
                &(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Precondition(_)));
        assert_eq!(schedule.execution_id, Some(execution));

        schedule
            .handle_action(ScheduleAction::DetachExecution(execution), &p, &())
            .await
            .unwrap();
        assert_eq!(schedule.execution_id, None);

        // Free again for the retried execution
        schedule
            .handle_action(ScheduleAction::AttachExecution(crate::model::ExecutionId::new()), &p, &())
            .await
            .unwrap();
    }
}
