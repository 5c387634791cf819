//! Vehicle composition of a schedule.

use tracing::debug;

use super::ScheduleError;
use crate::model::{AssignmentId, NewVehicleAssignment, Schedule, ScheduleStatus, VehicleAssignment};

impl Schedule {
    pub fn find_vehicle(&self, assignment_id: AssignmentId) -> Option<&VehicleAssignment> {
        self.vehicles.iter().find(|vehicle| vehicle.id == assignment_id)
    }

    /// Binds a vehicle with its driver and helpers. Only while PLANNED.
    pub fn add_vehicle(
        &mut self,
        assignment: NewVehicleAssignment,
    ) -> Result<AssignmentId, ScheduleError> {
        if self.status != ScheduleStatus::Planned {
            return Err(ScheduleError::Precondition(format!(
                "vehicles can only be added while PLANNED, schedule is {}",
                self.status
            )));
        }
        for (field, value) in [
            ("vehicle_ref", &assignment.vehicle_ref),
            ("plate_number", &assignment.plate_number),
            ("driver_ref", &assignment.driver_ref),
        ] {
            if value.trim().is_empty() {
                return Err(ScheduleError::Validation(format!("{field} is required")));
            }
        }
        if self
            .vehicles
            .iter()
            .any(|vehicle| vehicle.vehicle_ref == assignment.vehicle_ref)
        {
            return Err(ScheduleError::DuplicateAction(format!(
                "vehicle {} already assigned",
                assignment.vehicle_ref
            )));
        }

        let id = AssignmentId::new();
        debug!(%id, plate = %assignment.plate_number, "Vehicle assigned");
        self.vehicles.push(VehicleAssignment {
            id,
            schedule_id: self.id,
            vehicle_ref: assignment.vehicle_ref,
            plate_number: assignment.plate_number,
            driver_ref: assignment.driver_ref,
            helpers: assignment.helpers,
            assigned_at: assignment.assigned_at,
        });
        Ok(id)
    }

    /// Unbinds a vehicle. Logistics are frozen once the run has started.
    pub fn remove_vehicle(
        &mut self,
        assignment_id: AssignmentId,
    ) -> Result<VehicleAssignment, ScheduleError> {
        if matches!(
            self.status,
            ScheduleStatus::InProgress | ScheduleStatus::Completed
        ) {
            return Err(ScheduleError::Precondition(format!(
                "cannot remove vehicles from a {} schedule",
                self.status
            )));
        }
        let index = self
            .vehicles
            .iter()
            .position(|vehicle| vehicle.id == assignment_id)
            .ok_or_else(|| ScheduleError::NotFound(assignment_id.to_string()))?;
        Ok(self.vehicles.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::TenantId;
    use crate::model::ScheduleId;
    use chrono::{NaiveDate, Utc};

    fn schedule() -> Schedule {
        Schedule {
            id: ScheduleId::new(),
            tenant_id: TenantId::new("kitchen-north"),
            production_batch_ref: "batch-1".to_string(),
            distribution_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            destinations: vec![],
            status: ScheduleStatus::Planned,
            vehicles: vec![],
            execution_id: None,
            created_by: "planner".to_string(),
        }
    }

    fn van(vehicle_ref: &str) -> NewVehicleAssignment {
        NewVehicleAssignment {
            vehicle_ref: vehicle_ref.to_string(),
            plate_number: format!("B {vehicle_ref}"),
            driver_ref: "driver-1".to_string(),
            helpers: vec!["helper-1".to_string()],
            assigned_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_remove_while_planned() {
        let mut schedule = schedule();
        let id = schedule.add_vehicle(van("van-1")).unwrap();
        assert_eq!(schedule.find_vehicle(id).unwrap().plate_number, "B van-1");

        let removed = schedule.remove_vehicle(id).unwrap();
        assert_eq!(removed.vehicle_ref, "van-1");
        assert!(schedule.vehicles.is_empty());
    }

    #[test]
    fn test_same_vehicle_twice_is_duplicate() {
        let mut schedule = schedule();
        schedule.add_vehicle(van("van-1")).unwrap();
        assert!(matches!(
            schedule.add_vehicle(van("van-1")),
            Err(ScheduleError::DuplicateAction(_))
        ));
    }

    #[test]
    fn test_missing_plate_is_invalid() {
        let mut schedule = schedule();
        let mut vehicle = van("van-1");
        vehicle.plate_number = " ".to_string();
        assert_eq!(
            schedule.add_vehicle(vehicle),
            Err(ScheduleError::Validation("plate_number is required".to_string()))
        );
    }

    #[test]
    fn test_removal_rejected_once_running() {
        let mut schedule = schedule();
        let id = schedule.add_vehicle(van("van-1")).unwrap();

        for status in [ScheduleStatus::InProgress, ScheduleStatus::Completed] {
            schedule.status = status;
            assert!(matches!(
                schedule.remove_vehicle(id),
                Err(ScheduleError::Precondition(_))
            ));
        }
        assert_eq!(schedule.vehicles.len(), 1);
        assert!(matches!(
            schedule.add_vehicle(van("van-2")),
            Err(ScheduleError::Precondition(_))
        ));
    }

    #[test]
    fn test_unknown_assignment_is_not_found() {
        let mut schedule = schedule();
        assert!(matches!(
            schedule.remove_vehicle(AssignmentId::new()),
            Err(ScheduleError::NotFound(_))
        ));
    }
}
