//! Custom actions for the Schedule actor.
//!
//! Status changes are driven by the Execution actor; vehicle assignment is driven by planners.

use crate::model::{AssignmentId, ExecutionId, NewVehicleAssignment, ScheduleStatus, VehicleAssignment};

#[derive(Debug, Clone)]
pub enum ScheduleAction {
    /// Links the execution spawned from this schedule. Allowed once.
    AttachExecution(ExecutionId),
    /// Unlinks an execution that was never committed. Only while PLANNED.
    DetachExecution(ExecutionId),
    MarkInProgress,
    MarkCompleted,
    Cancel,
    AddVehicle(NewVehicleAssignment),
    /// Rejected once the run is IN_PROGRESS or COMPLETED.
    RemoveVehicle(AssignmentId),
}

/// Results from ScheduleActions - variants match 1:1 with the action kinds.
#[derive(Debug, Clone)]
pub enum ScheduleActionResult {
    ExecutionAttached,
    ExecutionDetached,
    StatusChanged(ScheduleStatus),
    VehicleAdded(AssignmentId),
    VehicleRemoved(VehicleAssignment),
}
