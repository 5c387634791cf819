//! # Schedule Actor
//!
//! Owns planned distribution days and their vehicle assignments.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for
//!   [`Schedule`]
//! - [`vehicle_assignment`] - add/remove vehicle bindings
//! - [`error`] - [`ScheduleError`]
//! - [`actions`] - [`ScheduleAction`] and [`ScheduleActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! The Schedule actor has no dependencies, so it runs with a `()` context.

pub mod actions;
pub mod entity;
pub mod error;
pub mod vehicle_assignment;

pub use actions::*;
pub use error::*;

use std::sync::Arc;

use crate::audit::AuditSink;
use crate::clients::ScheduleClient;
use crate::framework::ResourceActor;
use crate::model::{Schedule, ScheduleId};

/// Creates a new Schedule actor and its client.
pub fn new(buffer_size: usize, audit: Arc<dyn AuditSink>) -> (ResourceActor<Schedule>, ScheduleClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, ScheduleId::new, audit);
    (actor, ScheduleClient::new(generic_client))
}
