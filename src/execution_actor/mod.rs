//! # Execution Actor
//!
//! One operational run of a schedule. Aggregates the run's deliveries and issues and owns
//! the completion logic.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for
//!   [`Execution`], including creation, start, completion and cancellation
//! - [`issues`] - the issue tracker (report / resolve)
//! - [`actions`] - [`ExecutionAction`] payloads and [`ExecutionActionResult`]
//! - [`error`] - [`ExecutionError`]
//!
//! ## Dependencies
//!
//! The actor runs with an [`ExecutionContext`] of `(ScheduleClient, DeliveryClient)`. Both
//! dependencies are leaves, so the request graph has no cycles.

pub mod actions;
pub mod entity;
pub mod error;
pub mod issues;

pub use actions::*;
pub use entity::ExecutionContext;
pub use error::*;

use std::sync::Arc;

use crate::audit::AuditSink;
use crate::clients::{DeliveryClient, ExecutionClient};
use crate::framework::ResourceActor;
use crate::model::{Execution, ExecutionId};

/// Creates a new Execution actor and its client.
///
/// `deliveries` is only used by the client to assemble views; the actor receives its own
/// dependencies through `run()`.
pub fn new(
    buffer_size: usize,
    audit: Arc<dyn AuditSink>,
    deliveries: DeliveryClient,
) -> (ResourceActor<Execution>, ExecutionClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, ExecutionId::new, audit);
    (actor, ExecutionClient::new(generic_client, deliveries))
}
