//! # Delivery Actor
//!
//! Drives each destination's delivery through ASSIGNED → DEPARTED → DELIVERED | FAILED,
//! with CANCELLED reachable out-of-band, and owns its tracking log and photos.
//!
//! ## Structure
//!
//! - [`state_machine`] - transition table, events and guards
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`Delivery`]
//! - [`actions`] - [`DeliveryAction`] payloads and [`DeliveryActionResult`]
//! - [`error`] - [`DeliveryError`]
//!
//! The actor runs with the configured [`DeliveryRules`](crate::config::DeliveryRules) as its
//! context.

pub mod actions;
pub mod entity;
pub mod error;
pub mod state_machine;

pub use actions::*;
pub use error::*;
pub use state_machine::DeliveryEvent;

use std::sync::Arc;

use crate::audit::AuditSink;
use crate::clients::DeliveryClient;
use crate::config::DeliveryRules;
use crate::framework::ResourceActor;
use crate::model::{Delivery, DeliveryId};

/// Creates a new Delivery actor and its client.
pub fn new(
    buffer_size: usize,
    audit: Arc<dyn AuditSink>,
    rules: DeliveryRules,
) -> (ResourceActor<Delivery>, DeliveryClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, DeliveryId::new, audit);
    (actor, DeliveryClient::new(generic_client, rules))
}
