//! # Distribution Engine
//!
//! > **The execution core of a meal-distribution service.**
//!
//! This crate tracks the last mile of prepared meals from a kitchen to recipient sites: one
//! day's run (an [`Execution`](model::Execution)) and its per-destination
//! [`Delivery`](model::Delivery) units, GPS tracking, field-reported issues that block
//! completion, vehicle assignment, and reconciliation of planned against delivered portions.
//!
//! ## 🏗️ Design
//!
//! Each aggregate type (Schedule, Delivery, Execution) is owned by one generic
//! [`ResourceActor`](framework::ResourceActor) running in its own Tokio task. An actor
//! processes its requests sequentially, so one request is one transaction on one aggregate:
//!
//! - A mutation is applied to a draft copy and committed only after the hook succeeded and
//!   the audit entry was appended. A refused request leaves no partial write.
//! - Every request carries the caller's [`Principal`](framework::Principal); the actor
//!   filters every lookup by tenant, once, at the store boundary.
//! - Delivery legality lives in one state machine
//!   ([`delivery_actor::state_machine`]); arrival is a milestone, not a status.
//! - Issues live inside the execution, so the "no open issue, no pending delivery" check and
//!   the COMPLETED write happen in one request.
//!
//! ## ⚠️ Error Handling
//!
//! Each actor has its own `thiserror` enum ([`ScheduleError`](schedule_actor::ScheduleError),
//! [`DeliveryError`](delivery_actor::DeliveryError),
//! [`ExecutionError`](execution_actor::ExecutionError)) covering not-found, illegal
//! transition, missing precondition, duplicate submission, invariant violation and
//! validation. Clients recover the typed error from the framework's boxed entity error.
//! Nothing is retried inside the engine; the duplicate guards make caller retries safe.
//!
//! ## 🗺️ Module Tour
//!
//! - [`framework`] - the generic actor, client, caller scope and mocks
//! - [`audit`] - the append-only audit trail
//! - [`model`] - aggregates, tracking log and derived metrics
//! - [`schedule_actor`], [`delivery_actor`], [`execution_actor`] - the aggregates' behaviour
//! - [`clients`] - domain clients wrapping the generic one
//! - [`lifecycle`] - wiring, shutdown and tracing setup
//! - [`config`] - engine settings from the environment
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod audit;
pub mod clients;
pub mod config;
pub mod delivery_actor;
pub mod execution_actor;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod schedule_actor;
