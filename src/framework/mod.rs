//! Generic actor framework for the engine's aggregates.
//!
//! This module provides the building blocks for type-safe, tenant-scoped actors that own one
//! aggregate type each, apply mutations transactionally and audit every change.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that aggregate types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that owns and mutates aggregates
//! - [`ResourceClient`] - Type-safe client for sending requests to an actor
//! - [`Principal`] / [`TenantId`] - The caller scope carried by every request
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;
pub mod scope;

// Re-export core types for convenience
pub use core::*;
pub use scope::{Principal, TenantId};
