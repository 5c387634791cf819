//! Runtime wiring: actor startup, dependency injection, shutdown and tracing setup.

pub mod distribution_system;
pub mod tracing;

pub use distribution_system::*;
pub use self::tracing::setup_tracing;
