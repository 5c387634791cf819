//! Pure data structures (DTOs) for the engine's aggregates.
//!
//! The [`ActorEntity`](crate::framework::ActorEntity) implementations live next to each actor;
//! this module only holds the data.

pub mod delivery;
pub mod execution;
pub mod ids;
pub mod issue;
pub mod metrics;
pub mod schedule;
pub mod tracking;
pub mod vehicle;

pub use delivery::*;
pub use execution::*;
pub use ids::*;
pub use issue::*;
pub use metrics::*;
pub use schedule::*;
pub use tracking::*;
pub use vehicle::*;
