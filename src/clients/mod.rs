//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).
//!
//! Each client turns the generic request/response plumbing into named domain operations and
//! maps [`FrameworkError`](crate::framework::FrameworkError) back to the aggregate's error.

pub mod actor_client;
pub mod delivery_client;
pub mod execution_client;
pub mod schedule_client;

pub use actor_client::*;
pub use delivery_client::*;
pub use execution_client::*;
pub use schedule_client::*;
