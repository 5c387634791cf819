//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
//! Without `RUST_LOG` the engine logs at `info` and dependencies at `warn`.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: start and shutdown of each actor, with its final store size
//! - **Operations**: every create, get, update and action with `entity_type` and `id` fields;
//!   rejected requests log at `warn` with the error
//! - **Client Calls**: `#[instrument]` spans on the domain clients, recording the tenant and
//!   key payload fields
//! - **Audit**: each appended entry at `debug`
//!
//! ## Usage Examples
//!
//! ```bash
//! # Operations and failures (the default)
//! cargo run
//!
//! # Full payloads and audit appends
//! RUST_LOG=debug cargo run
//!
//! # Only the actor loop
//! RUST_LOG=distribution_engine::framework=debug cargo run
//! ```
//!
//! A delivery run at `info` reads like:
//!
//! ```text
//! INFO Created entity_type="Delivery" id=delivery_6f1c… size=3
//! INFO Deliveries assigned execution=execution_a9e2… deliveries=3 planned=150
//! INFO Action ok entity_type="Delivery" id=delivery_6f1c…
//! WARN Action failed entity_type="Execution" id=execution_a9e2… error=Execution cannot complete: unresolved issues (1 open issues, 0 pending deliveries)
//! ```
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn,distribution_engine=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_filter_parses() {
        let filter: EnvFilter = DEFAULT_FILTER.parse().unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
