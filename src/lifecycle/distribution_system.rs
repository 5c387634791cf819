use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::audit::AuditSink;
use crate::clients::{DeliveryClient, ExecutionClient, ScheduleClient};
use crate::config::EngineConfig;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Actor task failed: {0}")]
    ActorTask(String),
}

/// The runtime orchestrator of the distribution engine.
///
/// `DistributionSystem` is responsible for:
/// - **Lifecycle Management**: starting and stopping the Schedule, Delivery and Execution actors
/// - **Dependency Wiring**: injecting the Schedule and Delivery clients into the Execution actor
/// - **Shared Resources**: the audit sink all actors append to, and the delivery rules
///
/// # Example
///
/// ```ignore
/// let system = DistributionSystem::new(&EngineConfig::default(), Arc::new(InMemoryAuditLog::new()));
///
/// let schedule_id = system.schedule_client.create_schedule(&principal, plan).await?;
/// let execution_id = system.execution_client.create_execution(&principal, schedule_id).await?;
///
/// system.shutdown().await?;
/// ```
pub struct DistributionSystem {
    pub schedule_client: ScheduleClient,
    pub delivery_client: DeliveryClient,
    pub execution_client: ExecutionClient,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl DistributionSystem {
    /// Creates all actors and spawns each in its own Tokio task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &EngineConfig, audit: Arc<dyn AuditSink>) -> Self {
        let capacity = config.channel_capacity;

        // 1. Create actors
        let (schedule_actor, schedule_client) = crate::schedule_actor::new(capacity, audit.clone());
        let (delivery_actor, delivery_client) =
            crate::delivery_actor::new(capacity, audit.clone(), config.delivery.clone());
        let (execution_actor, execution_client) =
            crate::execution_actor::new(capacity, audit, delivery_client.clone());

        // 2. Start actors with injected context
        let schedule_handle = tokio::spawn(schedule_actor.run(()));
        let delivery_handle = tokio::spawn(delivery_actor.run(config.delivery.clone()));
        let execution_handle = tokio::spawn(
            execution_actor.run((schedule_client.clone(), delivery_client.clone())),
        );

        info!(capacity, "Distribution system started");
        Self {
            schedule_client,
            delivery_client,
            execution_client,
            handles: vec![schedule_handle, delivery_handle, execution_handle],
        }
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Dropping the clients closes the request channels once no other clones remain; each
    /// actor then drains its queue and exits. The Execution actor holds clones of the Schedule
    /// and Delivery clients, so those two stop only after it has. Handles are awaited in
    /// reverse start order.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down distribution system...");

        drop(self.execution_client);
        drop(self.delivery_client);
        drop(self.schedule_client);

        for handle in self.handles.into_iter().rev() {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::ActorTask(e.to_string()));
            }
        }

        info!("Distribution system shutdown complete.");
        Ok(())
    }
}
