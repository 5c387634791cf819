use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::framework::{ActorEntity, FrameworkError, Principal, ResourceClient};

/// Trait for aggregate-specific clients to inherit the standard read operations.
///
/// Implementors only supply the inner [`ResourceClient`] and the error mapping.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The aggregate-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the aggregate's error type.
    ///
    /// Implementations recover typed entity errors with
    /// [`FrameworkError::into_entity_error`] and turn plumbing failures into an
    /// "unavailable" variant.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an aggregate by ID. Aggregates of other tenants are `None`.
    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    async fn get(&self, principal: &Principal, id: T::Id) -> Result<Option<T>, Self::Error> {
        debug!("Sending request");
        self.inner().get(principal, id).await.map_err(Self::map_error)
    }

    /// Fetch an aggregate that must exist, reporting a not-found error otherwise.
    async fn fetch(&self, principal: &Principal, id: T::Id) -> Result<T, Self::Error> {
        let missing = FrameworkError::NotFound(id.to_string());
        self.get(principal, id)
            .await?
            .ok_or_else(|| Self::map_error(missing))
    }
}
