//! # Delivery Client
//!
//! The surface used by field devices: `start`, `arrive`, `complete`, `update_status`, plus
//! waypoint and photo ingestion and the metrics-bearing [`DeliveryView`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::clients::actor_client::ActorClient;
use crate::config::DeliveryRules;
use crate::delivery_actor::{
    ArriveDelivery, CompleteDelivery, DeliveryAction, DeliveryActionResult, DeliveryError, NewPhoto,
    StartDelivery, StatusUpdate, Waypoint,
};
use crate::framework::{FrameworkError, Principal, ResourceClient};
use crate::model::{Delivery, DeliveryCreate, DeliveryId, DeliveryMetrics, DeliveryStatus, DeliveryView};

/// Client for interacting with the Delivery actor.
#[derive(Clone)]
pub struct DeliveryClient {
    inner: ResourceClient<Delivery>,
    rules: DeliveryRules,
}

#[async_trait]
impl ActorClient<Delivery> for DeliveryClient {
    type Error = DeliveryError;

    fn inner(&self) -> &ResourceClient<Delivery> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> DeliveryError {
        match e.into_entity_error::<DeliveryError>() {
            Ok(err) => err,
            Err(FrameworkError::NotFound(id)) => DeliveryError::NotFound(id),
            Err(other) => DeliveryError::Unavailable(other.to_string()),
        }
    }
}

fn unexpected(result: DeliveryActionResult) -> DeliveryError {
    DeliveryError::Unavailable(format!("unexpected action result: {result:?}"))
}

impl DeliveryClient {
    pub fn new(inner: ResourceClient<Delivery>, rules: DeliveryRules) -> Self {
        Self { inner, rules }
    }

    /// Rules used to derive metrics.
    pub fn rules(&self) -> &DeliveryRules {
        &self.rules
    }

    #[instrument(skip(self, principal, params), fields(destination = %params.destination_ref))]
    pub async fn create_delivery(
        &self,
        principal: &Principal,
        params: DeliveryCreate,
    ) -> Result<DeliveryId, DeliveryError> {
        debug!("Sending request");
        self.inner
            .create(principal, params)
            .await
            .map_err(Self::map_error)
    }

    async fn act(
        &self,
        principal: &Principal,
        id: DeliveryId,
        action: DeliveryAction,
    ) -> Result<DeliveryActionResult, DeliveryError> {
        self.inner
            .perform_action(principal, id, action)
            .await
            .map_err(Self::map_error)
    }

    /// Records departure. A second call is a duplicate and leaves the first departure intact.
    #[instrument(skip(self, principal, params))]
    pub async fn start(
        &self,
        principal: &Principal,
        id: DeliveryId,
        params: StartDelivery,
    ) -> Result<DeliveryStatus, DeliveryError> {
        match self.act(principal, id, DeliveryAction::Start(params)).await? {
            DeliveryActionResult::Started(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Records arrival. The status stays DEPARTED.
    #[instrument(skip(self, principal, params))]
    pub async fn arrive(
        &self,
        principal: &Principal,
        id: DeliveryId,
        params: ArriveDelivery,
    ) -> Result<DateTime<Utc>, DeliveryError> {
        match self.act(principal, id, DeliveryAction::Arrive(params)).await? {
            DeliveryActionResult::Arrived(at) => Ok(at),
            other => Err(unexpected(other)),
        }
    }

    /// Records the handover and returns the final status (DELIVERED or FAILED).
    #[instrument(skip(self, principal, params), fields(portions = params.portions_delivered))]
    pub async fn complete(
        &self,
        principal: &Principal,
        id: DeliveryId,
        params: CompleteDelivery,
    ) -> Result<DeliveryStatus, DeliveryError> {
        match self.act(principal, id, DeliveryAction::Complete(params)).await? {
            DeliveryActionResult::Completed(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal, params), fields(requested = %params.status))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: DeliveryId,
        params: StatusUpdate,
    ) -> Result<DeliveryStatus, DeliveryError> {
        match self
            .act(principal, id, DeliveryAction::UpdateStatus(params))
            .await?
        {
            DeliveryActionResult::StatusUpdated(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Appends a GPS sample; returns the number of points in the log.
    #[instrument(skip(self, principal, waypoint))]
    pub async fn record_waypoint(
        &self,
        principal: &Principal,
        id: DeliveryId,
        waypoint: Waypoint,
    ) -> Result<usize, DeliveryError> {
        match self
            .act(principal, id, DeliveryAction::RecordWaypoint(waypoint))
            .await?
        {
            DeliveryActionResult::WaypointRecorded(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, principal, photo))]
    pub async fn attach_photo(
        &self,
        principal: &Principal,
        id: DeliveryId,
        photo: NewPhoto,
    ) -> Result<usize, DeliveryError> {
        match self
            .act(principal, id, DeliveryAction::AttachPhoto(photo))
            .await?
        {
            DeliveryActionResult::PhotoAttached(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    /// The delivery plus metrics derived at read time.
    pub async fn view(
        &self,
        principal: &Principal,
        id: DeliveryId,
    ) -> Result<DeliveryView, DeliveryError> {
        let delivery = self.fetch(principal, id).await?;
        let metrics = DeliveryMetrics::compute(&delivery, &self.rules);
        Ok(DeliveryView { delivery, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::TenantId;
    use crate::model::GeoPoint;

    fn principal() -> Principal {
        Principal::new("driver-7", TenantId::new("kitchen-north"))
    }

    #[tokio::test]
    async fn test_duplicate_start_surfaces_typed_error() {
        let mut mock = MockClient::<Delivery>::new();
        let id = DeliveryId::new();
        mock.expect_action(id)
            .return_ok(DeliveryActionResult::Started(DeliveryStatus::Departed));
        mock.expect_action(id)
            .return_err(FrameworkError::EntityError(Box::new(
                DeliveryError::DuplicateAction("departure already recorded".to_string()),
            )));

        let client = DeliveryClient::new(mock.client(), DeliveryRules::default());
        let start = || StartDelivery::new(Utc::now(), GeoPoint::new(-6.2, 106.8));

        assert_eq!(
            client.start(&principal(), id, start()).await,
            Ok(DeliveryStatus::Departed)
        );
        assert_eq!(
            client.start(&principal(), id, start()).await,
            Err(DeliveryError::DuplicateAction(
                "departure already recorded".to_string()
            ))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_mismatched_result_is_not_a_panic() {
        let mut mock = MockClient::<Delivery>::new();
        let id = DeliveryId::new();
        mock.expect_action(id)
            .return_ok(DeliveryActionResult::PhotoAttached(1));

        let client = DeliveryClient::new(mock.client(), DeliveryRules::default());
        let err = client
            .arrive(
                &principal(),
                id,
                ArriveDelivery::new(Utc::now(), GeoPoint::new(-6.2, 106.8)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Unavailable(_)));
    }
}
