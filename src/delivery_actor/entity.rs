//! [`ActorEntity`] implementation for [`Delivery`].
//!
//! Every operation first asks the [state machine](super::state_machine) whether the event is
//! legal, then validates the payload, then applies the change. The actor applies hooks to a
//! draft, so an error at any step leaves the stored delivery untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::actions::*;
use super::state_machine::{next_status, DeliveryEvent};
use super::DeliveryError;
use crate::config::{DeliveryRules, OverDeliveryPolicy};
use crate::framework::{ActorEntity, Principal, TenantId};
use crate::model::{
    Delivery, DeliveryCreate, DeliveryId, DeliveryStatus, GeoPoint, Milestones, Photo, PhotoKind,
    RecipientConfirmation, TrackingLabel, TrackingLog,
};

const MIN_FOOD_TEMPERATURE: f64 = -50.0;
const MAX_FOOD_TEMPERATURE: f64 = 150.0;

fn validate_location(location: &GeoPoint) -> Result<(), DeliveryError> {
    location.validate().map_err(DeliveryError::Validation)
}

fn not_before(
    later: DateTime<Utc>,
    earlier: Option<DateTime<Utc>>,
    what: &str,
) -> Result<(), DeliveryError> {
    match earlier {
        Some(earlier) if later < earlier => Err(DeliveryError::Validation(format!(
            "{what} ({later}) precedes {earlier}"
        ))),
        _ => Ok(()),
    }
}

impl Delivery {
    fn push_note(&mut self, note: Option<String>) {
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            self.notes.push(note);
        }
    }

    fn start(&mut self, params: StartDelivery) -> Result<DeliveryActionResult, DeliveryError> {
        let next = next_status(self.status, &self.milestones, DeliveryEvent::Start)?;
        validate_location(&params.departure_location)?;

        self.status = next;
        self.milestones.departed_at = Some(params.departure_time);
        self.departure_location = Some(params.departure_location);
        self.vehicle_info = params.vehicle_info.or(self.vehicle_info.take());
        self.driver_name = params.driver_name.or(self.driver_name.take());
        if !params.helper_names.is_empty() {
            self.helper_names = params.helper_names;
        }
        self.tracking.append(
            params.departure_location,
            TrackingLabel::Departed,
            params.departure_time,
        );
        self.push_note(params.notes);
        Ok(DeliveryActionResult::Started(next))
    }

    fn arrive(&mut self, params: ArriveDelivery) -> Result<DeliveryActionResult, DeliveryError> {
        next_status(self.status, &self.milestones, DeliveryEvent::Arrive)?;
        validate_location(&params.arrival_location)?;
        not_before(params.arrival_time, self.milestones.departed_at, "arrival")?;

        self.milestones.arrived_at = Some(params.arrival_time);
        self.arrival_location = Some(params.arrival_location);
        self.tracking.append(
            params.arrival_location,
            TrackingLabel::Arrived,
            params.arrival_time,
        );
        self.push_note(params.notes);
        Ok(DeliveryActionResult::Arrived(params.arrival_time))
    }

    fn complete(
        &mut self,
        params: CompleteDelivery,
        rules: &DeliveryRules,
    ) -> Result<DeliveryActionResult, DeliveryError> {
        let fulfilled = params.portions_delivered >= self.portions_planned;
        let next = next_status(
            self.status,
            &self.milestones,
            DeliveryEvent::Complete { fulfilled },
        )?;

        if params.portions_delivered > self.portions_planned
            && rules.over_delivery == OverDeliveryPolicy::Reject
        {
            return Err(DeliveryError::Validation(format!(
                "portions delivered ({}) exceed portions planned ({})",
                params.portions_delivered, self.portions_planned
            )));
        }
        if params.recipient_name.trim().is_empty() {
            return Err(DeliveryError::Validation("recipient name is required".to_string()));
        }
        if let Some(temperature) = params.food_temperature {
            if !(MIN_FOOD_TEMPERATURE..=MAX_FOOD_TEMPERATURE).contains(&temperature) {
                return Err(DeliveryError::Validation(format!(
                    "food temperature {temperature} out of range"
                )));
            }
        }
        if params.photo_ref.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(DeliveryError::Validation("photo reference is empty".to_string()));
        }
        not_before(params.completed_at, self.milestones.arrived_at, "completion")?;

        self.status = next;
        self.milestones.completed_at = Some(params.completed_at);
        self.portions_delivered = Some(params.portions_delivered);
        self.recipient = Some(RecipientConfirmation {
            name: params.recipient_name,
            title: params.recipient_title,
            signature_ref: params.recipient_signature,
        });
        self.food_quality_checked = params.food_quality_checked;
        self.food_quality_notes = params.food_quality_notes;
        self.food_temperature = params.food_temperature;
        if let Some(media_ref) = params.photo_ref {
            self.photos.push(Photo {
                kind: PhotoKind::DeliveryProof,
                media_ref,
                caption: None,
                taken_at: params.completed_at,
            });
        }
        self.push_note(params.notes);
        Ok(DeliveryActionResult::Completed(next))
    }

    fn update_status(&mut self, params: StatusUpdate) -> Result<DeliveryActionResult, DeliveryError> {
        let next = next_status(
            self.status,
            &self.milestones,
            DeliveryEvent::Transition(params.status),
        )?;
        if let Some(location) = &params.current_location {
            validate_location(location)?;
        }

        match next {
            DeliveryStatus::Departed => {
                self.milestones.departed_at = Some(params.occurred_at);
                self.departure_location = params.current_location;
            }
            DeliveryStatus::Delivered | DeliveryStatus::Failed => {
                not_before(params.occurred_at, self.milestones.departed_at, "completion")?;
                self.milestones.completed_at = Some(params.occurred_at);
            }
            DeliveryStatus::Assigned | DeliveryStatus::Cancelled => {}
        }

        if let Some(location) = params.current_location {
            let label = if next == DeliveryStatus::Departed {
                TrackingLabel::Departed
            } else {
                TrackingLabel::Waypoint
            };
            self.tracking.append(location, label, params.occurred_at);
        }
        self.status = next;
        self.push_note(params.notes);
        Ok(DeliveryActionResult::StatusUpdated(next))
    }

    fn record_waypoint(&mut self, waypoint: Waypoint) -> Result<DeliveryActionResult, DeliveryError> {
        if self.status != DeliveryStatus::Departed {
            return Err(DeliveryError::Precondition(format!(
                "waypoints are only accepted while DEPARTED, delivery is {}",
                self.status
            )));
        }
        validate_location(&waypoint.location)?;
        let count = self.tracking.append(
            waypoint.location,
            TrackingLabel::Waypoint,
            waypoint.recorded_at,
        );
        Ok(DeliveryActionResult::WaypointRecorded(count))
    }

    fn attach_photo(&mut self, photo: NewPhoto) -> Result<DeliveryActionResult, DeliveryError> {
        if self.is_terminal() {
            return Err(DeliveryError::Precondition(format!(
                "delivery is {} and accepts no further changes",
                self.status
            )));
        }
        if photo.media_ref.trim().is_empty() {
            return Err(DeliveryError::Validation("photo reference is empty".to_string()));
        }
        self.photos.push(Photo {
            kind: photo.kind,
            media_ref: photo.media_ref,
            caption: photo.caption,
            taken_at: photo.taken_at,
        });
        Ok(DeliveryActionResult::PhotoAttached(self.photos.len()))
    }
}

#[async_trait]
impl ActorEntity for Delivery {
    const KIND: &'static str = "Delivery";
    type Id = DeliveryId;
    type Create = DeliveryCreate;
    type Update = std::convert::Infallible;
    type Action = DeliveryAction;
    type ActionResult = DeliveryActionResult;
    type Context = DeliveryRules;
    type Error = DeliveryError;

    fn from_create_params(
        id: DeliveryId,
        principal: &Principal,
        params: DeliveryCreate,
    ) -> Result<Self, DeliveryError> {
        if params.destination_ref.trim().is_empty() {
            return Err(DeliveryError::Validation("destination_ref is required".to_string()));
        }
        Ok(Self {
            id,
            tenant_id: principal.tenant_id.clone(),
            execution_id: params.execution_id,
            destination_ref: params.destination_ref,
            status: DeliveryStatus::Assigned,
            milestones: Milestones::default(),
            portions_planned: params.portions_planned,
            portions_delivered: None,
            planned_arrival: params.planned_arrival,
            departure_location: None,
            arrival_location: None,
            vehicle_info: None,
            driver_name: None,
            helper_names: Vec::new(),
            recipient: None,
            food_quality_checked: false,
            food_quality_notes: None,
            food_temperature: None,
            notes: Vec::new(),
            tracking: TrackingLog::new(),
            photos: Vec::new(),
        })
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn audit_state(&self) -> Value {
        json!({
            "status": self.status,
            "departedAt": self.milestones.departed_at,
            "arrivedAt": self.milestones.arrived_at,
            "completedAt": self.milestones.completed_at,
            "portionsDelivered": self.portions_delivered,
            "trackingPoints": self.tracking.len(),
            "photos": self.photos.len(),
        })
    }

    fn action_name(action: &DeliveryAction) -> &'static str {
        match action {
            DeliveryAction::Start(_) => "delivery.start",
            DeliveryAction::Arrive(_) => "delivery.arrive",
            DeliveryAction::Complete(_) => "delivery.complete",
            DeliveryAction::UpdateStatus(_) => "delivery.update_status",
            DeliveryAction::RecordWaypoint(_) => "delivery.record_waypoint",
            DeliveryAction::AttachPhoto(_) => "delivery.attach_photo",
        }
    }

    fn audit_metadata(&self, action: &DeliveryAction) -> Value {
        match action {
            DeliveryAction::Complete(params) => json!({
                "portionsPlanned": self.portions_planned,
                "portionsDelivered": params.portions_delivered,
                "recipientName": params.recipient_name,
            }),
            DeliveryAction::UpdateStatus(params) => json!({ "requested": params.status }),
            DeliveryAction::AttachPhoto(photo) => json!({ "mediaRef": photo.media_ref }),
            _ => Value::Null,
        }
    }

    async fn on_update(
        &mut self,
        update: std::convert::Infallible,
        _principal: &Principal,
        _ctx: &DeliveryRules,
    ) -> Result<(), DeliveryError> {
        match update {}
    }

    async fn handle_action(
        &mut self,
        action: DeliveryAction,
        _principal: &Principal,
        rules: &DeliveryRules,
    ) -> Result<DeliveryActionResult, DeliveryError> {
        match action {
            DeliveryAction::Start(params) => self.start(params),
            DeliveryAction::Arrive(params) => self.arrive(params),
            DeliveryAction::Complete(params) => self.complete(params, rules),
            DeliveryAction::UpdateStatus(params) => self.update_status(params),
            DeliveryAction::RecordWaypoint(waypoint) => self.record_waypoint(waypoint),
            DeliveryAction::AttachPhoto(photo) => self.attach_photo(photo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExecutionId;
    use chrono::{Duration, TimeZone};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn kitchen() -> GeoPoint {
        GeoPoint::new(-6.200, 106.816)
    }

    fn school() -> GeoPoint {
        GeoPoint::new(-6.175, 106.827).with_accuracy(8.0)
    }

    fn principal() -> Principal {
        Principal::new("driver-7", TenantId::new("kitchen-north"))
    }

    fn delivery(portions_planned: u32) -> Delivery {
        Delivery::from_create_params(
            DeliveryId::new(),
            &principal(),
            DeliveryCreate {
                execution_id: ExecutionId::new(),
                destination_ref: "school-1".to_string(),
                portions_planned,
                planned_arrival: Some(t(30)),
            },
        )
        .unwrap()
    }

    async fn act(
        delivery: &mut Delivery,
        action: DeliveryAction,
        rules: &DeliveryRules,
    ) -> Result<DeliveryActionResult, DeliveryError> {
        delivery.handle_action(action, &principal(), rules).await
    }

    async fn drive_to_arrival(delivery: &mut Delivery, rules: &DeliveryRules) {
        act(delivery, DeliveryAction::Start(StartDelivery::new(t(0), kitchen())), rules)
            .await
            .unwrap();
        act(delivery, DeliveryAction::Arrive(ArriveDelivery::new(t(25), school())), rules)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_delivery_is_delivered() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        drive_to_arrival(&mut d, &rules).await;

        let result = act(
            &mut d,
            DeliveryAction::Complete(CompleteDelivery::new(t(35), 50, "Ibu Sari")),
            &rules,
        )
        .await
        .unwrap();

        assert_eq!(result, DeliveryActionResult::Completed(DeliveryStatus::Delivered));
        assert_eq!(d.status, DeliveryStatus::Delivered);
        assert_eq!(d.tracking.len(), 2);
        assert_eq!(d.tracking.points()[0].label, TrackingLabel::Departed);
        assert_eq!(d.tracking.points()[1].label, TrackingLabel::Arrived);
        assert_eq!(d.current_location().unwrap().location, school());
        assert_eq!(d.recipient.as_ref().unwrap().name, "Ibu Sari");
    }

    #[tokio::test]
    async fn test_short_delivery_is_failed() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        drive_to_arrival(&mut d, &rules).await;

        let result = act(
            &mut d,
            DeliveryAction::Complete(CompleteDelivery::new(t(35), 30, "Ibu Sari")),
            &rules,
        )
        .await
        .unwrap();

        assert_eq!(result, DeliveryActionResult::Completed(DeliveryStatus::Failed));
        assert_eq!(d.portions_delivered, Some(30));
    }

    #[tokio::test]
    async fn test_arrive_before_start() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        let err = act(&mut d, DeliveryAction::Arrive(ArriveDelivery::new(t(25), school())), &rules)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DeliveryError::Precondition("departure not recorded".to_string())
        );
        assert!(d.milestones.arrived_at.is_none());
    }

    #[tokio::test]
    async fn test_second_start_is_duplicate() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        act(&mut d, DeliveryAction::Start(StartDelivery::new(t(0), kitchen())), &rules)
            .await
            .unwrap();

        let err = act(&mut d, DeliveryAction::Start(StartDelivery::new(t(3), school())), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::DuplicateAction(_)));
        assert_eq!(d.milestones.departed_at, Some(t(0)));
        assert_eq!(d.tracking.len(), 1);
    }

    #[tokio::test]
    async fn test_delivered_cannot_go_back_to_departed() {
        let rules = DeliveryRules::default();
        let mut d = delivery(10);
        drive_to_arrival(&mut d, &rules).await;
        act(
            &mut d,
            DeliveryAction::Complete(CompleteDelivery::new(t(30), 10, "Pak Budi")),
            &rules,
        )
        .await
        .unwrap();

        let err = act(
            &mut d,
            DeliveryAction::UpdateStatus(StatusUpdate::new(DeliveryStatus::Departed, t(40))),
            &rules,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            DeliveryError::InvalidTransition {
                current: DeliveryStatus::Delivered,
                requested: DeliveryStatus::Departed
            }
        );
    }

    #[tokio::test]
    async fn test_over_delivery_policy() {
        let mut d = delivery(50);
        let reject = DeliveryRules::default();
        drive_to_arrival(&mut d, &reject).await;
        let complete = || DeliveryAction::Complete(CompleteDelivery::new(t(35), 55, "Ibu Sari"));

        let err = act(&mut d, complete(), &reject).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));

        let accept = DeliveryRules {
            over_delivery: OverDeliveryPolicy::Accept,
            ..DeliveryRules::default()
        };
        let result = act(&mut d, complete(), &accept).await.unwrap();
        assert_eq!(result, DeliveryActionResult::Completed(DeliveryStatus::Delivered));
        assert_eq!(d.portions_delivered, Some(55));
    }

    #[tokio::test]
    async fn test_temporal_and_payload_validation() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        act(&mut d, DeliveryAction::Start(StartDelivery::new(t(10), kitchen())), &rules)
            .await
            .unwrap();

        let err = act(&mut d, DeliveryAction::Arrive(ArriveDelivery::new(t(5), school())), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));

        let err = act(
            &mut d,
            DeliveryAction::Arrive(ArriveDelivery::new(t(20), GeoPoint::new(95.0, 0.0))),
            &rules,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));

        act(&mut d, DeliveryAction::Arrive(ArriveDelivery::new(t(20), school())), &rules)
            .await
            .unwrap();
        let mut too_hot = CompleteDelivery::new(t(25), 50, "Ibu Sari");
        too_hot.food_temperature = Some(300.0);
        let err = act(&mut d, DeliveryAction::Complete(too_hot), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));

        let err = act(
            &mut d,
            DeliveryAction::Complete(CompleteDelivery::new(t(25), 50, "  ")),
            &rules,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_waypoints_only_while_departed() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        let waypoint = |minute| {
            DeliveryAction::RecordWaypoint(Waypoint {
                location: GeoPoint::new(-6.19, 106.82),
                recorded_at: t(minute),
            })
        };

        let err = act(&mut d, waypoint(1), &rules).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Precondition(_)));

        act(&mut d, DeliveryAction::Start(StartDelivery::new(t(0), kitchen())), &rules)
            .await
            .unwrap();
        assert_eq!(
            act(&mut d, waypoint(5), &rules).await.unwrap(),
            DeliveryActionResult::WaypointRecorded(2)
        );
        assert_eq!(d.current_location().unwrap().label, TrackingLabel::Waypoint);
    }

    #[tokio::test]
    async fn test_cancel_then_no_further_mutation() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        act(
            &mut d,
            DeliveryAction::UpdateStatus(StatusUpdate::new(DeliveryStatus::Cancelled, t(1))),
            &rules,
        )
        .await
        .unwrap();

        let photo = DeliveryAction::AttachPhoto(NewPhoto {
            kind: PhotoKind::Other,
            media_ref: "media://1".to_string(),
            caption: None,
            taken_at: t(2),
        });
        assert!(matches!(
            act(&mut d, photo, &rules).await,
            Err(DeliveryError::Precondition(_))
        ));
        assert!(matches!(
            act(&mut d, DeliveryAction::Start(StartDelivery::new(t(3), kitchen())), &rules).await,
            Err(DeliveryError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_status_departed_records_departure() {
        let rules = DeliveryRules::default();
        let mut d = delivery(50);
        let mut update = StatusUpdate::new(DeliveryStatus::Departed, t(2));
        update.current_location = Some(kitchen());
        act(&mut d, DeliveryAction::UpdateStatus(update), &rules)
            .await
            .unwrap();

        assert_eq!(d.milestones.departed_at, Some(t(2)));
        assert_eq!(d.tracking.points()[0].label, TrackingLabel::Departed);
        let err = act(&mut d, DeliveryAction::Start(StartDelivery::new(t(3), kitchen())), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::DuplicateAction(_)));
    }
}
