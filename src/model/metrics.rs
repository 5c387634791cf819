//! Derived metrics, computed on every read and never stored.

use serde::{Deserialize, Serialize};

use crate::config::DeliveryRules;
use crate::model::{Delivery, DeliveryStatus, Execution, GeoPoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    /// `None` until the delivery has arrived, or when no arrival was planned.
    pub on_time: Option<bool>,
    /// Delivered portions as a percentage of planned portions.
    pub fulfillment_pct: Option<f64>,
    pub over_delivered: bool,
    pub tracking_points: usize,
    pub current_location: Option<GeoPoint>,
}

impl DeliveryMetrics {
    pub fn compute(delivery: &Delivery, rules: &DeliveryRules) -> Self {
        let on_time = match (delivery.milestones.arrived_at, delivery.planned_arrival) {
            // A deadline past the end of the calendar cannot be missed.
            (Some(arrived), Some(planned)) => Some(
                planned
                    .checked_add_signed(rules.on_time_tolerance)
                    .map_or(true, |deadline| arrived <= deadline),
            ),
            _ => None,
        };
        let delivered = delivery.portions_delivered;

        Self {
            on_time,
            fulfillment_pct: delivered
                .and_then(|d| percentage(u64::from(d), u64::from(delivery.portions_planned))),
            over_delivered: delivered.is_some_and(|d| d > delivery.portions_planned),
            tracking_points: delivery.tracking.len(),
            current_location: delivery.current_location().map(|point| point.location),
        }
    }
}

/// Number of deliveries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub assigned: usize,
    pub departed: usize,
    pub delivered: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl DeliveryCounts {
    pub fn record(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Assigned => self.assigned += 1,
            DeliveryStatus::Departed => self.departed += 1,
            DeliveryStatus::Delivered => self.delivered += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Deliveries still in flight (ASSIGNED or DEPARTED).
    pub fn pending(&self) -> usize {
        self.assigned + self.departed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub open_issues: usize,
    pub deliveries: DeliveryCounts,
    pub portions_planned: u64,
    pub portions_delivered: u64,
    pub fulfillment_pct: Option<f64>,
    /// Share of arrived deliveries (with a planned arrival) that were on time, in percent.
    pub on_time_rate: Option<f64>,
}

impl ExecutionMetrics {
    pub fn compute(execution: &Execution, deliveries: &[Delivery], rules: &DeliveryRules) -> Self {
        let mut counts = DeliveryCounts::default();
        let mut judged = 0u64;
        let mut on_time = 0u64;
        for delivery in deliveries {
            counts.record(delivery.status);
            if let Some(flag) = DeliveryMetrics::compute(delivery, rules).on_time {
                judged += 1;
                on_time += u64::from(flag);
            }
        }
        let portions_delivered = sum_delivered(deliveries);

        Self {
            open_issues: execution.open_issues().count(),
            deliveries: counts,
            portions_planned: execution.total_portions_planned,
            portions_delivered,
            fulfillment_pct: percentage(portions_delivered, execution.total_portions_planned),
            on_time_rate: percentage(on_time, judged),
        }
    }
}

/// Reconciled total of delivered portions.
///
/// Summed in `u64`: per-delivery counts are `u32` and accepted over-deliveries may push the
/// total past `u32::MAX`.
pub fn sum_delivered(deliveries: &[Delivery]) -> u64 {
    deliveries
        .iter()
        .filter_map(|delivery| delivery.portions_delivered)
        .map(u64::from)
        .sum()
}

fn percentage(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 * 100.0 / whole as f64)
}

/// A delivery together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryView {
    pub delivery: Delivery,
    pub metrics: DeliveryMetrics,
}

/// An execution with its deliveries and derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionView {
    pub execution: Execution,
    pub deliveries: Vec<Delivery>,
    pub metrics: ExecutionMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{ActorEntity, Principal, TenantId};
    use crate::model::{DeliveryCreate, DeliveryId, ExecutionCreate, ExecutionId, ScheduleId};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn principal() -> Principal {
        Principal::new("coordinator", TenantId::new("kitchen-north"))
    }

    fn delivery(planned: u32, arrived: Option<i64>, delivered: Option<u32>) -> Delivery {
        let mut delivery = Delivery::from_create_params(
            DeliveryId::new(),
            &principal(),
            DeliveryCreate {
                execution_id: ExecutionId::new(),
                destination_ref: "school-1".to_string(),
                portions_planned: planned,
                planned_arrival: Some(t(30)),
            },
        )
        .unwrap();
        delivery.milestones.arrived_at = arrived.map(t);
        delivery.portions_delivered = delivered;
        delivery.status = match delivered {
            Some(d) if d >= planned => DeliveryStatus::Delivered,
            Some(_) => DeliveryStatus::Failed,
            None => DeliveryStatus::Departed,
        };
        delivery
    }

    #[test]
    fn test_on_time_uses_tolerance() {
        let rules = DeliveryRules::default();
        assert_eq!(
            DeliveryMetrics::compute(&delivery(50, Some(45), None), &rules).on_time,
            Some(true)
        );
        assert_eq!(
            DeliveryMetrics::compute(&delivery(50, Some(46), None), &rules).on_time,
            Some(false)
        );
        assert_eq!(DeliveryMetrics::compute(&delivery(50, None, None), &rules).on_time, None);
    }

    #[test]
    fn test_fulfillment_and_over_delivery() {
        let rules = DeliveryRules::default();
        let short = DeliveryMetrics::compute(&delivery(50, Some(20), Some(30)), &rules);
        assert_eq!(short.fulfillment_pct, Some(60.0));
        assert!(!short.over_delivered);

        let over = DeliveryMetrics::compute(&delivery(50, Some(20), Some(55)), &rules);
        assert!(over.over_delivered);
        assert_eq!(over.fulfillment_pct, Some(110.0));
    }

    #[test]
    fn test_tolerance_past_calendar_end_counts_as_on_time() {
        let rules = DeliveryRules {
            on_time_tolerance: Duration::try_minutes(100_000_000_000_000).unwrap(),
            ..DeliveryRules::default()
        };
        let metrics = DeliveryMetrics::compute(&delivery(50, Some(600), None), &rules);
        assert_eq!(metrics.on_time, Some(true));
    }

    #[test]
    fn test_reconciled_total_exceeds_u32() {
        let deliveries = vec![
            delivery(u32::MAX, Some(20), Some(u32::MAX)),
            delivery(10, Some(20), Some(u32::MAX)),
        ];
        assert_eq!(sum_delivered(&deliveries), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_execution_metrics_aggregate_deliveries() {
        let rules = DeliveryRules::default();
        let mut execution = Execution::from_create_params(
            ExecutionId::new(),
            &principal(),
            ExecutionCreate {
                schedule_id: ScheduleId::new(),
            },
        )
        .unwrap();
        execution.total_portions_planned = 100;
        let deliveries = vec![
            delivery(50, Some(20), Some(50)),
            delivery(40, Some(60), Some(30)),
            delivery(10, None, None),
        ];

        let metrics = ExecutionMetrics::compute(&execution, &deliveries, &rules);
        assert_eq!(metrics.deliveries.delivered, 1);
        assert_eq!(metrics.deliveries.failed, 1);
        assert_eq!(metrics.deliveries.pending(), 1);
        assert_eq!(metrics.portions_delivered, 80);
        assert_eq!(metrics.fulfillment_pct, Some(80.0));
        assert_eq!(metrics.on_time_rate, Some(50.0));
        assert_eq!(metrics.open_issues, 0);
    }
}
