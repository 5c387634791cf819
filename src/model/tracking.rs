//! # Tracking Log
//!
//! Append-only store of GPS samples for one delivery. The log exposes no way to edit or remove
//! a point; a correction is simply a newer point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geolocation sample as reported by a field device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the device reports one.
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Checks coordinate ranges. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        match self.accuracy {
            Some(accuracy) if accuracy.is_nan() || accuracy < 0.0 => {
                Err(format!("accuracy {accuracy} must be non-negative"))
            }
            _ => Ok(()),
        }
    }
}

/// Marker used for route reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingLabel {
    Departed,
    Arrived,
    Waypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPoint {
    pub location: GeoPoint,
    pub label: TrackingLabel,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingLog {
    points: Vec<TrackingPoint>,
}

impl TrackingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample and returns the new length of the log.
    pub fn append(
        &mut self,
        location: GeoPoint,
        label: TrackingLabel,
        recorded_at: DateTime<Utc>,
    ) -> usize {
        self.points.push(TrackingPoint {
            location,
            label,
            recorded_at,
        });
        self.points.len()
    }

    /// Points in append order.
    pub fn points(&self) -> &[TrackingPoint] {
        &self.points
    }

    /// Latest known position: the sample with the newest device timestamp.
    /// Ties go to the point appended last.
    pub fn latest(&self) -> Option<&TrackingPoint> {
        self.points
            .iter()
            .enumerate()
            .max_by_key(|(index, point)| (point.recorded_at, *index))
            .map(|(_, point)| point)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap()
    }

    #[test]
    fn test_latest_uses_device_time_not_arrival_order() {
        let mut log = TrackingLog::new();
        log.append(GeoPoint::new(1.0, 1.0), TrackingLabel::Departed, at(0));
        log.append(GeoPoint::new(3.0, 3.0), TrackingLabel::Waypoint, at(20));
        // Late submission from a flaky connection.
        log.append(GeoPoint::new(2.0, 2.0), TrackingLabel::Waypoint, at(10));

        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().unwrap().location, GeoPoint::new(3.0, 3.0));
        assert_eq!(log.points()[2].location, GeoPoint::new(2.0, 2.0));
    }

    #[test]
    fn test_latest_tie_goes_to_last_appended() {
        let mut log = TrackingLog::new();
        log.append(GeoPoint::new(1.0, 1.0), TrackingLabel::Waypoint, at(5));
        log.append(GeoPoint::new(1.5, 1.5), TrackingLabel::Waypoint, at(5));
        assert_eq!(log.latest().unwrap().location, GeoPoint::new(1.5, 1.5));
        assert!(TrackingLog::new().latest().is_none());
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(-6.2, 106.8).with_accuracy(5.0).validate().is_ok());
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, -181.0).validate().is_err());
        assert!(GeoPoint::new(0.0, 0.0).with_accuracy(-1.0).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
    }
}
