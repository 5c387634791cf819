//! Engine configuration.
//!
//! Defaults are usable as-is; [`EngineConfig::from_env`] overrides them from
//! `DISTRIBUTION_*` environment variables.

use chrono::Duration;
use std::env;
use thiserror::Error;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
pub const DEFAULT_ON_TIME_TOLERANCE_MINUTES: i64 = 15;

/// What to do when a delivery reports more portions than were planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverDeliveryPolicy {
    /// Refuse the completion with a validation error.
    #[default]
    Reject,
    /// Complete as DELIVERED and flag the delivery as over-delivered.
    Accept,
}

/// Rules injected into the Delivery actor as its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRules {
    pub over_delivery: OverDeliveryPolicy,
    /// How late an arrival may be and still count as on time.
    pub on_time_tolerance: Duration,
}

impl Default for DeliveryRules {
    fn default() -> Self {
        Self {
            over_delivery: OverDeliveryPolicy::default(),
            on_time_tolerance: Duration::minutes(DEFAULT_ON_TIME_TOLERANCE_MINUTES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Request buffer of each actor's channel.
    pub channel_capacity: usize,
    pub delivery: DeliveryRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            delivery: DeliveryRules::default(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl EngineConfig {
    /// Reads overrides from the process environment. Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("DISTRIBUTION_CHANNEL_CAPACITY") {
            config.channel_capacity = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "DISTRIBUTION_CHANNEL_CAPACITY",
                    value,
                })?;
        }

        if let Some(value) = lookup("DISTRIBUTION_OVER_DELIVERY") {
            let policy = value.trim().to_ascii_lowercase();
            config.delivery.over_delivery = match policy.as_str() {
                "reject" => OverDeliveryPolicy::Reject,
                "accept" => OverDeliveryPolicy::Accept,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DISTRIBUTION_OVER_DELIVERY",
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup("DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES") {
            config.delivery.on_time_tolerance = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes >= 0)
                .and_then(Duration::try_minutes)
                .ok_or(ConfigError::InvalidValue {
                    key: "DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES",
                    value,
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.channel_capacity, 32);
        assert_eq!(config.delivery.over_delivery, OverDeliveryPolicy::Reject);
        assert_eq!(config.delivery.on_time_tolerance, Duration::minutes(15));
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("DISTRIBUTION_CHANNEL_CAPACITY", "8"),
            ("DISTRIBUTION_OVER_DELIVERY", "Accept"),
            ("DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.delivery.over_delivery, OverDeliveryPolicy::Accept);
        assert_eq!(config.delivery.on_time_tolerance, Duration::minutes(5));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[("DISTRIBUTION_CHANNEL_CAPACITY", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "DISTRIBUTION_CHANNEL_CAPACITY", .. }
        ));

        let err = EngineConfig::from_lookup(lookup(&[("DISTRIBUTION_OVER_DELIVERY", "maybe")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "DISTRIBUTION_OVER_DELIVERY",
                value: "maybe".to_string()
            }
        );
    }

    #[test]
    fn test_tolerance_outside_duration_range_is_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(
            "DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES",
            "999999999999999",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES",
                value: "999999999999999".to_string()
            }
        );

        let err = EngineConfig::from_lookup(lookup(&[(
            "DISTRIBUTION_ON_TIME_TOLERANCE_MINUTES",
            "-5",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
