//! Validated evaluation thresholds.
//!
//! `SuitabilityThresholds` is built once from configuration and validated
//! before any evaluation. Evaluators trust it and never re-check it.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{EngineError, Result};

/// Condition texts that rule an hour out by default.
pub const DEFAULT_UNSUITABLE_CONDITIONS: &[&str] = &[
    "雨",
    "阵雨",
    "小雨",
    "中雨",
    "大雨",
    "暴雨",
    "雪",
    "阵雪",
    "小雪",
    "中雪",
    "大雪",
    "暴雪",
    "雾",
    "浓雾",
    "强浓雾",
    "轻雾",
    "大雾",
    "霾",
    "中度霾",
    "重度霾",
    "严重霾",
    "Rain",
    "Shower Rain",
    "Light Rain",
    "Moderate Rain",
    "Heavy Rain",
    "Storm",
    "Thunderstorm",
    "Snow",
    "Light Snow",
    "Moderate Snow",
    "Heavy Snow",
    "Snowstorm",
    "Fog",
    "Mist",
    "Haze",
];

/// Hourly precipitation intensity tiers in mm/h, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RainThresholds {
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
    pub storm: f64,
}

impl Default for RainThresholds {
    fn default() -> Self {
        Self {
            light: 0.1,
            moderate: 2.5,
            heavy: 8.0,
            storm: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityThresholds {
    /// Humidity (%) above which an hour is too damp
    pub max_suitable_humidity: f64,
    /// Suitable hours required for a positive verdict
    pub min_suitable_hours: u32,
    /// Highest tolerated precipitation probability (%)
    pub max_precip_probability: u32,
    pub max_aqi: u32,
    pub unsuitable_conditions: BTreeSet<String>,
    /// First hour of the drying window (inclusive)
    pub start_hour: u32,
    /// Last hour of the drying window (inclusive)
    pub end_hour: u32,
    pub rain: RainThresholds,
    pub commute_window_hours: u32,
    /// Look-ahead for the "next hours" rain outlook
    pub next_hours: u32,
}

impl Default for SuitabilityThresholds {
    fn default() -> Self {
        Self {
            max_suitable_humidity: 85.0,
            min_suitable_hours: 6,
            max_precip_probability: 0,
            max_aqi: 150,
            unsuitable_conditions: DEFAULT_UNSUITABLE_CONDITIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            start_hour: 6,
            end_hour: 22,
            rain: RainThresholds::default(),
            commute_window_hours: 3,
            next_hours: 6,
        }
    }
}

impl SuitabilityThresholds {
    /// Check every invariant the evaluators rely on.
    pub fn validate(&self) -> Result<()> {
        if self.start_hour > self.end_hour {
            return Err(EngineError::invalid_config(format!(
                "start_hour ({}) is after end_hour ({})",
                self.start_hour, self.end_hour
            )));
        }
        if self.end_hour > 23 {
            return Err(EngineError::invalid_config(format!(
                "end_hour ({}) must be at most 23",
                self.end_hour
            )));
        }
        if !(0.0..=100.0).contains(&self.max_suitable_humidity) {
            return Err(EngineError::invalid_config(format!(
                "max_suitable_humidity ({}) must be within 0-100",
                self.max_suitable_humidity
            )));
        }
        if self.max_precip_probability > 100 {
            return Err(EngineError::invalid_config(format!(
                "max_precip_probability ({}) must be within 0-100",
                self.max_precip_probability
            )));
        }
        if self.commute_window_hours == 0 || self.next_hours == 0 {
            return Err(EngineError::invalid_config(
                "commute_window_hours and next_hours must be at least 1",
            ));
        }

        let rain = &self.rain;
        let ascending = rain.light > 0.0
            && rain.light < rain.moderate
            && rain.moderate < rain.heavy
            && rain.heavy < rain.storm;
        if !ascending || !rain.storm.is_finite() {
            return Err(EngineError::invalid_config(format!(
                "rain thresholds must be positive and strictly ascending, got {}/{}/{}/{}",
                rain.light, rain.moderate, rain.heavy, rain.storm
            )));
        }

        Ok(())
    }

    /// Whether an hour of day falls inside the configured drying window.
    pub fn contains_hour(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }

    pub fn is_unsuitable_condition(&self, condition: &str) -> bool {
        self.unsuitable_conditions.contains(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SuitabilityThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_default_rain_thresholds_ascending() {
        let rain = RainThresholds::default();
        assert!(rain.light < rain.moderate);
        assert!(rain.moderate < rain.heavy);
        assert!(rain.heavy < rain.storm);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let thresholds = SuitabilityThresholds {
            start_hour: 20,
            end_hour: 8,
            ..Default::default()
        };
        let err = thresholds.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_end_hour_out_of_range_rejected() {
        let thresholds = SuitabilityThresholds {
            end_hour: 24,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_humidity_out_of_domain_rejected() {
        let thresholds = SuitabilityThresholds {
            max_suitable_humidity: 120.0,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_probability_out_of_domain_rejected() {
        let thresholds = SuitabilityThresholds {
            max_precip_probability: 101,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_zero_commute_window_rejected() {
        let thresholds = SuitabilityThresholds {
            commute_window_hours: 0,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_non_ascending_rain_thresholds_rejected() {
        let thresholds = SuitabilityThresholds {
            rain: RainThresholds {
                light: 0.1,
                moderate: 8.0,
                heavy: 8.0,
                storm: 16.0,
            },
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_zero_light_threshold_rejected() {
        let thresholds = SuitabilityThresholds {
            rain: RainThresholds {
                light: 0.0,
                ..RainThresholds::default()
            },
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_single_hour_window_is_valid() {
        let thresholds = SuitabilityThresholds {
            start_hour: 12,
            end_hour: 12,
            ..Default::default()
        };
        assert!(thresholds.validate().is_ok());
        assert!(thresholds.contains_hour(12));
        assert!(!thresholds.contains_hour(11));
        assert!(!thresholds.contains_hour(13));
    }

    #[test]
    fn test_contains_hour_is_inclusive() {
        let thresholds = SuitabilityThresholds::default();
        assert!(thresholds.contains_hour(6));
        assert!(thresholds.contains_hour(22));
        assert!(!thresholds.contains_hour(5));
        assert!(!thresholds.contains_hour(23));
    }

    #[test]
    fn test_unsuitable_condition_lookup_is_exact() {
        let thresholds = SuitabilityThresholds::default();
        assert!(thresholds.is_unsuitable_condition("小雨"));
        assert!(thresholds.is_unsuitable_condition("Light Rain"));
        assert!(!thresholds.is_unsuitable_condition("晴"));
        assert!(!thresholds.is_unsuitable_condition("light rain"));
    }
}
