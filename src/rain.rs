//! Precipitation risk over a subset of hours.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::{
    models::HourlyRecord,
    thresholds::{RainThresholds, SuitabilityThresholds},
};

/// Intensity tier of the heaviest hour in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RainLevel {
    #[default]
    None,
    Light,
    Moderate,
    Heavy,
    Storm,
}

impl RainLevel {
    /// Classify a peak hourly amount. A value equal to a tier's threshold
    /// belongs to that tier.
    pub fn classify(peak_mm: f64, thresholds: &RainThresholds) -> Self {
        if peak_mm >= thresholds.storm {
            RainLevel::Storm
        } else if peak_mm >= thresholds.heavy {
            RainLevel::Heavy
        } else if peak_mm >= thresholds.moderate {
            RainLevel::Moderate
        } else if peak_mm >= thresholds.light {
            RainLevel::Light
        } else {
            RainLevel::None
        }
    }
}

/// Which hours a rain outlook covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    /// The next `n` hours that have not finished yet
    NextHours(u32),
    /// The next `commute_window_hours` hours
    Commute,
    /// Every hour of one calendar date
    Day(NaiveDate),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RainWindowMetrics {
    pub will_rain: bool,
    pub rain_level: RainLevel,
    /// Hours at or above the light-rain threshold
    pub rain_hour_count: u32,
    pub total_precip_mm: f64,
    pub max_hourly_precip_mm: f64,
    pub max_precip_probability: u32,
    pub hours_considered: u32,
}

/// Hours that have not finished before `now`, soonest first, at most `n`.
fn upcoming_hours(
    hours: &[HourlyRecord],
    now: DateTime<FixedOffset>,
    n: u32,
) -> Vec<&HourlyRecord> {
    let mut upcoming: Vec<&HourlyRecord> = hours
        .iter()
        .filter(|h| h.timestamp + ChronoDuration::hours(1) > now)
        .collect();
    upcoming.sort_by_key(|h| h.timestamp);
    upcoming.truncate(n as usize);
    upcoming
}

/// Aggregate precipitation risk over the hours selected by `spec`.
///
/// `Day` windows take the date of each hour's own timestamp and ignore
/// `now`. An empty selection yields all-zero metrics.
pub fn aggregate_rain(
    hours: &[HourlyRecord],
    now: DateTime<FixedOffset>,
    spec: WindowSpec,
    thresholds: &SuitabilityThresholds,
) -> RainWindowMetrics {
    let selected: Vec<&HourlyRecord> = match spec {
        WindowSpec::NextHours(n) => upcoming_hours(hours, now, n),
        WindowSpec::Commute => upcoming_hours(hours, now, thresholds.commute_window_hours),
        WindowSpec::Day(date) => hours.iter().filter(|h| h.date() == date).collect(),
    };

    summarize(&selected, &thresholds.rain)
}

fn summarize(hours: &[&HourlyRecord], thresholds: &RainThresholds) -> RainWindowMetrics {
    let mut metrics = RainWindowMetrics::default();

    for hour in hours {
        metrics.hours_considered += 1;
        metrics.total_precip_mm += hour.precip_mm;
        metrics.max_hourly_precip_mm = metrics.max_hourly_precip_mm.max(hour.precip_mm);
        metrics.max_precip_probability = metrics.max_precip_probability.max(hour.precip_probability);
        if hour.precip_mm >= thresholds.light {
            metrics.rain_hour_count += 1;
        }
    }

    metrics.will_rain = metrics.rain_hour_count > 0;
    metrics.rain_level = RainLevel::classify(metrics.max_hourly_precip_mm, thresholds);
    metrics
}
