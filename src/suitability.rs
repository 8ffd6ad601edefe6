//! Per-day laundry suitability.
//!
//! One linear pass over the day's hours collects the drying statistics; the
//! verdict is then the conjunction of six clauses, each of which contributes
//! its own reason code when it fails.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use crate::{
    drying::estimate_drying_time,
    models::{AirQualitySample, DailySummary, DryingIndex, HourlyRecord},
    thresholds::SuitabilityThresholds,
    window::{DryingWindow, find_best_window},
};

/// Why a day was judged unsuitable.
///
/// Codes are appended in a fixed order so downstream formatters can rely on
/// it. Message rendering happens outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// No forecast hours were available for the day
    NoData,
    InsufficientSuitableHours {
        suitable_hours: u32,
        required_hours: u32,
    },
    /// Some hour has a non-zero precipitation amount
    Precipitation,
    HighHumidity {
        avg_humidity: f64,
        max_humidity: f64,
    },
    HighPrecipProbability {
        max_probability: u32,
        allowed: u32,
    },
    PoorAirQuality {
        aqi: u32,
        max_aqi: u32,
    },
    UnsuitableConditions {
        conditions: Vec<String>,
    },
}

impl ReasonCode {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::NoData => "NO_DATA",
            ReasonCode::InsufficientSuitableHours { .. } => "INSUFFICIENT_SUITABLE_HOURS",
            ReasonCode::Precipitation => "PRECIPITATION",
            ReasonCode::HighHumidity { .. } => "HIGH_HUMIDITY",
            ReasonCode::HighPrecipProbability { .. } => "HIGH_PRECIP_PROBABILITY",
            ReasonCode::PoorAirQuality { .. } => "POOR_AIR_QUALITY",
            ReasonCode::UnsuitableConditions { .. } => "UNSUITABLE_CONDITIONS",
        }
    }
}

/// Drying statistics for one evaluated day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DryingStats {
    /// Hours passing the hour-suitable predicate
    pub suitable_hours: u32,
    /// Hours evaluated
    pub total_hours: u32,
    pub avg_humidity: f64,
    /// Any hour with precipitation above zero
    pub has_precipitation: bool,
    pub max_precip_probability: u32,
    pub conditions: BTreeSet<String>,
    pub wind_conditions: BTreeSet<String>,
    pub estimated_drying_hours: Option<f64>,
    pub best_drying_window: Option<DryingWindow>,
    /// Hour the drying estimate was computed from
    pub best_drying_hour: Option<DateTime<FixedOffset>>,
    pub uv_index: Option<u32>,
    pub aqi: Option<u32>,
    pub aqi_level: Option<String>,
    pub aqi_category: Option<String>,
    pub primary_pollutant: Option<String>,
    pub pm2p5: Option<f64>,
    pub pm10: Option<f64>,
    pub drying_index: Option<DryingIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityResult {
    pub is_suitable: bool,
    pub reasons: Vec<ReasonCode>,
    pub stats: DryingStats,
    /// The unfiltered day was evaluated because the window had passed
    pub used_fallback: bool,
}

impl SuitabilityResult {
    fn no_data(used_fallback: bool) -> Self {
        Self {
            is_suitable: false,
            reasons: vec![ReasonCode::NoData],
            stats: DryingStats::default(),
            used_fallback,
        }
    }
}

/// The hour-suitable predicate.
///
/// Shared by the day statistics and the window search so both agree on what
/// a good hour is.
pub fn is_hour_suitable(hour: &HourlyRecord, thresholds: &SuitabilityThresholds) -> bool {
    hour.humidity <= thresholds.max_suitable_humidity
        && hour.precip_mm == 0.0
        && !thresholds.is_unsuitable_condition(&hour.condition_text)
        && hour.precip_probability <= thresholds.max_precip_probability
}

/// Whether today's drying window is already over at `now`.
///
/// Only today qualifies; `now` is viewed in the day's own offset.
fn window_elapsed(
    hours: &[HourlyRecord],
    thresholds: &SuitabilityThresholds,
    now: DateTime<FixedOffset>,
) -> bool {
    hours.first().is_some_and(|first| {
        let local_now = now.with_timezone(first.timestamp.offset());
        first.date() == local_now.date_naive() && local_now.hour() > thresholds.end_hour
    })
}

/// Pick the hours to evaluate: the configured window, or the whole day when
/// fallback applies.
fn select_hours(
    hours: &[HourlyRecord],
    thresholds: &SuitabilityThresholds,
    now: DateTime<FixedOffset>,
    allow_fallback: bool,
) -> (Vec<HourlyRecord>, bool) {
    let use_fallback = allow_fallback && window_elapsed(hours, thresholds, now);

    let mut selected: Vec<HourlyRecord> = hours
        .iter()
        .filter(|h| use_fallback || thresholds.contains_hour(h.hour()))
        .cloned()
        .collect();
    selected.sort_by_key(|h| h.timestamp);
    // Window scan needs strictly increasing timestamps; keep the first copy
    selected.dedup_by_key(|h| h.timestamp);

    (selected, use_fallback)
}

/// Evaluate one calendar day.
///
/// `hours` holds every forecast hour of the day. Never fails: an empty day
/// yields a `NoData` verdict.
pub fn evaluate_day(
    hours: &[HourlyRecord],
    daily: Option<&DailySummary>,
    air_quality: Option<&AirQualitySample>,
    thresholds: &SuitabilityThresholds,
    now: DateTime<FixedOffset>,
    allow_fallback: bool,
) -> SuitabilityResult {
    let (hours, used_fallback) = select_hours(hours, thresholds, now, allow_fallback);
    if hours.is_empty() {
        return SuitabilityResult::no_data(used_fallback);
    }

    let daily_uv = daily.and_then(|d| d.uv_index);

    let mut stats = DryingStats::default();
    let mut humidity_sum = 0.0;
    let mut max_hourly_aqi: Option<u32> = None;

    for hour in &hours {
        humidity_sum += hour.humidity;
        stats.total_hours += 1;
        stats.max_precip_probability = stats.max_precip_probability.max(hour.precip_probability);
        stats.conditions.insert(hour.condition_text.clone());
        stats.wind_conditions.insert(hour.wind_descriptor());

        if hour.precip_mm > 0.0 {
            stats.has_precipitation = true;
        }
        if let Some(uv) = hour.uv_index.or(daily_uv) {
            stats.uv_index = Some(stats.uv_index.map_or(uv, |max| max.max(uv)));
        }
        if let Some(aqi) = hour.aqi {
            max_hourly_aqi = Some(max_hourly_aqi.map_or(aqi, |max| max.max(aqi)));
        }
        if is_hour_suitable(hour, thresholds) {
            stats.suitable_hours += 1;
        }
    }

    stats.avg_humidity = humidity_sum / stats.total_hours as f64;

    let window = find_best_window(&hours, |h| is_hour_suitable(h, thresholds), thresholds.end_hour);

    // Estimate from the driest hour of the window, or of the whole day
    // when no window exists
    let representative = hours
        .iter()
        .filter(|h| window.is_none_or(|w| w.contains(h.timestamp)))
        .min_by(|a, b| a.humidity.total_cmp(&b.humidity));
    if let Some(rep) = representative {
        let mut rep = rep.clone();
        rep.uv_index = rep.uv_index.or(daily_uv);
        stats.estimated_drying_hours = Some(estimate_drying_time(&rep));
        stats.best_drying_hour = Some(rep.timestamp);
    }
    stats.best_drying_window = window;

    match air_quality {
        Some(sample) => {
            stats.aqi = Some(sample.aqi);
            stats.aqi_level = Some(sample.level.clone());
            stats.aqi_category = Some(sample.category.clone());
            stats.primary_pollutant = sample.primary_pollutant.clone();
            stats.pm2p5 = sample.pm2p5;
            stats.pm10 = sample.pm10;
        }
        None => stats.aqi = max_hourly_aqi,
    }
    stats.drying_index = daily.and_then(|d| d.drying_index.clone());

    let reasons = collect_reasons(&stats, thresholds);

    tracing::debug!(
        "Evaluated {} hours: {} suitable, avg humidity {:.1}%, {} reasons",
        stats.total_hours,
        stats.suitable_hours,
        stats.avg_humidity,
        reasons.len()
    );

    SuitabilityResult {
        is_suitable: reasons.is_empty(),
        reasons,
        stats,
        used_fallback,
    }
}

/// Check every clause and return the failures in their fixed order.
fn collect_reasons(stats: &DryingStats, thresholds: &SuitabilityThresholds) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();

    if stats.suitable_hours < thresholds.min_suitable_hours {
        reasons.push(ReasonCode::InsufficientSuitableHours {
            suitable_hours: stats.suitable_hours,
            required_hours: thresholds.min_suitable_hours,
        });
    }

    if stats.has_precipitation {
        reasons.push(ReasonCode::Precipitation);
    }

    if stats.avg_humidity > thresholds.max_suitable_humidity {
        reasons.push(ReasonCode::HighHumidity {
            avg_humidity: stats.avg_humidity,
            max_humidity: thresholds.max_suitable_humidity,
        });
    }

    if stats.max_precip_probability > thresholds.max_precip_probability {
        reasons.push(ReasonCode::HighPrecipProbability {
            max_probability: stats.max_precip_probability,
            allowed: thresholds.max_precip_probability,
        });
    }

    if let Some(aqi) = stats.aqi {
        if aqi > thresholds.max_aqi {
            reasons.push(ReasonCode::PoorAirQuality {
                aqi,
                max_aqi: thresholds.max_aqi,
            });
        }
    }

    let bad_conditions: Vec<String> = stats
        .conditions
        .iter()
        .filter(|c| thresholds.is_unsuitable_condition(c))
        .cloned()
        .collect();
    if !bad_conditions.is_empty() {
        reasons.push(ReasonCode::UnsuitableConditions {
            conditions: bad_conditions,
        });
    }

    reasons
}
