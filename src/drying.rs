//! Drying time heuristic.
//!
//! A multiplicative model over one representative hour. Each factor is
//! linear and unclamped; the product is not a physical simulation.

use crate::models::HourlyRecord;

/// Drying time in hours under reference conditions.
pub const BASE_DRYING_HOURS: f64 = 6.0;

const SUNNY_MARKERS: &[&str] = &["晴", "sunny", "clear"];
const CLOUDY_MARKERS: &[&str] = &["多云", "cloudy"];

/// 40% humidity gives 0.8, every further percent adds 0.01.
pub fn humidity_factor(humidity: f64) -> f64 {
    0.8 + (humidity - 40.0) / 100.0
}

/// Stronger wind dries faster: 1.2 at calm, minus 0.05 per level.
pub fn wind_factor(wind_scale_lower: u32) -> f64 {
    1.2 - 0.05 * wind_scale_lower as f64
}

/// 0.8 for clear skies, 1.0 for clouds, 1.2 for anything else.
///
/// Clear markers win over cloud markers, so "晴间多云" counts as clear.
pub fn condition_factor(condition_text: &str) -> f64 {
    let lowered = condition_text.to_lowercase();
    if SUNNY_MARKERS.iter().any(|m| lowered.contains(m)) {
        0.8
    } else if CLOUDY_MARKERS.iter().any(|m| lowered.contains(m)) {
        1.0
    } else {
        1.2
    }
}

pub fn temperature_factor(temperature: f64) -> f64 {
    1.2 - temperature / 100.0
}

/// Neutral without UV data, otherwise 1.2 minus 0.04 per level (capped at 10).
pub fn uv_factor(uv_index: Option<u32>) -> f64 {
    match uv_index {
        None | Some(0) => 1.0,
        Some(uv) => 1.2 - 0.04 * uv.min(10) as f64,
    }
}

/// Estimate hours until laundry dries, rounded to one decimal.
pub fn estimate_drying_time(hour: &HourlyRecord) -> f64 {
    let total = BASE_DRYING_HOURS
        * humidity_factor(hour.humidity)
        * wind_factor(hour.wind_scale.lower)
        * condition_factor(&hour.condition_text)
        * temperature_factor(hour.temperature)
        * uv_factor(hour.uv_index);

    round_one_decimal(total)
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
