//! Record normalization.
//!
//! Turns raw provider records into typed engine records. A malformed record
//! is logged and dropped; it never aborts the batch.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::{
    error::{EngineError, Result},
    models::{AirQualitySample, DailySummary, DryingIndex, HourlyRecord, WindScale},
    payload::{RawAirQuality, RawDaily, RawHour, RawIndex},
};

/// Life-index type id of the provider's drying index.
pub const DRYING_INDEX_TYPE: &str = "13";

/// Parse a provider timestamp.
///
/// Accepts the provider form without seconds (`2024-06-15T13:00+08:00`)
/// as well as full RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z")
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%z"))
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_err(|e| EngineError::malformed("timestamp", format!("'{}': {}", raw, e)))
}

pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| EngineError::malformed(field, format!("'{}': {}", raw, e)))
}

/// Parse a wind scale such as `"3"` or `"3-4"`.
pub fn parse_wind_scale(raw: &str) -> Result<WindScale> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| EngineError::malformed("wind_scale", format!("'{}' is not a level", raw)))
    };

    match raw.split_once('-') {
        Some((lower, upper)) => Ok(WindScale::range(parse(lower)?, parse(upper)?)),
        None => Ok(WindScale::single(parse(raw)?)),
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::malformed(field, "is missing"))
}

fn parse_f64(field: &'static str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| EngineError::malformed(field, format!("'{}' is not a number", raw)))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::malformed(field, format!("'{}' is not finite", raw)))
    }
}

/// Parse an integer that providers sometimes send as `"3.0"`.
fn parse_u32(field: &'static str, raw: &str) -> Result<u32> {
    let value = parse_f64(field, raw)?;
    if value < 0.0 || value > u32::MAX as f64 {
        return Err(EngineError::malformed(field, format!("'{}' is out of range", raw)));
    }
    Ok(value.round() as u32)
}

fn parse_percentage(field: &'static str, raw: &str) -> Result<f64> {
    let value = parse_f64(field, raw)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::malformed(field, format!("{} is outside 0-100", value)));
    }
    Ok(value)
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Convert one raw hour into a typed record.
///
/// Timestamp, humidity and precipitation are mandatory. The remaining
/// fields fall back to calm, dry defaults when absent.
pub fn normalize_hour(raw: &RawHour) -> Result<HourlyRecord> {
    let timestamp = parse_timestamp(required("timestamp", &raw.fx_time)?)?;
    let humidity = parse_percentage("humidity", required("humidity", &raw.humidity)?)?;

    let precip_mm = parse_f64("precipitation", required("precipitation", &raw.precip)?)?;
    if precip_mm < 0.0 {
        return Err(EngineError::malformed(
            "precipitation",
            format!("{} is negative", precip_mm),
        ));
    }

    let precip_probability = match optional_text(&raw.pop) {
        Some(pop) => parse_percentage("precipitation_probability", &pop)?.round() as u32,
        None => 0,
    };

    let wind_scale = match optional_text(&raw.wind_scale) {
        Some(scale) => parse_wind_scale(&scale)?,
        None => WindScale::default(),
    };

    let temperature = match optional_text(&raw.temp) {
        Some(temp) => parse_f64("temperature", &temp)?,
        None => 0.0,
    };

    let uv_index = optional_text(&raw.uv_index)
        .map(|uv| parse_u32("uv_index", &uv))
        .transpose()?;
    let aqi = optional_text(&raw.aqi)
        .map(|aqi| parse_u32("aqi", &aqi))
        .transpose()?;

    Ok(HourlyRecord {
        timestamp,
        humidity,
        precip_mm,
        precip_probability,
        condition_text: optional_text(&raw.text).unwrap_or_default(),
        wind_direction: optional_text(&raw.wind_dir).unwrap_or_default(),
        wind_scale,
        temperature,
        uv_index,
        aqi,
    })
}

/// Normalize a batch of raw hours, sorted chronologically.
///
/// Malformed hours are dropped with a warning. Duplicate timestamps keep the
/// first occurrence.
pub fn normalize_hours(raws: &[RawHour]) -> Vec<HourlyRecord> {
    let mut hours: Vec<HourlyRecord> = raws
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize_hour(raw) {
            Ok(hour) => Some(hour),
            Err(e) => {
                tracing::warn!("Dropping hourly record #{}: {}", index, e);
                None
            }
        })
        .collect();

    hours.sort_by_key(|h| h.timestamp);
    hours.dedup_by_key(|h| h.timestamp);

    let dropped = raws.len() - hours.len();
    if dropped > 0 {
        tracing::debug!("Normalized {} of {} hourly records", hours.len(), raws.len());
    }
    hours
}

/// Normalize daily records, attaching the drying index for matching dates.
pub fn normalize_daily(raws: &[RawDaily], indices: &[RawIndex]) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for raw in raws {
        let parsed = required("date", &raw.fx_date)
            .and_then(|date| parse_date("date", date))
            .and_then(|date| {
                let uv_index = optional_text(&raw.uv_index)
                    .map(|uv| parse_u32("uv_index", &uv))
                    .transpose()?;
                Ok((date, uv_index))
            });

        match parsed {
            Ok((date, uv_index)) => {
                days.entry(date)
                    .or_insert_with(|| DailySummary::new(date))
                    .uv_index = uv_index;
            }
            Err(e) => tracing::warn!("Dropping daily record: {}", e),
        }
    }

    for index in indices {
        if index.kind.as_deref() != Some(DRYING_INDEX_TYPE) {
            continue;
        }
        let date = match required("date", &index.date).and_then(|d| parse_date("date", d)) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!("Dropping drying index: {}", e);
                continue;
            }
        };

        days.entry(date)
            .or_insert_with(|| DailySummary::new(date))
            .drying_index = Some(DryingIndex {
            name: optional_text(&index.name).unwrap_or_else(|| "晾晒指数".to_string()),
            level: optional_text(&index.level).unwrap_or_default(),
            category: optional_text(&index.category).unwrap_or_default(),
            text: optional_text(&index.text).unwrap_or_default(),
        });
    }

    days.into_values().collect()
}

fn normalize_air_sample(raw: &RawAirQuality) -> Result<AirQualitySample> {
    let date = parse_date("date", required("date", &raw.fx_date)?)?;
    let aqi = parse_u32("aqi", required("aqi", &raw.aqi)?)?;

    // Providers send "NA" for a missing primary pollutant
    let primary_pollutant = optional_text(&raw.primary).filter(|p| p != "NA");

    Ok(AirQualitySample {
        date,
        aqi,
        level: optional_text(&raw.level).unwrap_or_default(),
        category: optional_text(&raw.category).unwrap_or_default(),
        primary_pollutant,
        pm2p5: optional_text(&raw.pm2p5)
            .map(|v| parse_f64("pm2p5", &v))
            .transpose()?,
        pm10: optional_text(&raw.pm10)
            .map(|v| parse_f64("pm10", &v))
            .transpose()?,
    })
}

/// Normalize air quality records, one sample per date.
pub fn normalize_air_quality(raws: &[RawAirQuality]) -> Vec<AirQualitySample> {
    let mut samples: BTreeMap<NaiveDate, AirQualitySample> = BTreeMap::new();

    for raw in raws {
        match normalize_air_sample(raw) {
            Ok(sample) => {
                samples.entry(sample.date).or_insert(sample);
            }
            Err(e) => tracing::warn!("Dropping air quality record: {}", e),
        }
    }

    samples.into_values().collect()
}

/// Group hours by the calendar date of their own timestamp.
///
/// Each bucket is sorted chronologically.
pub fn bucket_by_day(hours: &[HourlyRecord]) -> BTreeMap<NaiveDate, Vec<HourlyRecord>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<HourlyRecord>> = BTreeMap::new();
    for hour in hours {
        buckets.entry(hour.date()).or_default().push(hour.clone());
    }
    for day in buckets.values_mut() {
        day.sort_by_key(|h| h.timestamp);
    }
    buckets
}
