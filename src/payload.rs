//! Raw provider payload.
//!
//! Mirrors the QWeather v7 JSON shape: every value arrives as a string (some
//! mirrors send numbers instead), and any field may be missing. Nothing here
//! is validated; see [`crate::normalize`] for that.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::{normalize, report::ForecastInput};

/// A scalar that may have been sent as a string, number, or bool.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<LooseScalar> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        LooseScalar::Str(s) => s,
        LooseScalar::Int(i) => i.to_string(),
        LooseScalar::Float(f) => f.to_string(),
        LooseScalar::Bool(b) => b.to_string(),
    }))
}

/// One hour of the hourly forecast feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHour {
    #[serde(default, deserialize_with = "loose_string")]
    pub fx_time: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub temp: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub wind_dir: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub wind_scale: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub humidity: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub pop: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub precip: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub uv_index: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub aqi: Option<String>,
}

/// One day of the daily forecast feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDaily {
    #[serde(default, deserialize_with = "loose_string")]
    pub fx_date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub uv_index: Option<String>,
}

/// One day of the air quality forecast feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAirQuality {
    #[serde(default, deserialize_with = "loose_string")]
    pub fx_date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub aqi: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub primary: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub pm2p5: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub pm10: Option<String>,
}

/// One entry of the daily life-index feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIndex {
    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "loose_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub text: Option<String>,
}

/// Combined payload handed over by the data-acquisition side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    /// Provider status code; `"200"` means success
    #[serde(default, deserialize_with = "loose_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub hourly: Vec<RawHour>,
    #[serde(default)]
    pub daily: Vec<RawDaily>,
    #[serde(default)]
    pub air: Vec<RawAirQuality>,
    #[serde(default)]
    pub indices: Vec<RawIndex>,
}

impl ForecastPayload {
    /// Parse a payload from JSON text, rejecting provider error responses.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let payload: Self =
            serde_json::from_str(json).context("Failed to parse forecast payload JSON")?;

        if let Some(code) = payload.code.as_deref() {
            if code != "200" {
                anyhow::bail!("Provider returned error code: {}", code);
            }
        }

        Ok(payload)
    }

    /// Read and parse a payload file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read forecast payload {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Normalize every feed, dropping malformed records.
    pub fn to_input(&self) -> ForecastInput {
        ForecastInput {
            hourly: normalize::normalize_hours(&self.hourly),
            daily: normalize::normalize_daily(&self.daily, &self.indices),
            air_quality: normalize::normalize_air_quality(&self.air),
        }
    }
}
