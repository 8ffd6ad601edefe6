use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

/// Beaufort-style wind scale as reported by the provider.
///
/// Providers report either a single level (`"3"`) or a range (`"3-4"`).
/// Only the lower bound feeds the drying estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindScale {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl WindScale {
    pub fn single(level: u32) -> Self {
        Self {
            lower: level,
            upper: None,
        }
    }

    pub fn range(lower: u32, upper: u32) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }
}

impl Default for WindScale {
    fn default() -> Self {
        Self::single(0)
    }
}

impl fmt::Display for WindScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "{}-{}", self.lower, upper),
            None => write!(f, "{}", self.lower),
        }
    }
}

/// One normalized forecast hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    /// Start of the forecast hour, in the provider's UTC offset
    pub timestamp: DateTime<FixedOffset>,
    /// Relative humidity in percent (0-100)
    pub humidity: f64,
    /// Precipitation amount for the hour in millimetres
    pub precip_mm: f64,
    /// Probability of precipitation in percent (0-100)
    pub precip_probability: u32,
    pub condition_text: String,
    pub wind_direction: String,
    pub wind_scale: WindScale,
    /// Air temperature in °C
    pub temperature: f64,
    pub uv_index: Option<u32>,
    /// Hourly AQI, when the provider supplies one
    pub aqi: Option<u32>,
}

impl HourlyRecord {
    /// Calendar date of this hour in its own offset.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Hour of day (0-23) in its own offset.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Wind descriptor combining direction and raw scale, e.g. `"东北风3-4"`.
    pub fn wind_descriptor(&self) -> String {
        format!("{}{}", self.wind_direction, self.wind_scale)
    }
}

/// Provider drying index for one day (QWeather index type 13).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryingIndex {
    pub name: String,
    pub level: String,
    pub category: String,
    pub text: String,
}

/// Daily aggregates that complement the hourly feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Daily UV peak
    pub uv_index: Option<u32>,
    pub drying_index: Option<DryingIndex>,
}

impl DailySummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            uv_index: None,
            drying_index: None,
        }
    }
}

/// Daily air quality forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySample {
    pub date: NaiveDate,
    pub aqi: u32,
    pub level: String,
    pub category: String,
    pub primary_pollutant: Option<String>,
    pub pm2p5: Option<f64>,
    pub pm10: Option<f64>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn make_hour(direction: &str, scale: WindScale) -> HourlyRecord {
        HourlyRecord {
            timestamp: FixedOffset::east_opt(8 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 6, 15, 23, 0, 0)
                .unwrap(),
            humidity: 60.0,
            precip_mm: 0.0,
            precip_probability: 0,
            condition_text: "晴".to_string(),
            wind_direction: direction.to_string(),
            wind_scale: scale,
            temperature: 25.0,
            uv_index: None,
            aqi: None,
        }
    }

    #[test]
    fn test_wind_scale_display_single() {
        assert_eq!(WindScale::single(3).to_string(), "3");
    }

    #[test]
    fn test_wind_scale_display_range() {
        assert_eq!(WindScale::range(3, 4).to_string(), "3-4");
    }

    #[test]
    fn test_wind_scale_default_is_calm() {
        assert_eq!(WindScale::default(), WindScale::single(0));
    }

    #[test]
    fn test_wind_descriptor_combines_direction_and_scale() {
        let hour = make_hour("东北风", WindScale::range(1, 3));
        assert_eq!(hour.wind_descriptor(), "东北风1-3");
    }

    #[test]
    fn test_date_and_hour_use_record_offset() {
        // 23:00 at +08:00 is 15:00 UTC on the same day, but the local view matters
        let hour = make_hour("N", WindScale::single(2));
        assert_eq!(hour.date(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(hour.hour(), 23);
    }
}
