use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{
    error::EngineError,
    report::ReportOptions,
    thresholds::{DEFAULT_UNSUITABLE_CONDITIONS, RainThresholds, SuitabilityThresholds},
};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub thresholds: ThresholdsConfig,
    pub schedule: ScheduleConfig,
    pub rain: RainConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    pub max_suitable_humidity: f64,
    pub min_suitable_hours: u32,
    pub max_precip_probability: u32,
    pub max_aqi: u32,
    pub unsuitable_conditions: Vec<String>,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            max_suitable_humidity: 85.0,
            min_suitable_hours: 6,
            max_precip_probability: 0,
            max_aqi: 150,
            unsuitable_conditions: default_conditions(),
        }
    }
}

/// Hours of the day (inclusive) during which laundry may hang outside.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ScheduleConfig {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 22,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RainConfig {
    /// mm/h
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
    pub storm: f64,
    pub commute_window_hours: u32,
    pub next_hours: u32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            light: 0.1,
            moderate: 2.5,
            heavy: 8.0,
            storm: 16.0,
            commute_window_hours: 3,
            next_hours: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReportConfig {
    pub forecast_days: u32,
    pub allow_fallback: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            forecast_days: 3,
            allow_fallback: false,
        }
    }
}

fn default_conditions() -> Vec<String> {
    DEFAULT_UNSUITABLE_CONDITIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_file(None)
    }

    /// Load configuration, layering `extra` (if given) above the default
    /// config files and below environment variables.
    pub fn load_with_file(extra: Option<&Path>) -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("laundry-checker");

        let mut builder = Config::builder()
            // 1. Load default values
            // Thresholds
            .set_default("thresholds.max_suitable_humidity", 85.0)?
            .set_default("thresholds.min_suitable_hours", 6)?
            .set_default("thresholds.max_precip_probability", 0)?
            .set_default("thresholds.max_aqi", 150)?
            .set_default("thresholds.unsuitable_conditions", default_conditions())?
            // Schedule
            .set_default("schedule.start_hour", 6)?
            .set_default("schedule.end_hour", 22)?
            // Rain
            .set_default("rain.light", 0.1)?
            .set_default("rain.moderate", 2.5)?
            .set_default("rain.heavy", 8.0)?
            .set_default("rain.storm", 16.0)?
            .set_default("rain.commute_window_hours", 3)?
            .set_default("rain.next_hours", 6)?
            // Report
            .set_default("report.forecast_days", 3)?
            .set_default("report.allow_fallback", false)?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false));

        // 4. Explicit file from the command line (must exist)
        if let Some(path) = extra {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // 5. Environment variables (LAUNDRY__RAIN__COMMUTE_WINDOW_HOURS=...)
        let builder = builder.add_source(
            Environment::with_prefix("LAUNDRY")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("thresholds.unsuitable_conditions"),
        );

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }

    /// Validated thresholds for the engine.
    pub fn thresholds(&self) -> std::result::Result<SuitabilityThresholds, EngineError> {
        let thresholds = SuitabilityThresholds {
            max_suitable_humidity: self.thresholds.max_suitable_humidity,
            min_suitable_hours: self.thresholds.min_suitable_hours,
            max_precip_probability: self.thresholds.max_precip_probability,
            max_aqi: self.thresholds.max_aqi,
            unsuitable_conditions: self.thresholds.unsuitable_conditions.iter().cloned().collect(),
            start_hour: self.schedule.start_hour,
            end_hour: self.schedule.end_hour,
            rain: RainThresholds {
                light: self.rain.light,
                moderate: self.rain.moderate,
                heavy: self.rain.heavy,
                storm: self.rain.storm,
            },
            commute_window_hours: self.rain.commute_window_hours,
            next_hours: self.rain.next_hours,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            allow_fallback: self.report.allow_fallback,
            forecast_days: self.report.forecast_days,
        }
    }
}
