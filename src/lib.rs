//! Laundry Checker Library
//!
//! Decides whether forecast weather suits drying laundry outdoors: per-day
//! verdicts with reason codes, drying statistics, best drying windows and
//! precipitation outlooks. The engine is pure; payload reading and output
//! live at the edges.

pub mod config;
pub mod drying;
pub mod error;
pub mod models;
pub mod normalize;
pub mod payload;
pub mod rain;
pub mod report;
pub mod suitability;
pub mod thresholds;
pub mod traits;
pub mod window;

// Re-export commonly used types
pub use config::AppConfig;
pub use drying::estimate_drying_time;
pub use error::{EngineError, Result};
pub use models::{AirQualitySample, DailySummary, DryingIndex, HourlyRecord, WindScale};
pub use normalize::{bucket_by_day, normalize_hour, normalize_hours};
pub use payload::ForecastPayload;
pub use rain::{RainLevel, RainWindowMetrics, WindowSpec, aggregate_rain};
pub use report::{
    DayReport, ForecastInput, ForecastReport, RainOutlook, ReportOptions, build_report, write_csv,
};
pub use suitability::{DryingStats, ReasonCode, SuitabilityResult, evaluate_day, is_hour_suitable};
pub use thresholds::{RainThresholds, SuitabilityThresholds};
pub use traits::{Clock, MockClock, SystemClock};
pub use window::{DryingWindow, find_best_window};
