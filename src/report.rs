//! Full forecast report: today, tomorrow, further days and rain outlooks.

use std::io::Write;

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::{
    error::{EngineError, Result},
    models::{AirQualitySample, DailySummary, HourlyRecord},
    normalize::bucket_by_day,
    rain::{RainWindowMetrics, WindowSpec, aggregate_rain},
    suitability::{SuitabilityResult, evaluate_day},
    thresholds::SuitabilityThresholds,
};

/// Normalized forecast data for one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastInput {
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailySummary>,
    pub air_quality: Vec<AirQualitySample>,
}

impl ForecastInput {
    fn daily_for(&self, date: NaiveDate) -> Option<&DailySummary> {
        self.daily.iter().find(|d| d.date == date)
    }

    fn air_quality_for(&self, date: NaiveDate) -> Option<&AirQualitySample> {
        self.air_quality.iter().find(|a| a.date == date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Evaluate today's full day once the drying window has passed
    pub allow_fallback: bool,
    /// How many days after today the report may cover
    pub forecast_days: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            allow_fallback: false,
            forecast_days: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub result: SuitabilityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainOutlook {
    pub next_hours: RainWindowMetrics,
    pub commute: RainWindowMetrics,
    pub tomorrow: RainWindowMetrics,
    pub day_after_tomorrow: RainWindowMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub generated_at: DateTime<FixedOffset>,
    pub today: DayReport,
    pub tomorrow: DayReport,
    /// Days after tomorrow with hourly data, in date order
    pub future_days: Vec<DayReport>,
    pub rain: RainOutlook,
}

impl ForecastReport {
    /// Every evaluated day in date order.
    pub fn days(&self) -> impl Iterator<Item = &DayReport> {
        [&self.today, &self.tomorrow]
            .into_iter()
            .chain(self.future_days.iter())
    }
}

/// Evaluate the whole forecast relative to `now`.
///
/// "Today" is `now`'s date in the feed's own offset. Fails when the
/// thresholds are invalid or when no hourly record falls on today.
pub fn build_report(
    input: &ForecastInput,
    thresholds: &SuitabilityThresholds,
    now: DateTime<FixedOffset>,
    options: ReportOptions,
) -> Result<ForecastReport> {
    thresholds.validate()?;

    let feed_offset = input
        .hourly
        .first()
        .map_or(*now.offset(), |h| *h.timestamp.offset());
    let today = now.with_timezone(&feed_offset).date_naive();
    let tomorrow = today + ChronoDuration::days(1);
    let day_after_tomorrow = today + ChronoDuration::days(2);
    let last_day = today + ChronoDuration::days(i64::from(options.forecast_days));

    let buckets = bucket_by_day(&input.hourly);
    let today_hours = buckets
        .get(&today)
        .ok_or(EngineError::MissingHourlyFeed { date: today })?;

    let evaluate = |date: NaiveDate, hours: &[HourlyRecord], allow_fallback: bool| DayReport {
        date,
        result: evaluate_day(
            hours,
            input.daily_for(date),
            input.air_quality_for(date),
            thresholds,
            now,
            allow_fallback,
        ),
    };

    let today_report = evaluate(today, today_hours.as_slice(), options.allow_fallback);
    let tomorrow_report = evaluate(
        tomorrow,
        buckets.get(&tomorrow).map(Vec::as_slice).unwrap_or_default(),
        false,
    );
    // A horizon of 0 or 1 days leaves no room after tomorrow
    let future_days: Vec<DayReport> = if last_day < day_after_tomorrow {
        Vec::new()
    } else {
        buckets
            .range(day_after_tomorrow..=last_day)
            .map(|(date, hours)| evaluate(*date, hours.as_slice(), false))
            .collect()
    };

    let rain = RainOutlook {
        next_hours: aggregate_rain(
            &input.hourly,
            now,
            WindowSpec::NextHours(thresholds.next_hours),
            thresholds,
        ),
        commute: aggregate_rain(&input.hourly, now, WindowSpec::Commute, thresholds),
        tomorrow: aggregate_rain(&input.hourly, now, WindowSpec::Day(tomorrow), thresholds),
        day_after_tomorrow: aggregate_rain(
            &input.hourly,
            now,
            WindowSpec::Day(day_after_tomorrow),
            thresholds,
        ),
    };

    tracing::info!(
        "Report for {}: today suitable={}, tomorrow suitable={}, {} further days, rain next {}h: {:?}",
        today,
        today_report.result.is_suitable,
        tomorrow_report.result.is_suitable,
        future_days.len(),
        thresholds.next_hours,
        rain.next_hours.rain_level
    );

    Ok(ForecastReport {
        generated_at: now,
        today: today_report,
        tomorrow: tomorrow_report,
        future_days,
        rain,
    })
}

/// Flat per-day row for CSV output.
#[derive(Debug, Serialize)]
struct DayRow<'a> {
    date: NaiveDate,
    is_suitable: bool,
    reasons: String,
    suitable_hours: u32,
    total_hours: u32,
    avg_humidity: f64,
    max_precip_probability: u32,
    estimated_drying_hours: Option<f64>,
    window_start: Option<DateTime<FixedOffset>>,
    window_end: Option<DateTime<FixedOffset>>,
    uv_index: Option<u32>,
    aqi: Option<u32>,
    drying_index: Option<&'a str>,
    used_fallback: bool,
}

impl<'a> From<&'a DayReport> for DayRow<'a> {
    fn from(day: &'a DayReport) -> Self {
        let stats = &day.result.stats;
        let reasons: Vec<&str> = day.result.reasons.iter().map(|r| r.code()).collect();

        Self {
            date: day.date,
            is_suitable: day.result.is_suitable,
            reasons: reasons.join(";"),
            suitable_hours: stats.suitable_hours,
            total_hours: stats.total_hours,
            avg_humidity: crate::drying::round_one_decimal(stats.avg_humidity),
            max_precip_probability: stats.max_precip_probability,
            estimated_drying_hours: stats.estimated_drying_hours,
            window_start: stats.best_drying_window.map(|w| w.start),
            window_end: stats.best_drying_window.map(|w| w.end),
            uv_index: stats.uv_index,
            aqi: stats.aqi,
            drying_index: stats.drying_index.as_ref().map(|i| i.category.as_str()),
            used_fallback: day.result.used_fallback,
        }
    }
}

/// Write one CSV row per evaluated day.
pub fn write_csv<W: Write>(report: &ForecastReport, writer: W) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut wtr = csv::Writer::from_writer(writer);

    for day in report.days() {
        wtr.serialize(DayRow::from(day))
            .with_context(|| format!("Failed to serialize report row for {}", day.date))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{models::WindScale, rain::RainLevel, suitability::ReasonCode};

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        offset().with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn make_hour(day: u32, hour: u32) -> HourlyRecord {
        HourlyRecord {
            timestamp: at(day, hour),
            humidity: 50.0,
            precip_mm: 0.0,
            precip_probability: 0,
            condition_text: "晴".to_string(),
            wind_direction: "N".to_string(),
            wind_scale: WindScale::single(2),
            temperature: 26.0,
            uv_index: Some(6),
            aqi: None,
        }
    }

    fn full_days(days: &[u32]) -> ForecastInput {
        ForecastInput {
            hourly: days
                .iter()
                .flat_map(|&d| (0..24).map(move |h| make_hour(d, h)))
                .collect(),
            ..Default::default()
        }
    }

    fn build(input: &ForecastInput, now: DateTime<FixedOffset>) -> Result<ForecastReport> {
        build_report(input, &SuitabilityThresholds::default(), now, ReportOptions::default())
    }

    // ==================== Report Shape Tests ====================

    #[test]
    fn test_report_covers_today_tomorrow_and_future() {
        let input = full_days(&[15, 16, 17, 18]);
        let report = build(&input, at(15, 7)).unwrap();

        assert_eq!(report.today.date, date(15));
        assert_eq!(report.tomorrow.date, date(16));
        let future: Vec<NaiveDate> = report.future_days.iter().map(|d| d.date).collect();
        assert_eq!(future, vec![date(17), date(18)]);
        assert!(report.today.result.is_suitable);
        assert_eq!(report.days().count(), 4);
    }

    #[test]
    fn test_future_days_capped_by_horizon() {
        let input = full_days(&[15, 16, 17, 18, 19, 20]);
        let options = ReportOptions {
            forecast_days: 2,
            ..Default::default()
        };
        let report =
            build_report(&input, &SuitabilityThresholds::default(), at(15, 7), options).unwrap();
        assert_eq!(report.future_days.len(), 1);
        assert_eq!(report.future_days[0].date, date(17));
    }

    #[test]
    fn test_short_horizons_have_no_future_days() {
        let input = full_days(&[15, 16, 17, 18]);

        for (forecast_days, expected) in [(0, 0), (1, 0), (2, 1)] {
            let options = ReportOptions {
                forecast_days,
                ..Default::default()
            };
            let report =
                build_report(&input, &SuitabilityThresholds::default(), at(15, 7), options)
                    .unwrap();
            assert_eq!(
                report.future_days.len(),
                expected,
                "forecast_days = {}",
                forecast_days
            );
            assert_eq!(report.tomorrow.date, date(16));
        }
    }

    #[test]
    fn test_single_day_feed_with_one_day_horizon() {
        let input = full_days(&[15]);
        let options = ReportOptions {
            allow_fallback: true,
            forecast_days: 1,
        };
        let report =
            build_report(&input, &SuitabilityThresholds::default(), at(15, 7), options).unwrap();
        assert!(report.future_days.is_empty());
        assert_eq!(report.tomorrow.result.reasons, vec![ReasonCode::NoData]);
    }

    #[test]
    fn test_missing_tomorrow_is_no_data() {
        let input = full_days(&[15]);
        let report = build(&input, at(15, 7)).unwrap();
        assert_eq!(report.tomorrow.date, date(16));
        assert_eq!(report.tomorrow.result.reasons, vec![ReasonCode::NoData]);
        assert!(report.future_days.is_empty());
    }

    #[test]
    fn test_gap_day_skipped_in_future_days() {
        let input = full_days(&[15, 16, 18]);
        let report = build(&input, at(15, 7)).unwrap();
        let future: Vec<NaiveDate> = report.future_days.iter().map(|d| d.date).collect();
        assert_eq!(future, vec![date(18)]);
    }

    // ==================== Failure Tests ====================

    #[test]
    fn test_missing_today_fails() {
        let input = full_days(&[16, 17]);
        let err = build(&input, at(15, 7)).unwrap_err();
        assert_eq!(err, EngineError::MissingHourlyFeed { date: date(15) });
    }

    #[test]
    fn test_empty_feed_fails() {
        let err = build(&ForecastInput::default(), at(15, 7)).unwrap_err();
        assert!(matches!(err, EngineError::MissingHourlyFeed { .. }));
    }

    #[test]
    fn test_invalid_thresholds_fail_before_evaluation() {
        let thresholds = SuitabilityThresholds {
            start_hour: 20,
            end_hour: 8,
            ..Default::default()
        };
        let err = build_report(
            &ForecastInput::default(),
            &thresholds,
            at(15, 7),
            ReportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    // ==================== Today / Fallback Tests ====================

    #[test]
    fn test_today_uses_feed_offset() {
        // 17:00 UTC on the 14th is 01:00 on the 15th at +08:00
        let input = full_days(&[15, 16]);
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 14, 17, 0, 0)
            .unwrap();
        let report = build(&input, now).unwrap();
        assert_eq!(report.today.date, date(15));
    }

    #[test]
    fn test_late_evening_falls_back_for_today_only() {
        let input = ForecastInput {
            hourly: vec![make_hour(15, 23), make_hour(16, 8)],
            ..Default::default()
        };
        let options = ReportOptions {
            allow_fallback: true,
            ..Default::default()
        };
        let report =
            build_report(&input, &SuitabilityThresholds::default(), at(15, 23), options).unwrap();
        assert!(report.today.result.used_fallback);
        assert_eq!(report.today.result.stats.total_hours, 1);
        assert!(!report.tomorrow.result.used_fallback);
    }

    #[test]
    fn test_default_options_do_not_fall_back() {
        let input = ForecastInput {
            hourly: vec![make_hour(15, 23)],
            ..Default::default()
        };
        assert!(!ReportOptions::default().allow_fallback);

        let report = build(&input, at(15, 23)).unwrap();
        assert!(!report.today.result.used_fallback);
        assert_eq!(report.today.result.reasons, vec![ReasonCode::NoData]);
    }

    #[test]
    fn test_daily_and_air_quality_matched_by_date() {
        let mut input = full_days(&[15, 16]);
        input.air_quality.push(AirQualitySample {
            date: date(16),
            aqi: 210,
            level: "5".to_string(),
            category: "重度污染".to_string(),
            primary_pollutant: None,
            pm2p5: None,
            pm10: None,
        });
        input.daily.push(DailySummary {
            uv_index: Some(9),
            ..DailySummary::new(date(15))
        });

        let report = build(&input, at(15, 7)).unwrap();
        assert!(report.today.result.is_suitable);
        assert!(report.today.result.stats.aqi.is_none());
        assert!(!report.tomorrow.result.is_suitable);
        assert_eq!(report.tomorrow.result.stats.aqi, Some(210));
    }

    // ==================== Rain Outlook Tests ====================

    #[test]
    fn test_rain_outlook_windows() {
        let mut input = full_days(&[15, 16, 17]);
        // 09:00 today, then 14:00 the day after tomorrow
        input.hourly[9].precip_mm = 1.0;
        input.hourly[48 + 14].precip_mm = 20.0;

        let report = build(&input, at(15, 8)).unwrap();
        assert!(report.rain.next_hours.will_rain);
        assert_eq!(report.rain.next_hours.hours_considered, 6);
        assert!(report.rain.commute.will_rain);
        assert!(!report.rain.tomorrow.will_rain);
        assert_eq!(report.rain.day_after_tomorrow.rain_level, RainLevel::Storm);
    }

    // ==================== Output Tests ====================

    #[test]
    fn test_report_serializes_reason_codes() {
        let input = full_days(&[15]);
        let report = build(&input, at(15, 7)).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["today"]["date"], "2024-06-15");
        assert_eq!(json["today"]["is_suitable"], true);
        assert_eq!(json["tomorrow"]["reasons"][0]["code"], "NO_DATA");
        assert_eq!(json["rain"]["next_hours"]["rain_level"], "none");
    }

    #[test]
    fn test_write_csv_one_row_per_day() {
        let input = full_days(&[15, 16, 17]);
        let report = build(&input, at(15, 7)).unwrap();

        let mut buf = Vec::new();
        write_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("date,is_suitable,reasons,"));
        assert!(lines[1].starts_with("2024-06-15,true,,"));
        assert!(lines[2].starts_with("2024-06-16,true,,"));
        assert!(lines[3].starts_with("2024-06-17,true,,"));
    }
}
