use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, ValueEnum};
use laundry_checker::{
    Clock, ForecastPayload, RainLevel, RainWindowMetrics, SystemClock, build_report,
    config::AppConfig, write_csv,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "laundry-checker")]
#[command(about = "Decide whether the forecast suits drying laundry outdoors")]
struct Args {
    /// Forecast payload (JSON with hourly, daily, air and indices feeds)
    #[arg(short, long)]
    input: PathBuf,

    /// Evaluate as of this time (RFC 3339) instead of the system clock
    #[arg(long, value_parser = DateTime::parse_from_rfc3339)]
    now: Option<DateTime<FixedOffset>>,

    /// Allow today's evaluation to fall back to the whole day once the
    /// drying window has passed (off unless set here or in the config)
    #[arg(long)]
    allow_fallback: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Extra config file layered over the default locations
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Short rain summary for log lines.
fn describe_rain(metrics: &RainWindowMetrics) -> String {
    match metrics.rain_level {
        RainLevel::None => format!("dry over {} hours", metrics.hours_considered),
        level => format!(
            "{:?} rain, {} of {} hours, {:.1} mm total",
            level, metrics.rain_hour_count, metrics.hours_considered, metrics.total_precip_mm
        )
        .to_lowercase(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("laundry_checker=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config =
        AppConfig::load_with_file(args.config.as_deref()).context("Failed to load configuration")?;
    let thresholds = config.thresholds().context("Invalid thresholds in configuration")?;
    let mut options = config.report_options();
    if args.allow_fallback {
        options.allow_fallback = true;
    }

    let payload = ForecastPayload::load(&args.input)?;
    let input = payload.to_input();
    tracing::info!(
        "Loaded {} hourly, {} daily, {} air quality records from {}",
        input.hourly.len(),
        input.daily.len(),
        input.air_quality.len(),
        args.input.display()
    );

    let now = match args.now {
        Some(now) => now,
        None => {
            let offset = input
                .hourly
                .first()
                .map(|h| *h.timestamp.offset())
                .unwrap_or_else(|| *SystemClock.now_local().offset());
            SystemClock.now_fixed(offset)
        }
    };

    let report = build_report(&input, &thresholds, now, options)
        .with_context(|| format!("Failed to evaluate forecast as of {}", now))?;
    tracing::info!("Next hours: {}", describe_rain(&report.rain.next_hours));
    tracing::info!("Commute: {}", describe_rain(&report.rain.commute));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            if args.pretty {
                serde_json::to_writer_pretty(&mut out, &report)
            } else {
                serde_json::to_writer(&mut out, &report)
            }
            .context("Failed to write JSON report")?;
            writeln!(out).context("Failed to write to stdout")?;
        }
        OutputFormat::Csv => write_csv(&report, &mut out)?,
    }

    Ok(())
}
