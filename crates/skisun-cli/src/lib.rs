//! skisun CLI library.
//!
//! This crate provides the argument types, subcommand handlers and output
//! formatting behind the `skisun-cli` binary. The engine itself lives in
//! `skisun_lib`; nothing here computes sun positions or plans routes.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use clap::Args;
use skisun_lib::Difficulty;

pub mod commands;
pub mod output;
pub mod terminal;

pub use output::OutputFormat;

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Directory containing `ski_areas/<id>.json`. Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Planner configuration file (JSON). Missing fields keep their defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the weight of the sun exposure score.
    #[arg(long, global = true)]
    pub sun_weight: Option<f64>,

    /// Override the penalty per minute of extra travel.
    #[arg(long, global = true)]
    pub detour_weight: Option<f64>,
}

/// Arguments for the `sun` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SunArgs {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Instant as an RFC 3339 timestamp. Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<FixedOffset>>,

    /// Calendar day for sunrise and sunset (YYYY-MM-DD). Defaults to the day of `--at`.
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the `shade` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ShadeArgs {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Instant as an RFC 3339 timestamp.
    #[arg(long, value_parser = parse_instant)]
    pub at: DateTime<FixedOffset>,

    /// Compass direction the slope faces, in degrees.
    #[arg(long)]
    pub aspect: f64,

    /// Slope inclination from horizontal, in degrees.
    #[arg(long, default_value_t = 25.0)]
    pub slope: f64,
}

/// Arguments for the `exposure` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ExposureArgs {
    /// Ski area id in the topology store.
    #[arg(long = "ski-area")]
    pub ski_area: String,

    /// Day to score (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// IANA time zone of the resort. Defaults to the ski area's zone, then UTC.
    #[arg(long, value_parser = parse_timezone)]
    pub tz: Option<Tz>,

    /// Local start of the window (HH:MM). Defaults to the configured lift opening.
    #[arg(long, value_parser = parse_clock_time)]
    pub from: Option<NaiveTime>,

    /// Local end of the window (HH:MM). Defaults to the configured lift closing.
    #[arg(long, value_parser = parse_clock_time)]
    pub to: Option<NaiveTime>,

    /// Only score runs of these difficulties.
    #[arg(long, value_delimiter = ',', value_parser = parse_difficulty)]
    pub difficulty: Vec<Difficulty>,

    /// Live status snapshot (JSON) to overlay before scoring.
    #[arg(long)]
    pub status: Option<PathBuf>,
}

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Ski area id in the topology store.
    #[arg(long = "ski-area")]
    pub ski_area: String,

    /// Difficulties to include; repeat the flag or separate with commas.
    #[arg(long, required = true, value_delimiter = ',', value_parser = parse_difficulty)]
    pub difficulty: Vec<Difficulty>,

    /// Latitude of the starting point.
    #[arg(long = "home-lat", allow_negative_numbers = true)]
    pub home_lat: f64,

    /// Longitude of the starting point.
    #[arg(long = "home-lng", allow_negative_numbers = true)]
    pub home_lng: f64,

    /// Day to plan (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// IANA time zone of the resort. Defaults to the ski area's zone, then UTC.
    #[arg(long, value_parser = parse_timezone)]
    pub tz: Option<Tz>,

    /// Local lift opening time (HH:MM).
    #[arg(long, value_parser = parse_clock_time)]
    pub open: Option<NaiveTime>,

    /// Local lift closing time (HH:MM).
    #[arg(long, value_parser = parse_clock_time)]
    pub close: Option<NaiveTime>,

    /// Live status snapshot (JSON) to overlay before planning.
    #[arg(long)]
    pub status: Option<PathBuf>,
}

pub fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|err| format!("expected an RFC 3339 timestamp, got '{value}': {err}"))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got '{value}'"))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("expected a time as HH:MM, got '{value}'"))
}

pub fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|_| format!("unknown IANA time zone '{value}'"))
}

pub fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    value.parse::<Difficulty>().map_err(|err| err.to_string())
}
