//! Sun command handler for positions and sunrise/sunset times.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use skisun_lib::{sun_position, sun_times, SunPosition, SunTimes};

use crate::output::OutputFormat;
use crate::SunArgs;

/// Sun position at one instant plus the sun times of its day.
#[derive(Debug, Clone, Serialize)]
pub struct SunReport {
    pub latitude: f64,
    pub longitude: f64,
    pub at: DateTime<FixedOffset>,
    pub position: SunPosition,
    pub is_up: bool,
    pub times: SunTimes,
}

/// Handle the sun subcommand.
pub fn handle_sun(args: &SunArgs, format: OutputFormat) -> Result<()> {
    let at = args.at.unwrap_or_else(|| Utc::now().fixed_offset());
    let report = build_sun_report(args, at)?;
    format.render_sun(&report)
}

fn build_sun_report(args: &SunArgs, at: DateTime<FixedOffset>) -> Result<SunReport> {
    let position = sun_position(&at, args.lat, args.lng).context("failed to compute sun position")?;
    let date = args.date.unwrap_or_else(|| at.date_naive());
    let times = sun_times(date, args.lat, args.lng).context("failed to compute sun times")?;

    Ok(SunReport {
        latitude: args.lat,
        longitude: args.lng,
        at,
        is_up: position.is_above_horizon(),
        position,
        times,
    })
}
