//! Shade command handler for a single slope facet.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use skisun_lib::{calculate_point_shade, shadow_direction, shadow_length_factor, ShadeResult};

use crate::output::OutputFormat;
use crate::ShadeArgs;

#[derive(Debug, Clone, Serialize)]
pub struct ShadeReport {
    pub latitude: f64,
    pub longitude: f64,
    pub at: DateTime<FixedOffset>,
    pub aspect_degrees: f64,
    pub slope_angle_degrees: f64,
    #[serde(flatten)]
    pub result: ShadeResult,
    pub shadow_direction_degrees: f64,
    /// Shadow length per unit height; absent while the sun is down.
    pub shadow_length_factor: Option<f64>,
}

/// Handle the shade subcommand.
pub fn handle_shade(args: &ShadeArgs, format: OutputFormat) -> Result<()> {
    let report = build_shade_report(args)?;
    format.render_shade(&report)
}

fn build_shade_report(args: &ShadeArgs) -> Result<ShadeReport> {
    let result = calculate_point_shade(&args.at, args.lat, args.lng, args.aspect, args.slope)
        .context("failed to compute slope shade")?;
    let sun = result.sun_position;
    let length = shadow_length_factor(sun.altitude_degrees);

    Ok(ShadeReport {
        latitude: args.lat,
        longitude: args.lng,
        at: args.at,
        aspect_degrees: args.aspect,
        slope_angle_degrees: args.slope,
        result,
        shadow_direction_degrees: shadow_direction(sun.azimuth_degrees),
        shadow_length_factor: length.is_finite().then_some(length),
    })
}
