//! Output formatting for command results.
//!
//! Text output goes to stdout; logs go to stderr so `--format json` output
//! stays machine-readable.

use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use clap::ValueEnum;
use serde::Serialize;

use skisun_lib::{PlanRenderMode, SunCondition, TerminationReason};

use crate::commands::exposure::ExposureReport;
use crate::commands::plan::PlanReport;
use crate::commands::shade::ShadeReport;
use crate::commands::sun::SunReport;
use crate::terminal::ColorPalette;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Markdown, for pasting into notes. Commands without a Markdown view print text.
    Markdown,
}

impl OutputFormat {
    pub fn render_sun(self, report: &SunReport) -> Result<()> {
        match self {
            OutputFormat::Json => render_json(report),
            OutputFormat::Text | OutputFormat::Markdown => {
                print!("{}", format_sun_text(report, &ColorPalette::detect()));
                Ok(())
            }
        }
    }

    pub fn render_shade(self, report: &ShadeReport) -> Result<()> {
        match self {
            OutputFormat::Json => render_json(report),
            OutputFormat::Text | OutputFormat::Markdown => {
                print!("{}", format_shade_text(report, &ColorPalette::detect()));
                Ok(())
            }
        }
    }

    pub fn render_exposure(self, report: &ExposureReport) -> Result<()> {
        match self {
            OutputFormat::Json => render_json(report),
            OutputFormat::Text | OutputFormat::Markdown => {
                print!("{}", format_exposure_text(report, &ColorPalette::detect()));
                Ok(())
            }
        }
    }

    pub fn render_plan(self, report: &PlanReport) -> Result<()> {
        match self {
            OutputFormat::Json => render_json(report),
            OutputFormat::Text => {
                print!("{}", report.summary.render(PlanRenderMode::PlainText));
                println!("Stopped: {}", termination_label(report.termination));
                Ok(())
            }
            OutputFormat::Markdown => {
                print!("{}", report.summary.render(PlanRenderMode::Markdown));
                Ok(())
            }
        }
    }
}

/// Write any serializable report to stdout as pretty JSON.
pub fn render_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn local_hm(time: DateTime<Utc>, offset: &FixedOffset) -> String {
    time.with_timezone(offset).format("%H:%M").to_string()
}

pub fn format_sun_text(report: &SunReport, palette: &ColorPalette) -> String {
    let offset = report.at.offset();
    let position = &report.position;
    let state = if report.is_up {
        "above horizon"
    } else {
        "below horizon"
    };

    let mut out = format!(
        "Sun at ({:.4}, {:.4}) on {}\n",
        report.latitude,
        report.longitude,
        report.at.to_rfc3339()
    );
    out.push_str(&format!(
        "  azimuth   {:>6.1}°\n  altitude  {:>6.1}° {}({}){}\n",
        position.azimuth_degrees,
        position.altitude_degrees,
        palette.light(!report.is_up),
        state,
        palette.reset
    ));

    let times = &report.times;
    match times.condition {
        SunCondition::PolarDay => out.push_str("  polar day: the sun does not set\n"),
        SunCondition::PolarNight => out.push_str("  polar night: the sun does not rise\n"),
        SunCondition::Normal => {
            if let (Some(rise), Some(set)) = (times.sunrise, times.sunset) {
                out.push_str(&format!(
                    "  sunrise   {}\n  sunset    {}\n",
                    local_hm(rise, offset),
                    local_hm(set, offset)
                ));
            }
        }
    }
    let day = times.day_length();
    out.push_str(&format!(
        "  noon      {}\n  daylight  {}h{:02}m\n",
        local_hm(times.solar_noon, offset),
        day.num_hours(),
        day.num_minutes() % 60
    ));
    out
}

pub fn format_shade_text(report: &ShadeReport, palette: &ColorPalette) -> String {
    let result = &report.result;
    let state = if result.is_shaded { "Shaded" } else { "Lit" };
    let mut out = format!(
        "{}{}{} slope (aspect {:.0}°, incline {:.0}°) at ({:.4}, {:.4}) on {}\n",
        palette.light(result.is_shaded),
        state,
        palette.reset,
        report.aspect_degrees,
        report.slope_angle_degrees,
        report.latitude,
        report.longitude,
        report.at.to_rfc3339()
    );
    out.push_str(&format!(
        "  confidence {:.2}\n  sun       azimuth {:.1}°, altitude {:.1}°\n",
        result.confidence, result.sun_position.azimuth_degrees, result.sun_position.altitude_degrees
    ));
    match report.shadow_length_factor {
        Some(factor) => out.push_str(&format!(
            "  shadow    toward {:.1}°, {:.2}x object height\n",
            report.shadow_direction_degrees, factor
        )),
        None => out.push_str("  shadow    none (sun below horizon)\n"),
    }
    out
}

pub fn format_exposure_text(report: &ExposureReport, palette: &ColorPalette) -> String {
    let mut out = format!(
        "Sun exposure for {} on {}, {}-{} ({})\n",
        report.ski_area, report.date, report.from, report.to, report.timezone
    );
    if report.runs.is_empty() {
        out.push_str("No open runs to score.\n");
        return out;
    }

    let width = report
        .runs
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0);
    for row in &report.runs {
        let best = row
            .best_window
            .as_ref()
            .map(|w| format!("best {}-{}", w.start, w.end))
            .unwrap_or_else(|| "in shade all day".to_string());
        out.push_str(&format!(
            "  {} {}{:<width$}{} {:<12} {:>4.0}%  {}{}{}\n",
            palette.swatch(row.color),
            palette.white_bold,
            row.name,
            palette.reset,
            row.difficulty.as_str(),
            row.mean_illumination * 100.0,
            palette.gray,
            best,
            palette.reset,
            width = width
        ));
    }
    out
}

fn termination_label(reason: TerminationReason) -> &'static str {
    match reason {
        TerminationReason::HomeUnreachable => "home location is too far from any lift or run",
        TerminationReason::AllRunsCovered => "all eligible runs covered",
        TerminationReason::NoReachableRuns => "no remaining run is reachable by lift",
        TerminationReason::OutOfTime => "remaining runs cannot be finished before closing",
        TerminationReason::NoProductiveMove => "no remaining run is worth the detour",
        TerminationReason::IterationCap => "iteration limit reached",
    }
}
