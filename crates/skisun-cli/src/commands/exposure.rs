//! Exposure command handler scoring every open run of a ski area.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use skisun_lib::{build_exposure_timeline, local_to_utc, Difficulty, RunDescriptor, TimeWindow};

use crate::commands::{load_ski_area, resolve_config, resolve_timezone};
use crate::output::OutputFormat;
use crate::{ExposureArgs, GlobalOptions};

#[derive(Debug, Clone, Serialize)]
pub struct ExposureReport {
    pub ski_area: String,
    pub timezone: String,
    pub date: NaiveDate,
    /// Local window bounds, `HH:MM`.
    pub from: String,
    pub to: String,
    /// Runs ordered from sunniest to shadiest.
    pub runs: Vec<RunExposureRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunExposureRow {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub color: &'static str,
    pub mean_illumination: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_window: Option<LocalWindow>,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocalWindow {
    pub start: String,
    pub end: String,
}

/// Handle the exposure subcommand.
pub fn handle_exposure(
    global: &GlobalOptions,
    args: &ExposureArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = resolve_config(global)?;
    let topology = load_ski_area(global, &args.ski_area, args.status.as_deref())?;
    let tz = resolve_timezone(args.tz, &topology);

    let from = args.from.unwrap_or(config.default_lift_open);
    let to = args.to.unwrap_or(config.default_lift_close);
    let start = local_to_utc(tz, args.date, from).context("invalid exposure start")?;
    let end = local_to_utc(tz, args.date, to).context("invalid exposure end")?;
    let window = TimeWindow::new(start, end).context("invalid exposure window")?;

    let filter: BTreeSet<Difficulty> = args.difficulty.iter().copied().collect();
    let runs: Vec<&RunDescriptor> = topology
        .runs
        .iter()
        .filter(|run| run.is_open && (filter.is_empty() || filter.contains(&run.difficulty)))
        .collect();

    let timeline = build_exposure_timeline(runs.iter().copied(), window, &config.exposure)
        .context("failed to score run exposure")?;

    let local = |time: DateTime<Utc>| time.with_timezone(&tz).format("%H:%M").to_string();
    let mut rows: Vec<RunExposureRow> = runs
        .iter()
        .filter_map(|run| {
            let exposure = timeline.get(&run.id)?;
            Some(RunExposureRow {
                id: run.id.clone(),
                name: if run.name.is_empty() {
                    run.id.clone()
                } else {
                    run.name.clone()
                },
                difficulty: run.difficulty,
                color: run.difficulty.color(),
                mean_illumination: exposure.mean_illumination,
                best_window: exposure.best_window.map(|w| LocalWindow {
                    start: local(w.start),
                    end: local(w.end),
                }),
                samples: exposure.samples.len(),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.mean_illumination
            .total_cmp(&a.mean_illumination)
            .then_with(|| a.id.cmp(&b.id))
    });

    info!(ski_area = %topology.id, runs = rows.len(), "scored run exposure");

    let report = ExposureReport {
        ski_area: if topology.name.is_empty() {
            topology.id.clone()
        } else {
            topology.name.clone()
        },
        timezone: tz.name().to_string(),
        date: args.date,
        from: from.format("%H:%M").to_string(),
        to: to.format("%H:%M").to_string(),
        runs: rows,
    };
    format.render_exposure(&report)
}
