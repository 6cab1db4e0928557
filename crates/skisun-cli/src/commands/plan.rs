//! Plan command handler for sun-aware itineraries.

use anyhow::{Context, Result};
use serde::Serialize;

use skisun_lib::{
    ensure_eligible_terrain, plan_route_traced, GeoPoint, PlanRequest, PlanSummary, RoutePlan,
    TerminationReason,
};

use crate::commands::{load_ski_area, resolve_config, resolve_timezone};
use crate::output::OutputFormat;
use crate::{GlobalOptions, PlanArgs};

/// Everything the plan command reports.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub summary: PlanSummary,
    pub termination: TerminationReason,
    pub plan: RoutePlan,
}

/// Handle the plan subcommand.
///
/// Loads the ski area, applies an optional status snapshot, checks that some
/// open terrain matches the requested difficulties and runs the planner.
pub fn handle_plan(global: &GlobalOptions, args: &PlanArgs, format: OutputFormat) -> Result<()> {
    let config = resolve_config(global)?;
    let topology = load_ski_area(global, &args.ski_area, args.status.as_deref())?;
    let tz = resolve_timezone(args.tz, &topology);

    let request = build_request(args, tz);
    request.validate().context("invalid plan request")?;
    ensure_eligible_terrain(&topology, &request.difficulties)?;

    let (plan, termination) =
        plan_route_traced(&request, &topology, &config).context("route planning failed")?;

    let report = PlanReport {
        summary: PlanSummary::from_plan(&plan, &topology, tz),
        termination,
        plan,
    };
    format.render_plan(&report)
}

fn build_request(args: &PlanArgs, tz: chrono_tz::Tz) -> PlanRequest {
    let home = GeoPoint {
        lat: args.home_lat,
        lng: args.home_lng,
    };
    let mut request = args.difficulty.iter().fold(
        PlanRequest::new(&args.ski_area, home, args.date).with_timezone(tz),
        |request, difficulty| request.with_difficulty(*difficulty),
    );
    request.lift_open_time = args.open;
    request.lift_close_time = args.close;
    request
}
