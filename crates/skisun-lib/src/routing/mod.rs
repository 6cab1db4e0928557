//! Sun-aware route planning.
//!
//! This module provides:
//! - [`PlanRequest`] - What the skier asked for (area, difficulties, home, day)
//! - [`PlannerConfig`] - Tunable scoring weights and model constants
//! - [`RouteLeg`] / [`RoutePlan`] - The ordered itinerary
//! - [`plan_route`] - Main entry point
//!
//! Planning is a greedy time-windowed covering heuristic: from the current
//! node, every uncovered eligible run reachable by lifts is scored by its sun
//! exposure at arrival minus the extra travel needed to reach it, and the best
//! one is committed. The state machine lives in the `planner` submodule.
//!
//! # Example
//!
//! ```ignore
//! use skisun_lib::{plan_route, PlanRequest, PlannerConfig, SkiAreaTopology};
//!
//! let topology = SkiAreaTopology::from_path("ski_areas/chamonix.json".as_ref())?;
//! let request =
//!     PlanRequest::new("chamonix", home, date).with_difficulty(Difficulty::Intermediate);
//! let plan = plan_route(&request, &topology, &PlannerConfig::default())?;
//! println!("{} of {} runs", plan.total_runs_covered, plan.total_runs_available);
//! ```

mod planner;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::exposure::{local_to_utc, ExposureOptions, TimeWindow};
use crate::geo::GeoPoint;
use crate::graph::{DescentSpeeds, GraphBuildOptions};
use crate::topology::{Difficulty, FeatureId, SkiAreaTopology};

use planner::CoveragePlanner;
pub use planner::TerminationReason;

/// Upper bound on the boarding allowance, one full day.
const MAX_LIFT_BOARDING_MINUTES: f64 = 24.0 * 60.0;

/// Upper bound on any configured descent speed.
const MAX_DESCENT_SPEED_KMH: f64 = 200.0;

/// High-level route planning request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub ski_area_id: String,
    pub difficulties: BTreeSet<Difficulty>,
    pub home_location: GeoPoint,
    pub target_date: NaiveDate,
    /// Resort-local time the first lift may be boarded.
    pub lift_open_time: Option<NaiveTime>,
    /// Resort-local time after which no lift may be boarded.
    pub lift_close_time: Option<NaiveTime>,
    /// Zone used to interpret the local times above.
    pub timezone: Tz,
}

impl PlanRequest {
    /// Request with no difficulties selected and default lift hours.
    pub fn new(
        ski_area_id: impl Into<String>,
        home_location: GeoPoint,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            ski_area_id: ski_area_id.into(),
            difficulties: BTreeSet::new(),
            home_location,
            target_date,
            lift_open_time: None,
            lift_close_time: None,
            timezone: Tz::UTC,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulties.insert(difficulty);
        self
    }

    pub fn with_lift_hours(mut self, open: NaiveTime, close: NaiveTime) -> Self {
        self.lift_open_time = Some(open);
        self.lift_close_time = Some(close);
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Reject malformed requests before any computation.
    pub fn validate(&self) -> Result<()> {
        if self.ski_area_id.trim().is_empty() {
            return Err(Error::invalid_request("ski area id is required"));
        }
        if self.difficulties.is_empty() {
            return Err(Error::invalid_request("at least one difficulty must be selected"));
        }
        if !self.home_location.is_finite() || self.home_location.lat.abs() > 90.0 {
            return Err(Error::invalid_request(format!(
                "home location ({}, {}) is not a valid coordinate",
                self.home_location.lat, self.home_location.lng
            )));
        }
        Ok(())
    }

    /// Convert a resort-local wall-clock time on the target date to UTC.
    pub fn local_to_utc(&self, time: NaiveTime) -> Result<DateTime<Utc>> {
        local_to_utc(self.timezone, self.target_date, time)
    }
}

/// Tunable policy for the planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Weight of the [0, 1] exposure score.
    pub sun_weight: f64,
    /// Penalty per minute of travel beyond the closest candidate.
    pub detour_weight: f64,
    /// Endpoints closer than this share a node; a home farther than this from
    /// every node yields an empty plan.
    pub cluster_radius_meters: f64,
    pub max_iterations: usize,
    pub lift_boarding_minutes: f64,
    pub default_lift_open: NaiveTime,
    pub default_lift_close: NaiveTime,
    pub descent_speeds: DescentSpeeds,
    pub exposure: ExposureOptions,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            sun_weight: 10.0,
            detour_weight: 0.5,
            cluster_radius_meters: 40.0,
            max_iterations: 500,
            lift_boarding_minutes: 1.0,
            default_lift_open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            default_lift_close: NaiveTime::from_hms_opt(16, 30, 0).unwrap_or(NaiveTime::MIN),
            descent_speeds: DescentSpeeds::default(),
            exposure: ExposureOptions::default(),
        }
    }
}

impl PlannerConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config: PlannerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let finite_non_negative = [
            ("sun_weight", self.sun_weight),
            ("detour_weight", self.detour_weight),
            ("cluster_radius_meters", self.cluster_radius_meters),
            ("lift_boarding_minutes", self.lift_boarding_minutes),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_request(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.lift_boarding_minutes > MAX_LIFT_BOARDING_MINUTES {
            return Err(Error::invalid_request(format!(
                "lift_boarding_minutes must be at most {MAX_LIFT_BOARDING_MINUTES}, got {}",
                self.lift_boarding_minutes
            )));
        }
        for difficulty in Difficulty::ALL {
            let kmh = self.descent_speeds.kmh(difficulty);
            if !kmh.is_finite() || kmh <= 0.0 || kmh > MAX_DESCENT_SPEED_KMH {
                return Err(Error::invalid_request(format!(
                    "descent speed for {difficulty} must be in (0, {MAX_DESCENT_SPEED_KMH}] km/h, \
                     got {kmh}"
                )));
            }
        }
        if self.exposure.sample_interval_minutes == 0 {
            return Err(Error::invalid_request("sample interval must be positive"));
        }
        Ok(())
    }

    pub fn graph_options(&self) -> GraphBuildOptions {
        GraphBuildOptions {
            cluster_radius_meters: self.cluster_radius_meters,
            descent_speeds: self.descent_speeds,
            lift_boarding_seconds: (self.lift_boarding_minutes * 60.0).round() as i64,
        }
    }
}

/// One step of the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteLeg {
    LiftRide {
        lift_id: FeatureId,
        from: GeoPoint,
        to: GeoPoint,
        start_time: DateTime<Utc>,
        duration_minutes: f64,
    },
    RunDescent {
        run_id: FeatureId,
        from: GeoPoint,
        to: GeoPoint,
        start_time: DateTime<Utc>,
        duration_minutes: f64,
        sun_score: f64,
    },
}

impl RouteLeg {
    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            RouteLeg::LiftRide { start_time, .. } | RouteLeg::RunDescent { start_time, .. } => {
                *start_time
            }
        }
    }

    pub fn duration_minutes(&self) -> f64 {
        match self {
            RouteLeg::LiftRide {
                duration_minutes, ..
            }
            | RouteLeg::RunDescent {
                duration_minutes, ..
            } => *duration_minutes,
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        let millis = (self.duration_minutes() * 60_000.0).round() as i64;
        self.start_time() + chrono::TimeDelta::milliseconds(millis)
    }

    pub fn is_run(&self) -> bool {
        matches!(self, RouteLeg::RunDescent { .. })
    }
}

/// Planned itinerary returned by the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub legs: Vec<RouteLeg>,
    pub total_runs_covered: usize,
    pub total_runs_available: usize,
    pub total_sun_score: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl RoutePlan {
    pub(crate) fn empty(total_runs_available: usize, at: DateTime<Utc>) -> Self {
        Self {
            legs: Vec::new(),
            total_runs_covered: 0,
            total_runs_available,
            total_sun_score: 0.0,
            start_time: at,
            end_time: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn run_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_run()).count()
    }

    pub fn lift_count(&self) -> usize {
        self.legs.len() - self.run_count()
    }

    /// Fraction of eligible runs covered, in [0, 1].
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_runs_available == 0 {
            return 0.0;
        }
        self.total_runs_covered as f64 / self.total_runs_available as f64
    }
}

/// Resolved planning day in UTC.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ServiceDay {
    pub window: TimeWindow,
}

impl ServiceDay {
    fn resolve(request: &PlanRequest, config: &PlannerConfig) -> Result<Self> {
        let open = request.lift_open_time.unwrap_or(config.default_lift_open);
        let close = request.lift_close_time.unwrap_or(config.default_lift_close);
        if open >= close {
            return Err(Error::invalid_request(format!(
                "lift open time {open} must be before close time {close}"
            )));
        }
        let window = TimeWindow::new(request.local_to_utc(open)?, request.local_to_utc(close)?)?;
        Ok(Self { window })
    }
}

/// Compute a sun-aware itinerary.
///
/// This is the main entry point for route planning. It:
/// 1. Validates the request and config
/// 2. Resolves the lift day to UTC
/// 3. Builds the ski graph and the exposure timeline
/// 4. Runs the greedy covering planner
///
/// An unreachable home location or an area without reachable open terrain
/// yields an empty plan rather than an error.
pub fn plan_route(
    request: &PlanRequest,
    topology: &SkiAreaTopology,
    config: &PlannerConfig,
) -> Result<RoutePlan> {
    plan_route_traced(request, topology, config).map(|(plan, _)| plan)
}

/// Same as [`plan_route`], also reporting why the planner stopped.
pub fn plan_route_traced(
    request: &PlanRequest,
    topology: &SkiAreaTopology,
    config: &PlannerConfig,
) -> Result<(RoutePlan, TerminationReason)> {
    request.validate()?;
    config.validate()?;
    if request.ski_area_id != topology.id {
        return Err(Error::invalid_request(format!(
            "request is for ski area {} but topology is {}",
            request.ski_area_id, topology.id
        )));
    }

    let day = ServiceDay::resolve(request, config)?;
    let planner = CoveragePlanner::new(request, topology, config, day)?;
    let (plan, reason) = planner.run_traced();

    info!(
        ski_area = %topology.id,
        covered = plan.total_runs_covered,
        available = plan.total_runs_available,
        legs = plan.legs.len(),
        ?reason,
        "route plan complete"
    );
    Ok((plan, reason))
}
