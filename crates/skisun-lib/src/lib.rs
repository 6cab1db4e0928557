//! skisun library entry points.
//!
//! This crate exposes a low-precision solar ephemeris, a slope shade model,
//! per-run sun exposure scoring and a sun-aware ski route planner. Higher-level
//! consumers (the CLI, request handlers) should only depend on the functions
//! exported here instead of reimplementing behavior.
//!
//! The engine is pure: it performs no I/O during planning and keeps no state
//! between calls. The [`dataset`] module is the only place that touches the
//! filesystem, as an adapter for the topology collaborator.

pub mod dataset;
pub mod ephemeris;
pub mod error;
pub mod exposure;
pub mod geo;
pub mod graph;
pub mod output;
pub mod path;
pub mod routing;
pub mod shade;
pub mod topology;

pub use dataset::{default_topology_dir, JsonTopologyStore, TopologySource};
pub use ephemeris::{is_sun_up, sun_position, sun_times, SunCondition, SunPosition, SunTimes};
pub use error::{Error, Result};
pub use exposure::{
    build_exposure_timeline, estimate_slope_aspect, local_to_utc, score_run_exposure,
    ExposureOptions, ExposureSample, ExposureTimeline, RunExposure, TimeWindow,
};
pub use geo::{angular_difference, GeoPoint};
pub use graph::{build_graph, DescentSpeeds, Edge, EdgeKind, GraphBuildOptions, Node, SkiGraph};
pub use output::{LegKind, PlanRenderMode, PlanStep, PlanSummary};
pub use path::{earliest_arrivals, LiftSchedule, Reachability};
pub use routing::{
    plan_route, plan_route_traced, PlanRequest, PlannerConfig, RouteLeg, RoutePlan,
    TerminationReason,
};
pub use shade::{
    calculate_point_shade, shadow_direction, shadow_length_factor, ShadeResult, SlopeFacet,
};
pub use topology::{
    difficulty_color, ensure_eligible_terrain, Difficulty, LiftDescriptor, LiftType,
    OperatingHours, RunDescriptor, SkiAreaTopology, StatusSnapshot,
};
