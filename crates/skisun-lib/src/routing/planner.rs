//! Greedy covering planner.
//!
//! The planner walks a small state machine over simulated wall-clock time:
//!
//! ```text
//! AtNode --> Planning --> Committed --> AtNode ...
//!                 \
//!                  +--> Terminal
//! ```
//!
//! Every transition is a pure function of the snapshot it was built from, so
//! identical inputs always produce identical plans.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::exposure::{build_exposure_timeline, ExposureTimeline, TimeWindow};
use crate::geo::GeoPoint;
use crate::graph::{build_graph, Edge, EdgeId, NodeId, SkiGraph};
use crate::path::{earliest_arrivals, LiftSchedule, Reachability};
use crate::topology::{FeatureId, SkiAreaTopology};

use super::{PlanRequest, PlannerConfig, RouteLeg, RoutePlan, ServiceDay};

/// Planner state between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlannerState {
    /// Standing at a node, waiting to choose the next leg.
    AtNode(NodeId),
    /// Evaluating candidates from a node.
    Planning(NodeId),
    /// A leg sequence was appended; the clock now reflects it.
    Committed(NodeId),
    Terminal(TerminationReason),
}

/// Why planning stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No graph node lies within the home snap radius.
    HomeUnreachable,
    AllRunsCovered,
    /// No uncovered eligible run can be reached by lifts from here.
    NoReachableRuns,
    /// Reachable runs exist but none can be finished before lifts close.
    OutOfTime,
    /// Every remaining candidate scored below zero.
    NoProductiveMove,
    IterationCap,
}

#[derive(Debug, Clone)]
struct Candidate {
    run_id: FeatureId,
    edge: EdgeId,
    travel_minutes: f64,
    detour_minutes: f64,
    exposure: f64,
    score: f64,
    /// Another uncovered run can still be reached and finished after this one.
    leads_on: bool,
}

impl Candidate {
    /// Higher score wins, then higher exposure, then shorter detour, then the
    /// lexicographically smallest run id.
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.exposure.total_cmp(&other.exposure))
            .then_with(|| other.detour_minutes.total_cmp(&self.detour_minutes))
            .then_with(|| other.run_id.cmp(&self.run_id))
    }
}

/// Greedy time-windowed covering planner over one ski area snapshot.
#[derive(Debug, Clone)]
pub(crate) struct CoveragePlanner {
    graph: SkiGraph,
    schedule: LiftSchedule,
    timeline: ExposureTimeline,
    /// Eligible runs that made it onto the graph, in id order.
    eligible: BTreeSet<FeatureId>,
    total_runs_available: usize,
    home: GeoPoint,
    window: TimeWindow,
    config: PlannerConfig,
}

impl CoveragePlanner {
    pub(crate) fn new(
        request: &PlanRequest,
        topology: &SkiAreaTopology,
        config: &PlannerConfig,
        day: ServiceDay,
    ) -> Result<Self> {
        let graph = build_graph(topology, &config.graph_options());
        let window = day.window;

        let eligible_runs: Vec<_> = topology.eligible_runs(&request.difficulties).collect();
        let total_runs_available = eligible_runs.len();
        let eligible: BTreeSet<FeatureId> = eligible_runs
            .iter()
            .filter(|run| graph.run_edge(&run.id).is_some())
            .map(|run| run.id.clone())
            .collect();

        let mut schedule = LiftSchedule::new(&graph);
        for lift in topology.open_lifts() {
            let Some(edge) = graph.lift_edge(&lift.id) else {
                continue;
            };
            let boarding = match lift.operating_hours {
                Some(hours) => {
                    let open = request.local_to_utc(hours.open)?.max(window.start);
                    let close = request.local_to_utc(hours.close)?.min(window.end);
                    (open <= close).then_some(TimeWindow {
                        start: open,
                        end: close,
                    })
                }
                None => Some(window),
            };
            schedule.set(edge.id, boarding);
        }

        let timeline = build_exposure_timeline(
            eligible_runs
                .iter()
                .copied()
                .filter(|run| eligible.contains(&run.id)),
            window,
            &config.exposure,
        )?;

        Ok(Self {
            graph,
            schedule,
            timeline,
            eligible,
            total_runs_available,
            home: request.home_location,
            window,
            config: *config,
        })
    }

    /// Run to completion, also reporting why planning stopped.
    ///
    /// The home location must lie within the clustering distance of a graph
    /// node, otherwise the plan is empty.
    pub(crate) fn run_traced(self) -> (RoutePlan, TerminationReason) {
        let start = match self.graph.nearest_node(&self.home) {
            Some((node, distance)) if distance <= self.config.cluster_radius_meters => node,
            nearest => {
                info!(
                    nearest_meters = nearest.map(|(_, d)| d),
                    "home location has no nearby graph node; returning empty plan"
                );
                return (
                    RoutePlan::empty(self.total_runs_available, self.window.start),
                    TerminationReason::HomeUnreachable,
                );
            }
        };

        let mut clock = self.window.start;
        let mut covered: BTreeSet<FeatureId> = BTreeSet::new();
        let mut legs: Vec<RouteLeg> = Vec::new();
        let mut total_sun_score = 0.0;
        let mut iterations = 0usize;
        let mut state = PlannerState::AtNode(start);

        let reason = loop {
            state = match state {
                PlannerState::AtNode(node) => {
                    if covered.len() == self.eligible.len() {
                        PlannerState::Terminal(TerminationReason::AllRunsCovered)
                    } else if iterations >= self.config.max_iterations {
                        PlannerState::Terminal(TerminationReason::IterationCap)
                    } else {
                        PlannerState::Planning(node)
                    }
                }
                PlannerState::Planning(node) => {
                    iterations += 1;
                    let reach = earliest_arrivals(&self.graph, &self.schedule, node, clock);
                    match self.select(&reach, clock, &covered) {
                        Ok(candidate) => {
                            let (next, finish) = self.commit(&reach, &candidate, clock, &mut legs);
                            debug!(
                                run = %candidate.run_id,
                                score = candidate.score,
                                exposure = candidate.exposure,
                                travel_minutes = candidate.travel_minutes,
                                "committed run"
                            );
                            total_sun_score += candidate.exposure;
                            covered.insert(candidate.run_id);
                            clock = finish;
                            PlannerState::Committed(next)
                        }
                        Err(reason) => PlannerState::Terminal(reason),
                    }
                }
                PlannerState::Committed(node) => PlannerState::AtNode(node),
                PlannerState::Terminal(reason) => break reason,
            };
        };

        info!(?reason, iterations, "planner stopped");

        let start_time = legs
            .first()
            .map(RouteLeg::start_time)
            .unwrap_or(self.window.start);
        let end_time = if legs.is_empty() { start_time } else { clock };
        let plan = RoutePlan {
            legs,
            total_runs_covered: covered.len(),
            total_runs_available: self.total_runs_available,
            total_sun_score,
            start_time,
            end_time,
        };
        (plan, reason)
    }

    /// Pick the next run from the lift-reachable uncovered runs.
    ///
    /// Runs whose bottom leaves no other uncovered run within reach are only
    /// considered when every candidate is like that.
    fn select(
        &self,
        reach: &Reachability,
        clock: DateTime<Utc>,
        covered: &BTreeSet<FeatureId>,
    ) -> std::result::Result<Candidate, TerminationReason> {
        let mut candidates = Vec::new();
        let mut any_reachable = false;

        for run_id in self.eligible.iter().filter(|id| !covered.contains(*id)) {
            let Some(edge) = self.graph.run_edge(run_id) else {
                continue;
            };
            let Some(arrival) = reach.arrival(edge.from) else {
                continue;
            };
            any_reachable = true;

            let Some(finish) = self.finish_in_time(arrival, edge) else {
                continue;
            };

            candidates.push(Candidate {
                run_id: run_id.clone(),
                edge: edge.id,
                travel_minutes: minutes_between(clock, arrival),
                detour_minutes: 0.0,
                exposure: self.timeline.score(run_id, arrival, finish),
                score: 0.0,
                leads_on: self.leads_on(run_id, edge.to, finish, covered),
            });
        }

        if candidates.is_empty() {
            return Err(if any_reachable {
                TerminationReason::OutOfTime
            } else {
                TerminationReason::NoReachableRuns
            });
        }

        if candidates.iter().any(|c| c.leads_on) {
            candidates.retain(|c| c.leads_on);
        }

        let closest = candidates
            .iter()
            .map(|c| c.travel_minutes)
            .fold(f64::INFINITY, f64::min);
        for candidate in &mut candidates {
            candidate.detour_minutes = candidate.travel_minutes - closest;
            candidate.score = self.config.sun_weight * candidate.exposure
                - self.config.detour_weight * candidate.detour_minutes;
        }

        candidates
            .into_iter()
            .filter(|c| c.score >= 0.0)
            .max_by(Candidate::rank)
            .ok_or(TerminationReason::NoProductiveMove)
    }

    /// End of a descent starting at `arrival`, if it is over before lifts close.
    fn finish_in_time(&self, arrival: DateTime<Utc>, edge: &Edge) -> Option<DateTime<Utc>> {
        arrival
            .checked_add_signed(edge.duration())
            .filter(|finish| *finish <= self.window.end)
    }

    /// One-step lookahead from the bottom of `run_id`.
    fn leads_on(
        &self,
        run_id: &str,
        bottom: NodeId,
        finish: DateTime<Utc>,
        covered: &BTreeSet<FeatureId>,
    ) -> bool {
        let mut others = self
            .eligible
            .iter()
            .filter(|id| id.as_str() != run_id && !covered.contains(*id))
            .peekable();
        if others.peek().is_none() {
            return true;
        }

        let reach = earliest_arrivals(&self.graph, &self.schedule, bottom, finish);
        others.any(|id| {
            let Some(edge) = self.graph.run_edge(id) else {
                return false;
            };
            reach
                .arrival(edge.from)
                .and_then(|arrival| self.finish_in_time(arrival, edge))
                .is_some()
        })
    }

    /// Append lift legs and the descent; returns the node reached and the new clock.
    fn commit(
        &self,
        reach: &Reachability,
        candidate: &Candidate,
        clock: DateTime<Utc>,
        legs: &mut Vec<RouteLeg>,
    ) -> (NodeId, DateTime<Utc>) {
        let edges = self.graph.edges();
        let run = &edges[candidate.edge];
        let mut time = clock;

        for lift in reach.lifts_to(&self.graph, run.from).unwrap_or_default() {
            let lift = &edges[lift];
            if let Some(window) = self.schedule.window(lift.id) {
                time = time.max(window.start);
            }
            if let crate::graph::EdgeKind::Lift { lift_id } = &lift.kind {
                legs.push(RouteLeg::LiftRide {
                    lift_id: lift_id.clone(),
                    from: self.position(lift.from),
                    to: self.position(lift.to),
                    start_time: time,
                    duration_minutes: lift.duration_minutes(),
                });
            }
            time += lift.duration();
        }

        legs.push(RouteLeg::RunDescent {
            run_id: candidate.run_id.clone(),
            from: self.position(run.from),
            to: self.position(run.to),
            start_time: time,
            duration_minutes: run.duration_minutes(),
            sun_score: candidate.exposure,
        });
        time += run.duration();

        (run.to, time)
    }

    fn position(&self, node: NodeId) -> GeoPoint {
        self.graph
            .node(node)
            .map(|n| n.position)
            .unwrap_or(self.home)
    }
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}
