use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::GeoPoint;
use crate::topology::{Difficulty, FeatureId, LiftDescriptor, RunDescriptor, SkiAreaTopology};

/// Index of a node within [`SkiGraph::nodes`].
pub type NodeId = usize;

/// Index of an edge within [`SkiGraph::edges`].
pub type EdgeId = usize;

/// Assumed descent speed per difficulty, in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescentSpeeds {
    pub novice: f64,
    pub easy: f64,
    pub intermediate: f64,
    pub advanced: f64,
    pub expert: f64,
    pub unknown: f64,
}

impl Default for DescentSpeeds {
    fn default() -> Self {
        Self {
            novice: 12.0,
            easy: 16.0,
            intermediate: 20.0,
            advanced: 24.0,
            expert: 24.0,
            unknown: 16.0,
        }
    }
}

impl DescentSpeeds {
    pub fn kmh(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Novice => self.novice,
            Difficulty::Easy => self.easy,
            Difficulty::Intermediate => self.intermediate,
            Difficulty::Advanced => self.advanced,
            Difficulty::Expert => self.expert,
            Difficulty::Unknown => self.unknown,
        }
    }
}

/// Options controlling graph construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphBuildOptions {
    /// Endpoints closer than this are merged into one node.
    pub cluster_radius_meters: f64,
    pub descent_speeds: DescentSpeeds,
    /// Fixed allowance added to every lift ride for queueing and boarding.
    pub lift_boarding_seconds: i64,
}

impl Default for GraphBuildOptions {
    fn default() -> Self {
        Self {
            cluster_radius_meters: 40.0,
            descent_speeds: DescentSpeeds::default(),
            lift_boarding_seconds: 60,
        }
    }
}

/// Junction where runs and lifts meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: GeoPoint,
}

/// Classification for the edge used in the ski graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    Lift { lift_id: FeatureId },
    Run {
        run_id: FeatureId,
        difficulty: Difficulty,
    },
}

/// Directed edge: uphill for lifts, downhill for runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub length_meters: f64,
    pub duration_seconds: i64,
}

impl Edge {
    pub fn is_lift(&self) -> bool {
        matches!(self.kind, EdgeKind::Lift { .. })
    }

    /// Traversal time; saturates for durations `TimeDelta` cannot hold.
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.duration_seconds).unwrap_or(TimeDelta::MAX)
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds as f64 / 60.0
    }
}

/// Arena-indexed connectivity graph of one ski area.
#[derive(Debug, Clone, Default)]
pub struct SkiGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    run_edges: BTreeMap<FeatureId, EdgeId>,
    lift_edges: BTreeMap<FeatureId, EdgeId>,
}

impl SkiGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Edges leaving a node.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&edge| &self.edges[edge])
    }

    pub fn run_edge(&self, run_id: &str) -> Option<&Edge> {
        self.run_edges.get(run_id).map(|&edge| &self.edges[edge])
    }

    pub fn lift_edge(&self, lift_id: &str) -> Option<&Edge> {
        self.lift_edges.get(lift_id).map(|&edge| &self.edges[edge])
    }

    /// Closest node to a point and its distance in metres.
    ///
    /// Ties resolve to the lower node id.
    pub fn nearest_node(&self, point: &GeoPoint) -> Option<(NodeId, f64)> {
        self.nodes
            .iter()
            .map(|node| (node.id, node.position.distance_to(point)))
            .fold(None, |best, candidate| match best {
                Some((_, distance)) if distance <= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    fn node_for(&mut self, point: GeoPoint, radius: f64) -> NodeId {
        if let Some((id, distance)) = self.nearest_node(&point) {
            if distance <= radius {
                return id;
            }
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            position: point,
        });
        self.outgoing.push(Vec::new());
        id
    }

    fn push_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        length_meters: f64,
        duration_seconds: i64,
    ) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge {
            id,
            from,
            to,
            kind,
            length_meters,
            duration_seconds,
        });
        self.outgoing[from].push(id);
        id
    }
}

/// Build the graph from every open run and open lift of a topology.
///
/// Features are inserted in id order so node and edge indices are stable for
/// identical input.
pub fn build_graph(topology: &SkiAreaTopology, options: &GraphBuildOptions) -> SkiGraph {
    let mut runs: Vec<&RunDescriptor> = topology.runs.iter().filter(|r| r.is_open).collect();
    runs.sort_by(|a, b| a.id.cmp(&b.id));
    let mut lifts: Vec<&LiftDescriptor> = topology.open_lifts().collect();
    lifts.sort_by(|a, b| a.id.cmp(&b.id));

    let mut graph = SkiGraph::default();
    let radius = options.cluster_radius_meters;

    for run in runs {
        let (Some(top), Some(bottom)) = (run.top(), run.bottom()) else {
            continue;
        };
        let from = graph.node_for(top, radius);
        let to = graph.node_for(bottom, radius);
        let length = run.length_meters();
        let speed_mps = options.descent_speeds.kmh(run.difficulty) / 3.6;
        let duration = travel_seconds(length, speed_mps);
        let edge = graph.push_edge(
            from,
            to,
            EdgeKind::Run {
                run_id: run.id.clone(),
                difficulty: run.difficulty,
            },
            length,
            duration,
        );
        graph.run_edges.insert(run.id.clone(), edge);
    }

    for lift in lifts {
        let (Some(base), Some(top)) = (lift.base(), lift.top()) else {
            continue;
        };
        let from = graph.node_for(base, radius);
        let to = graph.node_for(top, radius);
        let length = lift.length_meters();
        let duration = travel_seconds(length, lift.lift_type.line_speed_mps())
            .saturating_add(options.lift_boarding_seconds);
        let edge = graph.push_edge(
            from,
            to,
            EdgeKind::Lift {
                lift_id: lift.id.clone(),
            },
            length,
            duration,
        );
        graph.lift_edges.insert(lift.id.clone(), edge);
    }

    debug!(
        ski_area = %topology.id,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built ski graph"
    );
    graph
}

fn travel_seconds(length_meters: f64, speed_mps: f64) -> i64 {
    if speed_mps <= 0.0 || !speed_mps.is_finite() {
        return 0;
    }
    (length_meters / speed_mps).ceil().max(1.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_time_rounds_up_to_whole_seconds() {
        assert_eq!(travel_seconds(100.0, 3.0), 34);
        assert_eq!(travel_seconds(0.0, 3.0), 1);
        assert_eq!(travel_seconds(100.0, 0.0), 0);
        assert_eq!(travel_seconds(f64::MAX, 1e-300), i64::MAX);
    }

    #[test]
    fn oversized_durations_saturate() {
        let edge = Edge {
            id: 0,
            from: 0,
            to: 1,
            kind: EdgeKind::Lift {
                lift_id: "l".to_string(),
            },
            length_meters: 1.0,
            duration_seconds: i64::MAX,
        };
        assert_eq!(edge.duration(), TimeDelta::MAX);
    }

    #[test]
    fn descent_speed_lookup_matches_difficulty() {
        let speeds = DescentSpeeds::default();
        assert_eq!(speeds.kmh(Difficulty::Novice), 12.0);
        assert_eq!(speeds.kmh(Difficulty::Expert), 24.0);
    }
}
