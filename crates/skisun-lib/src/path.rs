use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::exposure::TimeWindow;
use crate::graph::{EdgeId, NodeId, SkiGraph};

/// Departure windows for lift edges, indexed by edge id.
///
/// An edge without a window cannot be boarded at all.
#[derive(Debug, Clone, Default)]
pub struct LiftSchedule {
    windows: Vec<Option<TimeWindow>>,
}

impl LiftSchedule {
    pub fn new(graph: &SkiGraph) -> Self {
        Self {
            windows: vec![None; graph.edges().len()],
        }
    }

    pub fn set(&mut self, edge: EdgeId, window: Option<TimeWindow>) {
        if let Some(slot) = self.windows.get_mut(edge) {
            *slot = window;
        }
    }

    pub fn window(&self, edge: EdgeId) -> Option<TimeWindow> {
        self.windows.get(edge).copied().flatten()
    }
}

/// Earliest arrival at every node reachable by lifts from a start node.
#[derive(Debug, Clone)]
pub struct Reachability {
    start: NodeId,
    arrival: Vec<Option<DateTime<Utc>>>,
    parent: Vec<Option<EdgeId>>,
}

impl Reachability {
    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn arrival(&self, node: NodeId) -> Option<DateTime<Utc>> {
        self.arrival.get(node).copied().flatten()
    }

    /// Lift edges, in riding order, leading from the start node to `node`.
    pub fn lifts_to(&self, graph: &SkiGraph, node: NodeId) -> Option<Vec<EdgeId>> {
        self.arrival(node)?;
        let mut path = Vec::new();
        let mut current = node;
        while current != self.start {
            let edge = self.parent.get(current).copied().flatten()?;
            path.push(edge);
            current = graph.edge(edge)?.from;
        }
        path.reverse();
        Some(path)
    }
}

/// Time-dependent Dijkstra over lift edges only.
///
/// A lift can be boarded at `max(arrival, window.start)` as long as that is
/// not after `window.end`; waiting at a station is allowed.
pub fn earliest_arrivals(
    graph: &SkiGraph,
    schedule: &LiftSchedule,
    start: NodeId,
    depart_at: DateTime<Utc>,
) -> Reachability {
    let node_count = graph.nodes().len();
    let mut arrival: Vec<Option<DateTime<Utc>>> = vec![None; node_count];
    let mut parent: Vec<Option<EdgeId>> = vec![None; node_count];
    let mut queue = BinaryHeap::new();

    if start < node_count {
        arrival[start] = Some(depart_at);
        queue.push(QueueEntry::new(start, depart_at));
    }

    while let Some(entry) = queue.pop() {
        match arrival[entry.node] {
            Some(best) if best < entry.time => continue,
            None => continue,
            _ => {}
        }

        for edge in graph.outgoing(entry.node).filter(|edge| edge.is_lift()) {
            let Some(window) = schedule.window(edge.id) else {
                continue;
            };
            let board = entry.time.max(window.start);
            if board > window.end {
                continue;
            }
            let Some(reached) = board.checked_add_signed(edge.duration()) else {
                continue;
            };
            let improves = arrival[edge.to].map_or(true, |known| reached < known);
            if improves {
                arrival[edge.to] = Some(reached);
                parent[edge.to] = Some(edge.id);
                queue.push(QueueEntry::new(edge.to, reached));
            }
        }
    }

    Reachability {
        start,
        arrival,
        parent,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    time: DateTime<Utc>,
}

impl QueueEntry {
    fn new(node: NodeId, time: DateTime<Utc>) -> Self {
        Self { node, time }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by arrival time.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn queue_pops_earliest_first() {
        let t0 = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry::new(1, t0 + TimeDelta::minutes(5)));
        heap.push(QueueEntry::new(2, t0));
        heap.push(QueueEntry::new(0, t0));
        let order: Vec<NodeId> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }
}
