//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Buses plan through the [`Router`] trait, so a host can swap in A* or a
//! precomputed table without touching the fleet code.  The default
//! [`DijkstraRouter`] recomputes from scratch against the network's live
//! conditions on every call; nothing is cached across closures.
//!
//! # Cost units
//!
//! Travel times are `f64` seconds on the network, but the priority queue runs
//! on integer micro-seconds (`u64`) so ordering is total and tie-breaking on
//! `NodeId` is exact.  `Route::total_time` is reported back in seconds.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rr_core::{EdgeId, NodeId};

use crate::network::StreetNetwork;
use crate::SpatialError;

/// Seconds → integer cost units.
const COST_SCALE: f64 = 1_000_000.0;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the node sequence (both endpoints
/// included) and its total travel time under the conditions at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    /// Sum of edge travel times in seconds.
    pub total_time: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of edges to traverse.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
pub trait Router {
    /// Compute a route from `from` to `to` over open streets.
    ///
    /// `from == to` yields a single-node route; an unreachable target yields
    /// [`SpatialError::NoRoute`].
    fn route(&self, network: &StreetNetwork, from: NodeId, to: NodeId) -> Result<Route, SpatialError>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra over the CSR street graph.  Closed streets (infinite
/// travel time) are never relaxed.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &StreetNetwork, from: NodeId, to: NodeId) -> Result<Route, SpatialError> {
        dijkstra(network, from, to)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Edge cost in integer units, or `None` for a closed street.
#[inline]
fn edge_cost(network: &StreetNetwork, edge: EdgeId) -> Option<u64> {
    let t = network.edge_travel_time(edge);
    t.is_finite().then(|| (t * COST_SCALE).round() as u64)
}

fn dijkstra(network: &StreetNetwork, from: NodeId, to: NodeId) -> Result<Route, SpatialError> {
    for node in [from, to] {
        if !network.contains(node) {
            return Err(SpatialError::NodeNotFound(node));
        }
    }
    if from == to {
        return Ok(Route { nodes: vec![from], total_time: 0.0 });
    }

    let n = network.node_count();
    let mut dist      = vec![u64::MAX; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap on (cost, node); NodeId breaks ties deterministically.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let Some(w) = edge_cost(network, edge) else { continue };
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(w);

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(network: &StreetNetwork, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Route {
    let mut nodes = vec![to];
    let mut total_time = 0.0;
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        total_time += network.edge_travel_time(e);
        cur = network.edge_from[e.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, total_time }
}
