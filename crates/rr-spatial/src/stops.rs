//! Serviced stops and their spatial index.
//!
//! Stops are a fixed, dense-id subset of the grid's intersections.  The
//! registry is immutable after construction; queue state lives in the rider
//! ledger, not here.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use rr_core::{GridPoint, NodeId, SimRng, StopId};

use crate::network::StreetNetwork;
use crate::{SpatialError, SpatialResult};

/// Probability that a node inside the central band becomes a stop.
const CENTRAL_STOP_P: f64 = 0.4;
/// Probability that a node outside the central band becomes a stop.
const OUTER_STOP_P: f64 = 0.15;

// ── Stop ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    pub id:   StopId,
    pub node: NodeId,
    pub pos:  GridPoint,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct StopEntry {
    point: [i32; 2],
    id:    StopId,
}

impl RTreeObject for StopEntry {
    type Envelope = AABB<[i32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopEntry {
    fn distance_2(&self, point: &[i32; 2]) -> i32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── StopRegistry ──────────────────────────────────────────────────────────────

/// Dense table of stops, indexed by `StopId`.
pub struct StopRegistry {
    stops:   Vec<Stop>,
    by_node: HashMap<NodeId, StopId>,
    index:   RTree<StopEntry>,
}

impl StopRegistry {
    /// Register the given nodes as stops, assigning ids in order.
    ///
    /// Duplicate nodes are ignored after their first occurrence.
    pub fn from_nodes(network: &StreetNetwork, nodes: &[NodeId]) -> SpatialResult<Self> {
        let mut stops = Vec::with_capacity(nodes.len());
        let mut by_node = HashMap::with_capacity(nodes.len());
        for &node in nodes {
            let pos = network.pos(node).ok_or(SpatialError::NodeNotFound(node))?;
            if by_node.contains_key(&node) {
                continue;
            }
            let id = StopId(stops.len() as u32);
            by_node.insert(node, id);
            stops.push(Stop { id, node, pos });
        }
        let index = RTree::bulk_load(
            stops.iter().map(|s| StopEntry { point: [s.pos.x, s.pos.y], id: s.id }).collect(),
        );
        Ok(Self { stops, by_node, index })
    }

    /// Centre-biased placement on a `grid_size × grid_size` network.
    ///
    /// Nodes inside the central band `[0.3·size, 0.7·size)` on both axes are
    /// picked with probability 0.4, the rest with 0.15.  The candidate list is
    /// padded with uniformly drawn unused nodes until it holds `count` entries
    /// and then truncated to `count`.
    pub fn generate(network: &StreetNetwork, grid_size: u32, count: usize, rng: &mut SimRng) -> SpatialResult<Self> {
        let available = network.node_count();
        if count > available {
            return Err(SpatialError::TooManyStops { requested: count, available });
        }
        let lo = (grid_size as f64 * 0.3).floor() as i32;
        let hi = (grid_size as f64 * 0.7).floor() as i32;
        let central = |p: GridPoint| (lo..hi).contains(&p.x) && (lo..hi).contains(&p.y);
        let node_of = |x: i32, y: i32| network.node_at(GridPoint::new(x, y));
        let size = grid_size as i32;

        let mut picked: Vec<NodeId> = Vec::with_capacity(count * 2);
        for x in lo..hi {
            for y in lo..hi {
                if let Some(n) = node_of(x, y) {
                    if rng.gen_bool(CENTRAL_STOP_P) {
                        picked.push(n);
                    }
                }
            }
        }
        for x in 0..size {
            for y in 0..size {
                if central(GridPoint::new(x, y)) {
                    continue;
                }
                if let Some(n) = node_of(x, y) {
                    if rng.gen_bool(OUTER_STOP_P) {
                        picked.push(n);
                    }
                }
            }
        }

        if picked.len() < count {
            let mut taken = vec![false; available];
            for n in &picked {
                taken[n.index()] = true;
            }
            let mut remaining: Vec<NodeId> =
                (0..available as u32).map(NodeId).filter(|n| !taken[n.index()]).collect();
            while picked.len() < count {
                let i = rng.gen_range(0..remaining.len());
                picked.push(remaining.swap_remove(i));
            }
        }
        picked.truncate(count);

        log::debug!("placed {} stops on a {grid_size}x{grid_size} grid", picked.len());
        Self::from_nodes(network, &picked)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    #[inline]
    pub fn get(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(id.index())
    }

    /// Like [`get`](Self::get) but as a `Result`.
    pub fn require(&self, id: StopId) -> SpatialResult<&Stop> {
        self.get(id).ok_or(SpatialError::StopNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stop> + '_ {
        self.stops.iter()
    }

    /// All stop ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = StopId> + '_ {
        self.stops.iter().map(|s| s.id)
    }

    /// The stop located at `node`, if any.
    #[inline]
    pub fn stop_at(&self, node: NodeId) -> Option<StopId> {
        self.by_node.get(&node).copied()
    }

    pub fn node(&self, id: StopId) -> Option<NodeId> {
        self.get(id).map(|s| s.node)
    }

    pub fn pos(&self, id: StopId) -> Option<GridPoint> {
        self.get(id).map(|s| s.pos)
    }

    /// L1 distance between two stops.  Unknown ids are infinitely far.
    pub fn distance(&self, a: StopId, b: StopId) -> u32 {
        match (self.pos(a), self.pos(b)) {
            (Some(pa), Some(pb)) => pa.l1_distance(pb),
            _ => u32::MAX,
        }
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Stops whose L1 distance from `center` is `<= radius`, ascending id.
    pub fn within_l1(&self, center: GridPoint, radius: u32) -> Vec<StopId> {
        let r = radius.min(i32::MAX as u32) as i32;
        let envelope = AABB::from_corners(
            [center.x.saturating_sub(r), center.y.saturating_sub(r)],
            [center.x.saturating_add(r), center.y.saturating_add(r)],
        );
        let mut ids: Vec<StopId> = self
            .index
            .locate_in_envelope(&envelope)
            .filter(|e| GridPoint::new(e.point[0], e.point[1]).l1_distance(center) <= radius)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Closest stop to `point` by L1 distance, skipping `exclude`.  Ties go
    /// to the lowest id.
    pub fn nearest_to(&self, point: GridPoint, exclude: Option<StopId>) -> Option<StopId> {
        self.stops
            .iter()
            .filter(|s| Some(s.id) != exclude)
            .min_by_key(|s| (s.pos.l1_distance(point), s.id))
            .map(|s| s.id)
    }
}
