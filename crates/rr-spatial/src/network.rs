//! Street network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Topology and `edge_base_time` are fixed at build time.  The *conditions*
//! (`edge_factor`, `edge_closed`) are the only mutable part, and they are
//! mutated only through [`close_street`](StreetNetwork::close_street),
//! [`slow_street`](StreetNetwork::slow_street) and
//! [`reset_street`](StreetNetwork::reset_street), which always touch both
//! directions of a street so `u→v` and `v→u` never disagree.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps a continuous `(x, y)` to the nearest
//! intersection, used when a host names a disrupted street by display
//! coordinates instead of node ids.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use rr_core::{EdgeId, GridPoint, NodeId, SimRng};

use crate::router::{DijkstraRouter, Router};
use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── StreetNetwork ─────────────────────────────────────────────────────────────

/// Directed street graph in CSR format with per-edge live conditions.
///
/// Do not construct directly; use [`StreetNetworkBuilder`] or
/// [`StreetNetwork::grid`].
pub struct StreetNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Grid coordinate of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GridPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    pub edge_from: Vec<NodeId>,
    pub edge_to:   Vec<NodeId>,

    /// Free-flow traversal time in simulated seconds.  Always `> 0`.
    pub edge_base_time: Vec<f64>,

    // ── Live conditions ───────────────────────────────────────────────────
    edge_factor: Vec<f64>,
    edge_closed: Vec<bool>,

    // ── Lookups ───────────────────────────────────────────────────────────
    edge_lookup: HashMap<(NodeId, NodeId), EdgeId>,
    node_lookup: HashMap<GridPoint, NodeId>,
    spatial_idx: RTree<NodeEntry>,
}

impl StreetNetwork {
    /// Build a `size × size` Manhattan grid with two-way streets between
    /// 4-neighbours.  Node ids run row-major (`id = y * size + x`).
    ///
    /// Each street gets a base time drawn uniformly from `[1.0, 1.5)`;
    /// horizontal streets are drawn first, then vertical ones, so the same
    /// `rng` state always yields the same weights.
    pub fn grid(size: u32, rng: &mut SimRng) -> Self {
        let n = (size * size) as usize;
        let mut b = StreetNetworkBuilder::with_capacity(n, 4 * n);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                b.add_node(GridPoint::new(x, y));
            }
        }
        let id = |x: u32, y: u32| NodeId(y * size + x);

        for y in 0..size {
            for x in 0..size.saturating_sub(1) {
                let base_time = 1.0 + rng.gen_range(0.0..0.5);
                b.add_street(id(x, y), id(x + 1, y), base_time);
            }
        }
        for x in 0..size {
            for y in 0..size.saturating_sub(1) {
                let base_time = 1.0 + rng.gen_range(0.0..0.5);
                b.add_street(id(x, y), id(x, y + 1), base_time);
            }
        }
        b.build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// The directed edge `u → v`, if the street exists.
    #[inline]
    pub fn edge_between(&self, u: NodeId, v: NodeId) -> Option<EdgeId> {
        self.edge_lookup.get(&(u, v)).copied()
    }

    // ── Positions ─────────────────────────────────────────────────────────

    /// Grid coordinate of `node`.  `None` for ids outside the network.
    #[inline]
    pub fn pos(&self, node: NodeId) -> Option<GridPoint> {
        self.node_pos.get(node.index()).copied()
    }

    /// The node sitting exactly at `point`, if any.
    #[inline]
    pub fn node_at(&self, point: GridPoint) -> Option<NodeId> {
        self.node_lookup.get(&point).copied()
    }

    /// Nearest intersection to a continuous position.  `None` only for an
    /// empty network.
    pub fn snap_to_node(&self, x: f32, y: f32) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&[x, y]).map(|e| e.id)
    }

    /// Symmetric L1 distance between two nodes, in grid blocks.
    ///
    /// Demand weighting and dispatch heuristics only; never a path cost.
    /// Unknown nodes are treated as infinitely far (`u32::MAX`).
    pub fn heuristic_distance(&self, a: NodeId, b: NodeId) -> u32 {
        match (self.pos(a), self.pos(b)) {
            (Some(pa), Some(pb)) => pa.l1_distance(pb),
            _ => u32::MAX,
        }
    }

    // ── Live edge conditions ──────────────────────────────────────────────

    /// Current traversal time of `edge`: `∞` when closed, otherwise
    /// `base_time × factor`.
    #[inline]
    pub fn edge_travel_time(&self, edge: EdgeId) -> f64 {
        let i = edge.index();
        if self.edge_closed[i] {
            f64::INFINITY
        } else {
            self.edge_base_time[i] * self.edge_factor[i]
        }
    }

    /// Current traversal time of `u → v`; `∞` if the street is absent or
    /// closed.
    pub fn travel_time(&self, u: NodeId, v: NodeId) -> f64 {
        match self.edge_between(u, v) {
            Some(e) => self.edge_travel_time(e),
            None => f64::INFINITY,
        }
    }

    pub fn is_closed(&self, u: NodeId, v: NodeId) -> bool {
        self.edge_between(u, v).is_some_and(|e| self.edge_closed[e.index()])
    }

    pub fn congestion_factor(&self, u: NodeId, v: NodeId) -> Option<f64> {
        self.edge_between(u, v).map(|e| self.edge_factor[e.index()])
    }

    /// Close the street between `u` and `v` in both directions.  Idempotent.
    pub fn close_street(&mut self, u: NodeId, v: NodeId) -> SpatialResult<()> {
        let edges = self.street_edges(u, v)?;
        for e in edges.into_iter().flatten() {
            self.edge_closed[e.index()] = true;
        }
        log::debug!("closed street {u} <-> {v}");
        Ok(())
    }

    /// Set the congestion factor of the street between `u` and `v` in both
    /// directions (last write wins).  `factor` must be finite and `>= 1`.
    pub fn slow_street(&mut self, u: NodeId, v: NodeId, factor: f64) -> SpatialResult<()> {
        if !factor.is_finite() || factor < 1.0 {
            return Err(SpatialError::InvalidFactor(factor));
        }
        let edges = self.street_edges(u, v)?;
        for e in edges.into_iter().flatten() {
            self.edge_factor[e.index()] = factor;
        }
        log::debug!("street {u} <-> {v} slowed by x{factor}");
        Ok(())
    }

    /// Reopen the street between `u` and `v`, keeping any congestion factor.
    pub fn open_street(&mut self, u: NodeId, v: NodeId) -> SpatialResult<()> {
        let edges = self.street_edges(u, v)?;
        for e in edges.into_iter().flatten() {
            self.edge_closed[e.index()] = false;
        }
        Ok(())
    }

    /// Reopen the street between `u` and `v` and restore free flow.
    pub fn reset_street(&mut self, u: NodeId, v: NodeId) -> SpatialResult<()> {
        let edges = self.street_edges(u, v)?;
        for e in edges.into_iter().flatten() {
            self.edge_closed[e.index()] = false;
            self.edge_factor[e.index()] = 1.0;
        }
        Ok(())
    }

    /// Reopen every street and clear every congestion factor.
    pub fn reset_conditions(&mut self) {
        self.edge_closed.iter_mut().for_each(|c| *c = false);
        self.edge_factor.iter_mut().for_each(|f| *f = 1.0);
    }

    /// Number of directed edges currently closed.
    pub fn closed_edge_count(&self) -> usize {
        self.edge_closed.iter().filter(|&&c| c).count()
    }

    /// Both directions of a street; at least one must exist.
    fn street_edges(&self, u: NodeId, v: NodeId) -> SpatialResult<[Option<EdgeId>; 2]> {
        let pair = [self.edge_between(u, v), self.edge_between(v, u)];
        if pair.iter().all(Option::is_none) {
            return Err(SpatialError::EdgeNotFound { from: u, to: v });
        }
        Ok(pair)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Fastest node sequence from `start` to `end` under current conditions.
    ///
    /// Returns `[start]` when `start == end` and an empty `Vec` when no open
    /// path exists.  Closed streets are excluded outright.
    pub fn shortest_path(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        match DijkstraRouter.route(self, start, end) {
            Ok(route) => route.nodes,
            Err(_) => Vec::new(),
        }
    }
}

// ── StreetNetworkBuilder ──────────────────────────────────────────────────────

/// Construct a [`StreetNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use rr_core::GridPoint;
/// use rr_spatial::StreetNetworkBuilder;
///
/// let mut b = StreetNetworkBuilder::new();
/// let a = b.add_node(GridPoint::new(0, 0));
/// let c = b.add_node(GridPoint::new(1, 0));
/// b.add_street(a, c, 1.2);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct StreetNetworkBuilder {
    nodes:     Vec<GridPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    base_time: f64,
}

impl StreetNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add an intersection and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GridPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge.  Non-positive or non-finite base times are
    /// clamped up to a small positive value so `travel_time > 0` always holds.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, base_time: f64) {
        let base_time = if base_time.is_finite() && base_time > 0.0 { base_time } else { f64::EPSILON };
        self.raw_edges.push(RawEdge { from, to, base_time });
    }

    /// Convenience: add edges in **both directions** for a two-way street.
    pub fn add_street(&mut self, a: NodeId, b: NodeId, base_time: f64) {
        self.add_directed_edge(a, b, base_time);
        self.add_directed_edge(b, a, base_time);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`StreetNetwork`].
    ///
    /// Edges referencing unknown nodes are dropped.  Duplicate `(u, v)` pairs
    /// keep the first occurrence in the lookup table.
    pub fn build(self) -> StreetNetwork {
        let node_count = self.nodes.len();

        let mut raw: Vec<RawEdge> = self
            .raw_edges
            .into_iter()
            .filter(|e| e.from.index() < node_count && e.to.index() < node_count)
            .collect();
        // Stable sort keeps insertion order within a node, so edge ids are
        // reproducible for a given build sequence.
        raw.sort_by_key(|e| e.from.0);
        let edge_count = raw.len();

        let edge_from:      Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_base_time: Vec<f64>    = raw.iter().map(|e| e.base_time).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let mut edge_lookup = HashMap::with_capacity(edge_count);
        for (i, e) in raw.iter().enumerate() {
            edge_lookup.entry((e.from, e.to)).or_insert(EdgeId(i as u32));
        }

        let mut node_lookup = HashMap::with_capacity(node_count);
        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                node_lookup.entry(pos).or_insert(NodeId(i as u32));
                NodeEntry { point: pos.to_array(), id: NodeId(i as u32) }
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        StreetNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_base_time,
            edge_factor: vec![1.0; edge_count],
            edge_closed: vec![false; edge_count],
            edge_lookup,
            node_lookup,
            spatial_idx,
        }
    }
}

impl Default for StreetNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
