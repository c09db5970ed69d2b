//! Timed disruptions: street closures, traffic slowdowns and demand surges.
//!
//! A disruption is applied immediately and reverted when simulated time
//! reaches `started_at + duration`.  Reverting only undoes its own effect:
//! an expiring closure reopens the street but keeps any slowdown, an expiring
//! slowdown restores free flow but keeps the street closed if a closure is
//! still active on it.

use std::fmt;
use std::str::FromStr;

use rr_core::{GridPoint, NodeId, SimRng, StopId};
use rr_demand::{DemandModel, RiderLedger, SurgeMap};
use rr_spatial::{StopRegistry, StreetNetwork};

use crate::{SimError, SimResult};

// ── Kind & parameters ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionKind {
    Closure,
    Traffic,
    Surge,
}

impl DisruptionKind {
    /// Lifetime used when the caller gives none, in simulated seconds.
    pub fn default_duration(self) -> f64 {
        match self {
            DisruptionKind::Closure => 600.0,
            DisruptionKind::Traffic => 300.0,
            DisruptionKind::Surge => 600.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisruptionKind::Closure => "closure",
            DisruptionKind::Traffic => "traffic",
            DisruptionKind::Surge => "surge",
        }
    }
}

impl fmt::Display for DisruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisruptionKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closure" => Ok(DisruptionKind::Closure),
            "traffic" => Ok(DisruptionKind::Traffic),
            "surge" => Ok(DisruptionKind::Surge),
            _ => Err(SimError::UnknownDisruption(s.to_string())),
        }
    }
}

/// Loosely-typed request, as a host would deserialize it from JSON.
///
/// | Kind      | Required                    | Optional   |
/// |-----------|-----------------------------|------------|
/// | `closure` | `edge` or `edge_at`                   | `duration` |
/// | `traffic` | `edge` or `edge_at`, `factor` (>= 1)  | `duration` |
/// | `surge`   | `stops`, `factor` (0..=100)           | `duration` |
///
/// `edge_at` gives the street by two continuous positions, each snapped to
/// the nearest intersection; `edge` wins when both are set.
/// `duration` defaults per kind; `f64::INFINITY` keeps the disruption until
/// it is cleared.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DisruptionParams {
    pub edge:     Option<(NodeId, NodeId)>,
    pub edge_at:  Option<([f32; 2], [f32; 2])>,
    pub stops:    Vec<StopId>,
    pub factor:   Option<f64>,
    pub duration: Option<f64>,
}

impl DisruptionParams {
    pub fn closure(from: NodeId, to: NodeId) -> Self {
        Self { edge: Some((from, to)), ..Self::default() }
    }

    /// Closure of the street nearest to two display positions.
    pub fn closure_at(from: [f32; 2], to: [f32; 2]) -> Self {
        Self { edge_at: Some((from, to)), ..Self::default() }
    }

    pub fn traffic(from: NodeId, to: NodeId, factor: f64) -> Self {
        Self { edge: Some((from, to)), factor: Some(factor), ..Self::default() }
    }

    pub fn surge(stops: Vec<StopId>, factor: f64) -> Self {
        Self { stops, factor: Some(factor), ..Self::default() }
    }

    pub fn lasting(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

// ── Disruption ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DisruptionEffect {
    Closure { from: NodeId, to: NodeId },
    Traffic { from: NodeId, to: NodeId, factor: f64 },
    Surge { stops: Vec<StopId>, factor: f64 },
}

impl DisruptionEffect {
    pub fn kind(&self) -> DisruptionKind {
        match self {
            DisruptionEffect::Closure { .. } => DisruptionKind::Closure,
            DisruptionEffect::Traffic { .. } => DisruptionKind::Traffic,
            DisruptionEffect::Surge { .. } => DisruptionKind::Surge,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Disruption {
    /// `"<kind>_<n>"`, `n` shared across kinds.
    pub id:         String,
    pub effect:     DisruptionEffect,
    pub started_at: f64,
    pub duration:   f64,
}

impl Disruption {
    #[inline]
    pub fn expires_at(&self) -> f64 {
        self.started_at + self.duration
    }
}

// ── DisruptionManager ─────────────────────────────────────────────────────────

/// Owns the active disruption list and the history of reverted ones.
///
/// The manager never holds the network or demand model; every mutating call
/// borrows them so the simulation remains their only owner.
pub struct DisruptionManager {
    active:  Vec<Disruption>,
    history: Vec<Disruption>,
    next_id: u64,
    rng:     SimRng,
}

impl DisruptionManager {
    pub fn new(seed: u64) -> Self {
        Self { active: Vec::new(), history: Vec::new(), next_id: 0, rng: SimRng::new(seed) }
    }

    /// Drop all records without reverting anything.  Used on episode reset,
    /// where the network and demand model are reset wholesale.
    pub fn reset(&mut self, seed: u64) {
        self.active.clear();
        self.history.clear();
        self.next_id = 0;
        self.rng = SimRng::new(seed);
    }

    pub fn active(&self) -> &[Disruption] {
        &self.active
    }

    pub fn history(&self) -> &[Disruption] {
        &self.history
    }

    /// Validate `params` for `kind`, apply the effect and record it.
    ///
    /// Nothing is mutated unless every parameter checks out.
    pub fn apply(
        &mut self,
        kind:    DisruptionKind,
        params:  &DisruptionParams,
        now:     f64,
        network: &mut StreetNetwork,
        demand:  &mut DemandModel,
    ) -> SimResult<String> {
        let duration = params.duration.unwrap_or_else(|| kind.default_duration());
        if duration.is_nan() || duration <= 0.0 {
            return Err(SimError::InvalidDisruption(format!("duration must be positive, got {duration}")));
        }

        let effect = match kind {
            DisruptionKind::Closure => {
                let (from, to) = require_edge(params, network)?;
                network.close_street(from, to)?;
                DisruptionEffect::Closure { from, to }
            }
            DisruptionKind::Traffic => {
                let (from, to) = require_edge(params, network)?;
                let factor = require_factor(params)?;
                network.slow_street(from, to, factor)?;
                DisruptionEffect::Traffic { from, to, factor }
            }
            DisruptionKind::Surge => {
                let factor = require_factor(params)?;
                if params.stops.is_empty() {
                    return Err(SimError::InvalidDisruption("surge needs at least one stop".into()));
                }
                SurgeMap::validate(factor)?;
                if let Some(&bad) = params.stops.iter().find(|&&s| demand.popularity(s).is_none()) {
                    return Err(rr_demand::DemandError::UnknownStop(bad).into());
                }
                for &stop in &params.stops {
                    demand.add_surge(stop, factor)?;
                }
                DisruptionEffect::Surge { stops: params.stops.clone(), factor }
            }
        };

        let id = format!("{}_{}", kind, self.next_id);
        self.next_id += 1;
        log::info!("disruption {id} applied at t={now:.1}s for {duration}s");
        self.active.push(Disruption { id: id.clone(), effect, started_at: now, duration });
        Ok(id)
    }

    /// Revert every disruption whose lifetime has ended.  Returns the number
    /// expired.
    pub fn expire(&mut self, now: f64, network: &mut StreetNetwork, demand: &mut DemandModel) -> usize {
        let (expired, still): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.active).into_iter().partition(|d| now >= d.expires_at());
        self.active = still;
        let n = expired.len();
        for d in expired {
            log::info!("disruption {} expired at t={now:.1}s", d.id);
            revert(&d.effect, network, demand);
            self.history.push(d);
        }
        n
    }

    /// Revert every active disruption now.
    pub fn clear(&mut self, network: &mut StreetNetwork, demand: &mut DemandModel) {
        for d in std::mem::take(&mut self.active) {
            revert(&d.effect, network, demand);
            self.history.push(d);
        }
    }

    /// A random street inside the central band of a `grid_size` grid (the
    /// central 8×8 block of a 20×20 grid).
    pub fn random_central_edge(&mut self, network: &StreetNetwork, grid_size: u32) -> Option<(NodeId, NodeId)> {
        let lo = (grid_size as f64 * 0.3).floor() as i32;
        let hi = ((grid_size as f64 * 0.7).floor() as i32).max(lo + 1);
        let x = self.rng.gen_range(lo..hi);
        let y = self.rng.gen_range(lo..hi);
        let from = network.node_at(GridPoint::new(x, y))?;
        let neighbours = [GridPoint::new(x + 1, y), GridPoint::new(x, y + 1), GridPoint::new(x - 1, y)];
        let start = self.rng.gen_range(0..neighbours.len());
        (0..neighbours.len())
            .map(|k| neighbours[(start + k) % neighbours.len()])
            .filter_map(|p| network.node_at(p))
            .find(|&to| network.edge_between(from, to).is_some())
            .map(|to| (from, to))
    }
}

/// The `n` stops with the longest queues, longest first, ties by ascending id.
pub fn high_demand_stops(ledger: &RiderLedger, stops: &StopRegistry, n: usize) -> Vec<StopId> {
    let mut ranked: Vec<(usize, StopId)> = stops.ids().map(|s| (ledger.queue_length(s), s)).collect();
    ranked.sort_by_key(|&(q, s)| (std::cmp::Reverse(q), s));
    ranked.into_iter().take(n).map(|(_, s)| s).collect()
}

fn require_edge(params: &DisruptionParams, network: &StreetNetwork) -> SimResult<(NodeId, NodeId)> {
    if let Some(edge) = params.edge {
        return Ok(edge);
    }
    let ([ax, ay], [bx, by]) =
        params.edge_at.ok_or_else(|| SimError::InvalidDisruption("missing edge".into()))?;
    match (network.snap_to_node(ax, ay), network.snap_to_node(bx, by)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(SimError::InvalidDisruption("no intersection to snap to".into())),
    }
}

fn require_factor(params: &DisruptionParams) -> SimResult<f64> {
    params.factor.ok_or_else(|| SimError::InvalidDisruption("missing factor".into()))
}

fn revert(effect: &DisruptionEffect, network: &mut StreetNetwork, demand: &mut DemandModel) {
    // The street existed when the disruption was applied, so these cannot fail.
    match effect {
        DisruptionEffect::Closure { from, to } => {
            let _ = network.open_street(*from, *to);
        }
        DisruptionEffect::Traffic { from, to, .. } => {
            let _ = network.slow_street(*from, *to, 1.0);
        }
        DisruptionEffect::Surge { stops, .. } => {
            for &s in stops {
                demand.remove_surge(s);
            }
        }
    }
}
