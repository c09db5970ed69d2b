//! Reward shaping for the learned fleet.
//!
//! ```text
//! reward = w_wait      × mean_wait / base_wait
//!        + w_overcrowd × load_std  / base_std
//!        + w_distance  × max(0, Δ mean_distance − base_distance)
//!        + w_replan    × max(0, Δ mean_replans)
//! ```
//!
//! Δ terms compare against the previous call only; the first call after
//! construction or [`ScoreModel::reset`] sees Δ = 0.

use rr_demand::WaitStats;
use rr_fleet::FleetStats;

/// Term weights.  All negative: every term is a penalty.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreWeights {
    pub wait:      f64,
    pub overcrowd: f64,
    pub distance:  f64,
    pub replan:    f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { wait: -1.0, overcrowd: -2.0, distance: -0.1, replan: -0.05 }
    }
}

/// Normalisers for the weighted terms.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBaselines {
    pub mean_wait:        f64,
    pub load_std:         f64,
    pub distance_per_bus: f64,
}

impl Default for ScoreBaselines {
    fn default() -> Self {
        Self { mean_wait: 10.0, load_std: 5.0, distance_per_bus: 2.0 }
    }
}

/// Every weighted term of the last reward plus the raw metrics behind it.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RewardBreakdown {
    pub wait_term:      f64,
    pub overcrowd_term: f64,
    pub distance_term:  f64,
    pub replan_term:    f64,
    pub total:          f64,

    pub mean_wait:      f64,
    pub load_std:       f64,
    pub delta_distance: f64,
    pub delta_replans:  f64,
}

#[derive(Clone, Copy, Debug)]
struct Snapshot {
    mean_distance: f64,
    mean_replans:  f64,
}

#[derive(Clone, Debug, Default)]
pub struct ScoreModel {
    pub weights:   ScoreWeights,
    pub baselines: ScoreBaselines,
    previous:      Option<Snapshot>,
    last:          RewardBreakdown,
}

impl ScoreModel {
    pub fn new(weights: ScoreWeights, baselines: ScoreBaselines) -> Self {
        Self { weights, baselines, previous: None, last: RewardBreakdown::default() }
    }

    /// Score one tick and retain its snapshot for the next Δ.
    pub fn score(&mut self, waits: &WaitStats, fleet: &FleetStats) -> f64 {
        let current = Snapshot { mean_distance: fleet.mean_distance, mean_replans: fleet.mean_replans };
        let (delta_distance, delta_replans) = match self.previous {
            Some(prev) => (
                current.mean_distance - prev.mean_distance,
                current.mean_replans - prev.mean_replans,
            ),
            None => (0.0, 0.0),
        };
        self.previous = Some(current);

        let w = &self.weights;
        let b = &self.baselines;
        let wait_term = w.wait * ratio(waits.mean, b.mean_wait);
        let overcrowd_term = w.overcrowd * ratio(fleet.load_std, b.load_std);
        let distance_term = w.distance * (delta_distance - b.distance_per_bus).max(0.0);
        let replan_term = w.replan * delta_replans.max(0.0);
        let total = wait_term + overcrowd_term + distance_term + replan_term;

        self.last = RewardBreakdown {
            wait_term,
            overcrowd_term,
            distance_term,
            replan_term,
            total,
            mean_wait: waits.mean,
            load_std: fleet.load_std,
            delta_distance,
            delta_replans,
        };
        total
    }

    pub fn breakdown(&self) -> &RewardBreakdown {
        &self.last
    }

    /// Forget the retained snapshot.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last = RewardBreakdown::default();
    }
}

#[inline]
fn ratio(value: f64, baseline: f64) -> f64 {
    if baseline > 0.0 { value / baseline } else { 0.0 }
}
