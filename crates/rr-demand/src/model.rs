//! Poisson rider generation.
//!
//! # Rate model
//!
//! For every stop `s`, in ascending id order, each tick draws
//!
//! ```text
//! count ~ Poisson( base_rate[period] × popularity[s] × surge[s] × Δt )
//! ```
//!
//! and for each arrival a destination (period weights renormalised over all
//! stops except `s`) and a timestamp uniform in `[now, now + Δt]`.
//!
//! Popularity is fixed at construction from the L1 distance to the grid
//! centre: `0.5 + 1.5 × (1 − d / d_max)`, so central stops are up to four
//! times as busy as the corners.

use rr_core::{RiderId, SimRng, StopId};
use rr_spatial::StopRegistry;

use crate::period::TimePeriod;
use crate::rider::Rider;
use crate::surge::SurgeMap;
use crate::{DemandError, DemandResult};

pub struct DemandModel {
    stop_ids:        Vec<StopId>,
    popularity:      Vec<f64>,
    /// `dest_weights[period.index()][i]` for the `i`-th stop.
    dest_weights:    [Vec<f64>; 4],
    surges:          SurgeMap,
    rng:             SimRng,
    next_rider:      u64,
    total_generated: u64,
}

impl DemandModel {
    pub fn new(stops: &StopRegistry, grid_size: u32, seed: u64) -> Self {
        let centre = (grid_size.saturating_sub(1)) as f64 / 2.0;
        let d_max = (2.0 * centre).max(1.0);

        let stop_ids: Vec<StopId> = stops.ids().collect();
        let popularity: Vec<f64> = stops
            .iter()
            .map(|s| {
                let d = (s.pos.x as f64 - centre).abs() + (s.pos.y as f64 - centre).abs();
                0.5 + 1.5 * (1.0 - (d / d_max).min(1.0))
            })
            .collect();

        let dest_weights: [Vec<f64>; 4] = TimePeriod::ALL
            .map(|p| popularity.iter().map(|&pop| p.destination_weight(pop)).collect());

        Self {
            stop_ids,
            popularity,
            dest_weights,
            surges: SurgeMap::new(),
            rng: SimRng::new(seed),
            next_rider: 0,
            total_generated: 0,
        }
    }

    /// Restart the rider stream.  Surges are left alone.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SimRng::new(seed);
        self.next_rider = 0;
        self.total_generated = 0;
    }

    // ── Generation ────────────────────────────────────────────────────────

    /// Draw one tick of arrivals across all stops.
    pub fn generate_arrivals(&mut self, now: f64, dt: f64, period: TimePeriod) -> Vec<Rider> {
        let mut riders = Vec::new();
        if !(dt.is_finite() && dt > 0.0) || self.stop_ids.len() < 2 {
            return riders;
        }
        for i in 0..self.stop_ids.len() {
            let origin = self.stop_ids[i];
            let lambda = self.rate(i, period) * dt;
            let count = self.rng.poisson(lambda);
            for _ in 0..count {
                let destination = self.sample_destination(i, period);
                let arrival_time = now + dt * self.rng.random::<f64>();
                let id = RiderId(self.next_rider);
                self.next_rider += 1;
                riders.push(Rider::new(id, origin, destination, arrival_time));
            }
        }
        self.total_generated += riders.len() as u64;
        riders
    }

    /// Weighted draw over every stop but `origin_idx`, falling back to a
    /// uniform draw when all eligible weights are zero.
    fn sample_destination(&mut self, origin_idx: usize, period: TimePeriod) -> StopId {
        let mut weights = self.dest_weights[period.index()].clone();
        weights[origin_idx] = 0.0;
        let idx = match self.rng.weighted_index(&weights) {
            Some(idx) => idx,
            None => {
                let k = self.rng.gen_range(0..self.stop_ids.len() - 1);
                if k >= origin_idx { k + 1 } else { k }
            }
        };
        self.stop_ids[idx]
    }

    #[inline]
    fn rate(&self, idx: usize, period: TimePeriod) -> f64 {
        period.base_rate() * self.popularity[idx] * self.surges.factor(self.stop_ids[idx])
    }

    /// Expected arrivals per second at `stop` under the current surges.
    pub fn arrival_rate(&self, stop: StopId, period: TimePeriod) -> DemandResult<f64> {
        let idx = self.require(stop)?;
        Ok(self.rate(idx, period))
    }

    // ── Surges ────────────────────────────────────────────────────────────

    /// Set the arrival multiplier for `stop` (last write wins).
    pub fn add_surge(&mut self, stop: StopId, factor: f64) -> DemandResult<()> {
        self.require(stop)?;
        self.surges.set(stop, factor)?;
        log::debug!("surge x{factor} at {stop}");
        Ok(())
    }

    pub fn remove_surge(&mut self, stop: StopId) -> Option<f64> {
        self.surges.remove(stop)
    }

    pub fn clear_surges(&mut self) {
        self.surges.clear();
    }

    pub fn surges(&self) -> &SurgeMap {
        &self.surges
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn popularity(&self, stop: StopId) -> Option<f64> {
        self.stop_ids.binary_search(&stop).ok().map(|i| self.popularity[i])
    }

    pub fn stop_count(&self) -> usize {
        self.stop_ids.len()
    }

    pub fn total_generated(&self) -> u64 {
        self.total_generated
    }

    fn require(&self, stop: StopId) -> DemandResult<usize> {
        self.stop_ids.binary_search(&stop).map_err(|_| DemandError::UnknownStop(stop))
    }
}
