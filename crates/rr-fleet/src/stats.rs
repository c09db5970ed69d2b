//! Fleet-level read model.

use crate::bus::Bus;

/// Aggregates over one fleet.  Computed on demand, never cached.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetStats {
    pub bus_count:       usize,
    pub total_load:      usize,
    /// Mean of `load / capacity`.
    pub avg_utilization: f64,
    /// Population standard deviation of per-bus load (overcrowding proxy).
    pub load_std:        f64,
    pub total_distance:  f64,
    pub mean_distance:   f64,
    pub total_replans:   u64,
    pub mean_replans:    f64,
}

impl FleetStats {
    pub fn compute(buses: &[Bus]) -> Self {
        let n = buses.len();
        if n == 0 {
            return Self::default();
        }
        let nf = n as f64;
        let total_load: usize = buses.iter().map(Bus::load).sum();
        let mean_load = total_load as f64 / nf;
        let variance = buses
            .iter()
            .map(|b| {
                let d = b.load() as f64 - mean_load;
                d * d
            })
            .sum::<f64>()
            / nf;
        let total_distance: f64 = buses.iter().map(|b| b.distance).sum();
        let total_replans: u64 = buses.iter().map(|b| b.replan_count as u64).sum();

        Self {
            bus_count: n,
            total_load,
            avg_utilization: buses.iter().map(Bus::utilization).sum::<f64>() / nf,
            load_std: variance.sqrt(),
            total_distance,
            mean_distance: total_distance / nf,
            total_replans,
            mean_replans: total_replans as f64 / nf,
        }
    }
}
