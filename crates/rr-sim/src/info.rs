//! Step results and display snapshots.
//!
//! Every type here is plain data with serde derives so hosts can ship it over
//! whatever transport they use.

use rr_demand::{RiderLedger, TimePeriod};
use rr_fleet::{Bus, DispatchMode, FleetStats};

use crate::score::RewardBreakdown;

// ── KPIs ──────────────────────────────────────────────────────────────────────

/// Headline numbers for one fleet/ledger pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Kpis {
    pub mean_wait:     f64,
    pub p90_wait:      f64,
    pub load_std:      f64,
    pub utilization:   f64,
    pub total_replans: u64,
}

impl Kpis {
    pub fn collect(ledger: &RiderLedger, fleet: &FleetStats) -> Self {
        let waits = ledger.stats();
        Self {
            mean_wait:     waits.mean,
            p90_wait:      waits.p90,
            load_std:      fleet.load_std,
            utilization:   fleet.avg_utilization,
            total_replans: fleet.total_replans,
        }
    }
}

/// `(baseline − learned) / baseline × 100` per KPI; positive means the
/// learned fleet is doing better.  Zero when the baseline is not positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImprovementRatios {
    pub mean_wait: f64,
    pub p90_wait:  f64,
    pub load_std:  f64,
}

impl ImprovementRatios {
    pub fn between(learned: &Kpis, baseline: &Kpis) -> Self {
        Self {
            mean_wait: improvement(baseline.mean_wait, learned.mean_wait),
            p90_wait:  improvement(baseline.p90_wait, learned.p90_wait),
            load_std:  improvement(baseline.load_std, learned.load_std),
        }
    }
}

#[inline]
pub fn improvement(baseline: f64, learned: f64) -> f64 {
    if baseline > 0.0 { (baseline - learned) / baseline * 100.0 } else { 0.0 }
}

/// Rider flow through both ledgers since reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RiderCounters {
    pub generated:          u64,
    pub learned_waiting:    usize,
    pub learned_boarded:    usize,
    pub learned_delivered:  usize,
    pub baseline_waiting:   usize,
    pub baseline_boarded:   usize,
    pub baseline_delivered: usize,
}

// ── Step output ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepInfo {
    /// Simulated seconds since reset, after this step.
    pub elapsed_time:       f64,
    pub period:             TimePeriod,
    pub learned_kpis:       Kpis,
    pub baseline_kpis:      Kpis,
    pub improvement_ratios: ImprovementRatios,
    pub reward:             RewardBreakdown,
    pub riders:             RiderCounters,
    pub active_disruptions: usize,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub reward:      f64,
    pub done:        bool,
    pub info:        StepInfo,
}

// ── Display snapshot ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusView {
    pub id:       u32,
    pub x:        i32,
    pub y:        i32,
    pub load:     usize,
    pub capacity: usize,
    pub target:   Option<u32>,
    pub moving:   bool,
    pub mode:     DispatchMode,
}

impl From<&Bus> for BusView {
    fn from(bus: &Bus) -> Self {
        Self {
            id:       bus.id.0,
            x:        bus.pos.x,
            y:        bus.pos.y,
            load:     bus.load(),
            capacity: bus.capacity,
            target:   bus.target.map(|s| s.0),
            moving:   bus.is_moving(),
            mode:     bus.mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StopView {
    pub id:           u32,
    pub x:            i32,
    pub y:            i32,
    pub queue_length: usize,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisruptionView {
    pub id:         String,
    pub kind:       crate::disruption::DisruptionKind,
    pub expires_at: f64,
}

/// Read-only picture of the learned fleet and its queues.  Baseline buses
/// are included separately for side-by-side rendering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplaySnapshot {
    pub elapsed_time:   f64,
    /// `(hour, minute)` of simulated day.
    pub clock:          (u32, u32),
    pub buses:          Vec<BusView>,
    pub baseline_buses: Vec<BusView>,
    pub stops:          Vec<StopView>,
    pub kpis:           Kpis,
    pub baseline_kpis:  Kpis,
    pub disruptions:    Vec<DisruptionView>,
}
