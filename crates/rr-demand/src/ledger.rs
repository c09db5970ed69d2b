//! Per-stop FIFO queues and wait-time bookkeeping.
//!
//! # Ownership
//!
//! ```text
//! enqueue ──► queues[origin] ──board──► (bus manifest) ──complete──► completed
//!                                  └──► boarded_waits (frozen wait, for stats)
//! ```
//!
//! The ledger hands boarded riders out by value; the bus owns them until it
//! hands them back through [`RiderLedger::complete`].

use std::collections::VecDeque;

use rr_core::StopId;

use crate::rider::Rider;

#[cfg(feature = "fx-hash")]
type QueueMap = rustc_hash::FxHashMap<StopId, VecDeque<Rider>>;
#[cfg(not(feature = "fx-hash"))]
type QueueMap = std::collections::HashMap<StopId, VecDeque<Rider>>;

// ── WaitStats ─────────────────────────────────────────────────────────────────

/// Summary of wait times over waiting and boarded riders.
///
/// Percentiles are non-interpolated: `sorted[min(floor(p·n), n−1)]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaitStats {
    pub mean:  f64,
    pub p90:   f64,
    pub p95:   f64,
    pub max:   f64,
    pub count: usize,
}

impl WaitStats {
    /// Compute from an unsorted sample.  The sample is sorted in place so the
    /// mean is summed in a fixed order.
    pub fn from_sample(sample: &mut [f64]) -> Self {
        if sample.is_empty() {
            return Self::default();
        }
        sample.sort_by(f64::total_cmp);
        let n = sample.len();
        let mean = sample.iter().sum::<f64>() / n as f64;
        Self {
            mean,
            p90: percentile(sample, 0.90),
            p95: percentile(sample, 0.95),
            max: sample[n - 1],
            count: n,
        }
    }
}

/// `sorted[floor(p·n)]`, clamped to the last element.  `0.0` when empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

// ── RiderLedger ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct RiderLedger {
    queues:        QueueMap,
    boarded_waits: Vec<f64>,
    completed:     Vec<Rider>,
    waiting:       usize,
}

impl RiderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.queues.clear();
        self.boarded_waits.clear();
        self.completed.clear();
        self.waiting = 0;
    }

    /// Append each rider to the back of its origin queue.
    pub fn enqueue(&mut self, riders: impl IntoIterator<Item = Rider>) {
        for rider in riders {
            self.queues.entry(rider.origin).or_default().push_back(rider);
            self.waiting += 1;
        }
    }

    #[inline]
    pub fn queue_length(&self, stop: StopId) -> usize {
        self.queues.get(&stop).map_or(0, VecDeque::len)
    }

    /// Riders waiting at `stop`, front of the queue first.
    pub fn queue(&self, stop: StopId) -> impl Iterator<Item = &Rider> + '_ {
        self.queues.get(&stop).into_iter().flatten()
    }

    /// Remove up to `capacity_remaining` riders from the front of `stop`'s
    /// queue, freezing their wait at `now`.
    pub fn board(&mut self, stop: StopId, capacity_remaining: usize, now: f64) -> Vec<Rider> {
        let Some(queue) = self.queues.get_mut(&stop) else {
            return Vec::new();
        };
        let n = capacity_remaining.min(queue.len());
        let mut boarded: Vec<Rider> = queue.drain(..n).collect();
        for rider in &mut boarded {
            rider.pick_up(now);
            self.boarded_waits.push(rider.wait_time);
        }
        self.waiting -= n;
        boarded
    }

    /// Take back riders that have alighted.
    pub fn complete(&mut self, riders: impl IntoIterator<Item = Rider>) {
        self.completed.extend(riders);
    }

    /// Recompute every waiting rider's wait from the clock.
    pub fn tick_wait_times(&mut self, now: f64) {
        for rider in self.queues.values_mut().flatten() {
            rider.refresh_wait(now);
        }
    }

    /// Wait statistics over waiting ∪ boarded riders.
    pub fn stats(&self) -> WaitStats {
        let mut sample: Vec<f64> = Vec::with_capacity(self.waiting + self.boarded_waits.len());
        sample.extend(self.queues.values().flatten().map(|r| r.wait_time));
        sample.extend_from_slice(&self.boarded_waits);
        WaitStats::from_sample(&mut sample)
    }

    // ── Counters ──────────────────────────────────────────────────────────

    pub fn waiting_count(&self) -> usize {
        self.waiting
    }

    pub fn boarded_count(&self) -> usize {
        self.boarded_waits.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.completed.len()
    }

    pub fn completed(&self) -> &[Rider] {
        &self.completed
    }
}
