//! The rider record.

use rr_core::{RiderId, StopId};

/// A single trip request.
///
/// A rider is owned by exactly one container at a time: its origin queue in
/// the ledger, then a bus manifest, then the ledger's completed list.  It is
/// moved between them, never cloned, except when the simulation replays the
/// same arrival batch into the baseline ledger.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rider {
    pub id:           RiderId,
    pub origin:       StopId,
    pub destination:  StopId,
    /// Simulated seconds since episode start.
    pub arrival_time: f64,
    /// `now − arrival_time` while waiting; frozen at boarding.
    pub wait_time:    f64,
    pub picked_up:    bool,
}

impl Rider {
    pub fn new(id: RiderId, origin: StopId, destination: StopId, arrival_time: f64) -> Self {
        Self { id, origin, destination, arrival_time, wait_time: 0.0, picked_up: false }
    }

    /// Recompute the wait from the clock.  No-op once picked up; clamped at
    /// zero for sub-tick arrival stamps later than `now`.
    #[inline]
    pub fn refresh_wait(&mut self, now: f64) {
        if !self.picked_up {
            self.wait_time = (now - self.arrival_time).max(0.0);
        }
    }

    /// Freeze the wait and mark the rider as aboard.
    #[inline]
    pub fn pick_up(&mut self, now: f64) {
        self.refresh_wait(now);
        self.picked_up = true;
    }
}
