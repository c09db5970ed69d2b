//! Simulation time model.
//!
//! # Design
//!
//! The simulation advances in fixed logical ticks of length `dt` simulated
//! seconds.  The canonical counter is the integer `step`; elapsed time is
//! always recomputed as `step * dt` rather than accumulated, so long
//! episodes never drift.
//!
//! Time of day (used by the demand model to pick a period) is derived from
//! `start_secs_of_day + elapsed`, wrapped at 24 h.  Nothing here looks at
//! the wall clock.

use std::fmt;

const SECS_PER_DAY: f64 = 86_400.0;

/// Fixed-timestep logical clock.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated seconds per tick.
    pub dt: f64,
    /// Second-of-day at which step 0 takes place.
    pub start_secs_of_day: f64,
    /// Number of completed ticks.
    pub step: u64,
}

impl SimClock {
    pub fn new(dt: f64, start_secs_of_day: f64) -> Self {
        Self { dt, start_secs_of_day, step: 0 }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.step += 1;
    }

    /// Rewind to step 0 (same `dt`, same start of day).
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Simulated seconds since step 0.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.step as f64 * self.dt
    }

    /// Second of the simulated day, in `[0, 86_400)`.
    pub fn secs_of_day(&self) -> f64 {
        (self.start_secs_of_day + self.elapsed()).rem_euclid(SECS_PER_DAY)
    }

    /// Minute of the simulated day, in `0..1440`.
    #[inline]
    pub fn minute_of_day(&self) -> u32 {
        (self.secs_of_day() / 60.0) as u32
    }

    /// Break the time of day into (hour, minute) for log lines.
    pub fn hm(&self) -> (u32, u32) {
        let m = self.minute_of_day();
        (m / 60, m % 60)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.hm();
        write!(f, "step {} (t={:.1}s, {:02}:{:02})", self.step, self.elapsed(), h, m)
    }
}
