//! Per-stop arrival-rate multipliers.

use std::collections::BTreeMap;

use rr_core::StopId;

use crate::{DemandError, DemandResult};

/// Largest accepted multiplier.  Keeps a tick's expected arrival count
/// bounded by `MAX_SURGE × base_rate × Δt` per stop.
pub const MAX_SURGE: f64 = 100.0;

/// Sparse map of surge multipliers.  Stops without an entry use 1.0.
///
/// Ordered by `StopId` so iteration (e.g. for display) is reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurgeMap {
    factors: BTreeMap<StopId, f64>,
}

impl SurgeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject multipliers outside `[0, MAX_SURGE]`.
    pub fn validate(factor: f64) -> DemandResult<()> {
        if !(0.0..=MAX_SURGE).contains(&factor) {
            return Err(DemandError::InvalidSurge(factor));
        }
        Ok(())
    }

    /// Set the multiplier for `stop`, replacing any previous one.
    pub fn set(&mut self, stop: StopId, factor: f64) -> DemandResult<()> {
        Self::validate(factor)?;
        self.factors.insert(stop, factor);
        Ok(())
    }

    /// Remove the multiplier for `stop`.  Returns the previous value.
    pub fn remove(&mut self, stop: StopId) -> Option<f64> {
        self.factors.remove(&stop)
    }

    pub fn clear(&mut self) {
        self.factors.clear();
    }

    #[inline]
    pub fn factor(&self, stop: StopId) -> f64 {
        self.factors.get(&stop).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StopId, f64)> + '_ {
        self.factors.iter().map(|(&s, &f)| (s, f))
    }
}
