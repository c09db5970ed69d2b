//! Fixed circular routes for the static baseline fleet.

use rr_core::StopId;

/// Number of distinct baseline routes; bus `i` drives route `i % ROUTE_COUNT`.
pub const ROUTE_COUNT: usize = 3;

/// A closed loop of stops.  The last entry repeats the first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticRoute {
    stops: Vec<StopId>,
}

impl StaticRoute {
    /// Build the three overlapping baseline loops by striding through
    /// `stops` (ascending id order).
    ///
    /// `stride = max(4, n / 3)`; route `r` starts at `r · stride / 2` and
    /// takes every `stride`-th stop (modulo `n`) until it would revisit one.
    pub fn baseline_set(stops: &[StopId]) -> Vec<StaticRoute> {
        let n = stops.len();
        if n == 0 {
            return Vec::new();
        }
        let stride = (n / 3).max(4);
        let step = if stride >= n { 1 } else { stride };
        let len = n.div_ceil(step).clamp(1, n);

        (0..ROUTE_COUNT)
            .map(|r| {
                let offset = (r * stride / 2) % n;
                let mut seq: Vec<StopId> = (0..len).map(|k| stops[(offset + k * step) % n]).collect();
                seq.push(seq[0]);
                StaticRoute { stops: seq }
            })
            .collect()
    }

    /// Build from an explicit stop order; the loop is closed automatically.
    pub fn from_stops(stops: &[StopId]) -> Option<StaticRoute> {
        let first = *stops.first()?;
        let mut seq = stops.to_vec();
        if seq.len() == 1 || seq.last() != Some(&first) {
            seq.push(first);
        }
        Some(StaticRoute { stops: seq })
    }

    /// The closed sequence, first stop repeated at the end.
    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    /// Distinct stops visited per lap.
    pub fn lap_len(&self) -> usize {
        self.stops.len() - 1
    }

    #[inline]
    pub fn stop(&self, cursor: usize) -> StopId {
        self.stops[cursor % self.lap_len()]
    }

    /// Cursor after `cursor`; the closing repeat maps back to 0.
    #[inline]
    pub fn next_cursor(&self, cursor: usize) -> usize {
        (cursor + 1) % self.lap_len()
    }
}
