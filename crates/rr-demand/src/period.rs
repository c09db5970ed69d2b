//! Time-of-day periods and their demand tables.

use std::fmt;

/// Riders per second per stop at popularity 1.0, before the period scale.
pub const BASE_ARRIVAL_RATE: f64 = 0.05;

/// One of four demand regimes, selected from the simulated minute of day.
///
/// | Period        | Hours      | Rate scale | Destination weight     |
/// |---------------|------------|------------|------------------------|
/// | `MorningRush` | 07:00–09:59 | 2.5       | popularity (inbound)   |
/// | `Midday`      | 10:00–16:59 | 1.0       | uniform                |
/// | `EveningRush` | 17:00–19:59 | 2.2       | 2.5 − popularity (outbound) |
/// | `Night`       | otherwise  | 0.3        | √popularity            |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimePeriod {
    MorningRush,
    Midday,
    EveningRush,
    Night,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] =
        [TimePeriod::MorningRush, TimePeriod::Midday, TimePeriod::EveningRush, TimePeriod::Night];

    pub fn from_minute_of_day(minute: u32) -> Self {
        match minute % 1_440 {
            420..600 => TimePeriod::MorningRush,
            600..1_020 => TimePeriod::Midday,
            1_020..1_200 => TimePeriod::EveningRush,
            _ => TimePeriod::Night,
        }
    }

    /// Dense index into per-period tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Multiplier on [`BASE_ARRIVAL_RATE`].
    pub fn rate_scale(self) -> f64 {
        match self {
            TimePeriod::MorningRush => 2.5,
            TimePeriod::Midday => 1.0,
            TimePeriod::EveningRush => 2.2,
            TimePeriod::Night => 0.3,
        }
    }

    #[inline]
    pub fn base_rate(self) -> f64 {
        BASE_ARRIVAL_RATE * self.rate_scale()
    }

    /// Weight of a destination stop with the given popularity.
    pub fn destination_weight(self, popularity: f64) -> f64 {
        match self {
            TimePeriod::MorningRush => popularity,
            TimePeriod::Midday => 1.0,
            TimePeriod::EveningRush => (2.5 - popularity).max(0.0),
            TimePeriod::Night => popularity.max(0.0).sqrt(),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimePeriod::MorningRush => "morning_rush",
            TimePeriod::Midday => "midday",
            TimePeriod::EveningRush => "evening_rush",
            TimePeriod::Night => "night",
        };
        f.write_str(s)
    }
}
