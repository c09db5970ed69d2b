//! The four discrete dispatch choices.

use std::fmt;

use crate::FleetError;

/// One decision for one learned bus.
///
/// Wire values are fixed: external learners send the discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DispatchAction {
    /// Head for the nearest other stop if the bus has no target.
    Continue = 0,
    /// Retarget to the stop with the best queue-over-distance score.
    HighDemand = 1,
    /// Abandon a near-empty target for a busier stop close by.
    SkipLow = 2,
    /// Dwell for two ticks.
    ShortHold = 3,
}

impl DispatchAction {
    pub const COUNT: usize = 4;

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a whole action vector, failing on the first bad entry.
    pub fn decode_all(raw: &[u8]) -> Result<Vec<DispatchAction>, FleetError> {
        raw.iter().map(|&a| DispatchAction::try_from(a)).collect()
    }
}

impl TryFrom<u8> for DispatchAction {
    type Error = FleetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DispatchAction::Continue),
            1 => Ok(DispatchAction::HighDemand),
            2 => Ok(DispatchAction::SkipLow),
            3 => Ok(DispatchAction::ShortHold),
            other => Err(FleetError::InvalidAction(other)),
        }
    }
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchAction::Continue => "continue",
            DispatchAction::HighDemand => "high_demand",
            DispatchAction::SkipLow => "skip_low",
            DispatchAction::ShortHold => "short_hold",
        };
        f.write_str(s)
    }
}
