//! Demand-subsystem error type.

use thiserror::Error;

use rr_core::StopId;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("stop {0} is not part of the layout")]
    UnknownStop(StopId),

    #[error("surge multiplier must be within [0, {}], got {0}", crate::surge::MAX_SURGE)]
    InvalidSurge(f64),
}

pub type DemandResult<T> = Result<T, DemandError>;
