use rr_core::CoreError;
use rr_demand::DemandError;
use rr_fleet::FleetError;
use rr_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("rejected step: {0}")]
    Fleet(#[from] FleetError),

    #[error("unknown disruption kind {0:?}")]
    UnknownDisruption(String),

    #[error("invalid disruption parameters: {0}")]
    InvalidDisruption(String),
}

pub type SimResult<T> = Result<T, SimError>;
