//! Spatial-subsystem error type.

use thiserror::Error;

use rr_core::{NodeId, StopId};

/// Errors produced by `rr-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("no street between {from} and {to}")]
    EdgeNotFound { from: NodeId, to: NodeId },

    #[error("congestion factor must be finite and >= 1, got {0}")]
    InvalidFactor(f64),

    #[error("stop {0} not found")]
    StopNotFound(StopId),

    #[error("requested {requested} stops but the grid only has {available} nodes")]
    TooManyStops { requested: usize, available: usize },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
