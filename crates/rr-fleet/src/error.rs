use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FleetError {
    #[error("action index {0} is out of range (expected 0..=3)")]
    InvalidAction(u8),

    #[error("expected {expected} actions (one per learned bus), got {got}")]
    ActionCountMismatch { expected: usize, got: usize },
}

pub type FleetResult<T> = Result<T, FleetError>;
