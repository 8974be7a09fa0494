use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KdError {
    #[error("color index {index} out of range for {len} colors")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot disable color {requested}: color {disabled} is already disabled")]
    AlreadyDisabled { disabled: usize, requested: usize },

    #[error("could not grow color storage")]
    Alloc(#[from] TryReserveError),

    #[error("gamma must be finite and positive, got {0}")]
    InvalidGamma(f64),

    #[error("leaf_size must be between 1 and 64, got {0}")]
    InvalidLeafSize(usize),

    #[error("max_depth must be between 1 and 64, got {0}")]
    InvalidMaxDepth(usize),
}
