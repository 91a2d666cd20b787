//! Error types shared by every data source and objective.

use thiserror::Error;

/// Errors raised while building datasets or evaluating objectives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Missing or unsupported construction arguments
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Sources that disagree with each other when merged
    #[error("Inconsistent data: {message}")]
    InconsistentData { message: String },

    /// Row, column or name counts that do not line up
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    /// Values that violate a data source invariant
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Numeric degeneracy such as an empty selection or a zero denominator
    #[error("Domain error: {message}")]
    Domain { message: String },

    #[error("Unknown item id {id} (dataset has {size} items)")]
    UnknownId { id: usize, size: usize },
}

/// Type alias for Results using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentData {
            message: message.into(),
        }
    }

    pub fn dimension(message: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }
}

/// Fails with [`CoreError::UnknownId`] unless `id` lies in `0..size`.
pub(crate) fn check_id(id: usize, size: usize) -> Result<()> {
    if id < size {
        Ok(())
    } else {
        Err(CoreError::UnknownId { id, size })
    }
}
