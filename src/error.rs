//! Error taxonomy shared by every entity in the crate.

use polars::prelude::PolarsError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PhotostimError>;

/// Coarse classification of a [`PhotostimError`], matchable without
/// inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    InvalidState,
    EmptyData,
    UnsupportedOperation,
    Inconsistency,
    Io,
    Format,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotostimError {
    /// Parameters that must be supplied together are missing or contradictory.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value violates a closed-set or shape constraint.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is forbidden in the current format or state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A derived computation found mismatched cardinalities.
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),

    /// The persisted store is malformed.
    #[error("Malformed store: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl PhotostimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::EmptyData(_) => ErrorKind::EmptyData,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::Inconsistency(_) => ErrorKind::Inconsistency,
            Self::Io(_) => ErrorKind::Io,
            Self::Format(_) | Self::Json(_) | Self::Polars(_) => ErrorKind::Format,
        }
    }
}
