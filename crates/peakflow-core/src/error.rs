//! Calculation errors.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the calculation layer.
///
/// None of these are fatal. Each one tells the caller which input made the
/// computation meaningless so it can pick a fallback or show a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A reading of 0 was passed where a measured reading is required.
    #[error("Reading is 0 (not measured)")]
    NotMeasured,

    /// Reference flow of 0 was passed to a ratio computation.
    #[error("Reference flow is 0; percentage is undefined")]
    DivisionUndefined,

    /// Neither a predicted value nor a personal best is available.
    #[error("No usable reference flow for patient")]
    NoReference,

    #[error("Unknown {field}: {value:?}")]
    UnknownValue { field: &'static str, value: String },
}

pub type CalcResult<T> = Result<T, CalcError>;

/// Unvalidated policy reaching a calculator is an input error.
impl From<ConfigError> for CalcError {
    fn from(e: ConfigError) -> Self {
        CalcError::InvalidInput(e.to_string())
    }
}
