//! Error types for the lumbung_forecast crate

use lumbung_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the lumbung_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The statistical forecasting capability is not available in this build
    #[error("Statistical forecasting capability is unavailable")]
    DependencyUnavailable,

    /// Not enough observations for the requested model
    #[error("Insufficient data: needed {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Error related to series validation
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model estimation failed
    #[error("Fit failed for {model}: {reason}")]
    FitFailed { model: String, reason: String },

    /// Forecast requested before a successful fit
    #[error("{0} has not been fitted")]
    NotFitted(String),

    /// Prediction failed despite a successful fit
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Metrics cannot be computed from the given sequences
    #[error("Degenerate metrics input: {0}")]
    DegenerateInput(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData { needed, got } => {
                ForecastError::InsufficientData { needed, got }
            }
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
            MathError::CalculationError(msg) => ForecastError::ForecastingError(msg),
        }
    }
}

impl ForecastError {
    /// Wrap an estimation error with the name of the model that produced it
    pub fn fit_failed(model: &str, source: impl std::fmt::Display) -> Self {
        ForecastError::FitFailed {
            model: model.to_string(),
            reason: source.to_string(),
        }
    }
}
