//! # Lumbung Math
//!
//! Numerical kernels behind the inventory forecasters.
//! This crate provides the estimation and recursion code for the models that
//! `lumbung_forecast` orchestrates: a bounded Nelder-Mead optimiser,
//! differencing, ARIMA estimation by conditional sum of squares, and additive
//! Holt / Holt-Winters smoothing.

use thiserror::Error;

pub mod arima;
pub mod differencing;
pub mod optimization;
pub mod smoothing;
pub mod stats;

pub use arima::{ArimaFit, ArimaOrder};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use smoothing::{SmoothingFit, SmoothingKind};

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: needed {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
