//! Descriptive statistics and normal quantiles

use crate::{MathError, Result};
use num_traits::Float;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(values.mean())
}

/// Population standard deviation (divides by `n`)
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(values.population_std_dev())
}

/// Quantile of the standard normal distribution
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Probability must be in (0, 1), got {}",
            p
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Standard normal: {}", e)))?;
    Ok(normal.inverse_cdf(p))
}

/// Two-sided z multiplier for a confidence level, e.g. 0.95 -> 1.96
pub fn z_for_level(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be in (0, 1), got {}",
            level
        )));
    }
    normal_quantile((1.0 + level) / 2.0)
}

/// Floor a value at zero
pub fn non_negative<T: Float>(value: T) -> T {
    value.max(T::zero())
}
