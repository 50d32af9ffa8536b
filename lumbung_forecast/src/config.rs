//! Forecasting configuration

use crate::error::{ForecastError, Result};
use crate::frequency::Frequency;
use lumbung_math::NelderMeadConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables shared by all forecasting strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Season length for Holt-Winters (12 for monthly data with yearly seasons)
    pub seasonal_periods: usize,
    /// Multiplier applied to the residual standard deviation for synthesized bands
    pub confidence_z: f64,
    /// Band half-width as a fraction of the mean forecast when residuals are unavailable
    pub fallback_sigma_ratio: f64,
    /// Confidence level for model-native intervals
    pub confidence_level: f64,
    /// Optimiser iteration cap
    pub max_iterations: usize,
    /// Optimiser convergence tolerance
    pub tolerance: f64,
    /// Overrides frequency inference when set (e.g. "daily", "monthly")
    pub frequency: Option<String>,
    /// Lifetime of cached forecasts, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seasonal_periods: 12,
            confidence_z: 1.96,
            fallback_sigma_ratio: 0.1,
            confidence_level: 0.95,
            max_iterations: 1000,
            tolerance: 1e-8,
            frequency: None,
            cache_ttl_secs: 3600,
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.seasonal_periods < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal_periods must be at least 2, got {}",
                self.seasonal_periods
            )));
        }
        if !(self.confidence_z.is_finite() && self.confidence_z >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_z must be a non-negative number, got {}",
                self.confidence_z
            )));
        }
        if !(self.fallback_sigma_ratio.is_finite() && self.fallback_sigma_ratio >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "fallback_sigma_ratio must be a non-negative number, got {}",
                self.fallback_sigma_ratio
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        self.frequency_override()?;
        Ok(())
    }

    /// The configured frequency, if any
    pub fn frequency_override(&self) -> Result<Option<Frequency>> {
        self.frequency
            .as_deref()
            .map(str::parse::<Frequency>)
            .transpose()
    }

    pub(crate) fn optimizer(&self) -> NelderMeadConfig {
        NelderMeadConfig::with_limits(self.max_iterations, self.tolerance)
    }
}
