//! Exponential smoothing strategy: Holt-Winters when the history covers two
//! full seasons, Holt's linear trend otherwise

use crate::capability::StatsCapability;
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{check_periods, log_fit_failure, Forecaster, SeriesEnd};
use crate::series::InventorySeries;
use crate::table::ForecastTable;
use lumbung_math::stats::{mean, population_std_dev};
use lumbung_math::{MathError, SmoothingFit, SmoothingKind};

const NAME: &str = "ExponentialSmoothing";

/// Additive exponential smoothing forecaster.
///
/// Bands are synthesized from the in-sample residuals as
/// `forecast ± confidence_z * σ`. When no residual spread is available,
/// σ falls back to `fallback_sigma_ratio` times the mean forecast.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothingForecaster {
    config: ForecastConfig,
    capability: StatsCapability,
    state: Option<FittedSmoothing>,
}

#[derive(Debug, Clone)]
struct FittedSmoothing {
    end: SeriesEnd,
    model: SmoothingFit,
}

impl ExponentialSmoothingForecaster {
    pub fn new() -> Self {
        Self::from_config(ForecastConfig::default())
    }

    pub fn from_config(config: ForecastConfig) -> Self {
        Self {
            config,
            capability: StatsCapability::detect(),
            state: None,
        }
    }

    pub fn with_capability(mut self, capability: StatsCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Fit with an explicit season length instead of the configured one
    pub fn fit_with_period(
        &mut self,
        series: &InventorySeries,
        seasonal_periods: usize,
    ) -> Result<()> {
        self.state = None;
        let state = self
            .fit_state(series, seasonal_periods)
            .map_err(|e| log_fit_failure(NAME, e))?;
        self.state = Some(state);
        Ok(())
    }

    /// The smoothing variant chosen by the last fit
    pub fn fitted_kind(&self) -> Option<SmoothingKind> {
        self.state.as_ref().map(|s| s.model.kind())
    }

    fn fit_state(
        &self,
        series: &InventorySeries,
        seasonal_periods: usize,
    ) -> Result<FittedSmoothing> {
        self.capability.ensure()?;
        if seasonal_periods < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal_periods must be at least 2, got {}",
                seasonal_periods
            )));
        }
        let end = SeriesEnd::of(series, &self.config)?;

        let kind = if series.len() >= 2 * seasonal_periods {
            SmoothingKind::HoltWinters {
                period: seasonal_periods,
            }
        } else {
            SmoothingKind::Holt
        };
        log::debug!(
            "Fitting {:?} to {} observations (season length {})",
            kind,
            series.len(),
            seasonal_periods
        );

        let model = SmoothingFit::optimize(series.values(), kind, &self.config.optimizer())
            .map_err(|e| match e {
                MathError::InsufficientData { needed, got } => {
                    ForecastError::InsufficientData { needed, got }
                }
                other => ForecastError::fit_failed(NAME, other),
            })?;
        Ok(FittedSmoothing { end, model })
    }
}

/// Residual spread, or `fallback_ratio * |mean(forecast)|` when the residuals
/// are empty or their spread is not finite
fn band_sigma(residuals: &[f64], forecast: &[f64], fallback_ratio: f64) -> Result<f64> {
    if !residuals.is_empty() {
        let sigma = population_std_dev(residuals)?;
        if sigma.is_finite() {
            return Ok(sigma);
        }
    }
    log::debug!("No usable residual spread, using {} of the mean forecast", fallback_ratio);
    Ok((fallback_ratio * mean(forecast)?).abs())
}

impl Default for ExponentialSmoothingForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for ExponentialSmoothingForecaster {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, series: &InventorySeries) -> Result<()> {
        let seasonal_periods = self.config.seasonal_periods;
        self.fit_with_period(series, seasonal_periods)
    }

    fn try_forecast(&self, periods: usize) -> Result<ForecastTable> {
        self.capability.ensure()?;
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ForecastError::NotFitted(NAME.to_string()))?;
        check_periods(periods)?;

        let forecast = state.model.forecast(periods);
        let sigma = band_sigma(
            state.model.residuals(),
            &forecast,
            self.config.fallback_sigma_ratio,
        )?;
        let half_width = self.config.confidence_z * sigma;
        let lower: Vec<f64> = forecast.iter().map(|f| f - half_width).collect();
        let upper: Vec<f64> = forecast.iter().map(|f| f + half_width).collect();

        let dates = state.end.future_dates(periods)?;
        ForecastTable::from_columns(dates, &forecast, &lower, &upper)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
