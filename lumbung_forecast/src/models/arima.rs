//! ARIMA strategy with a fixed (1,1,1) order

use crate::capability::StatsCapability;
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{check_periods, log_fit_failure, Forecaster, SeriesEnd};
use crate::series::InventorySeries;
use crate::table::ForecastTable;
use lumbung_math::stats::z_for_level;
use lumbung_math::{ArimaFit, ArimaOrder};

/// ARIMA(1,1,1) forecaster.
///
/// The order is fixed rather than searched: small, noisy stock histories make
/// order selection unstable. Intervals are the model's own, widening with the
/// horizon.
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    name: String,
    order: ArimaOrder,
    config: ForecastConfig,
    capability: StatsCapability,
    state: Option<FittedArima>,
}

#[derive(Debug, Clone)]
struct FittedArima {
    end: SeriesEnd,
    model: ArimaFit,
}

impl ArimaForecaster {
    pub fn new() -> Self {
        Self::from_config(ForecastConfig::default())
    }

    pub fn from_config(config: ForecastConfig) -> Self {
        let order = ArimaOrder::new(1, 1, 1);
        Self {
            name: order.to_string(),
            order,
            config,
            capability: StatsCapability::detect(),
            state: None,
        }
    }

    /// Replace the capability flag (used to exercise degraded builds)
    pub fn with_capability(mut self, capability: StatsCapability) -> Self {
        self.capability = capability;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// The fitted model, if any
    pub fn fitted_model(&self) -> Option<&ArimaFit> {
        self.state.as_ref().map(|s| &s.model)
    }

    fn fit_state(&self, series: &InventorySeries) -> Result<FittedArima> {
        self.capability.ensure()?;
        let end = SeriesEnd::of(series, &self.config)?;
        let model = ArimaFit::estimate(series.values(), self.order, &self.config.optimizer())
            .map_err(|e| match e {
                lumbung_math::MathError::InsufficientData { needed, got } => {
                    ForecastError::InsufficientData { needed, got }
                }
                other => ForecastError::fit_failed(&self.name, other),
            })?;
        Ok(FittedArima { end, model })
    }
}

impl Default for ArimaForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for ArimaForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, series: &InventorySeries) -> Result<()> {
        self.state = None;
        let state = self
            .fit_state(series)
            .map_err(|e| log_fit_failure(&self.name, e))?;
        self.state = Some(state);
        Ok(())
    }

    fn try_forecast(&self, periods: usize) -> Result<ForecastTable> {
        self.capability.ensure()?;
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ForecastError::NotFitted(self.name.clone()))?;
        check_periods(periods)?;

        let (means, std_errors) = state.model.forecast(periods);
        let z = z_for_level(self.config.confidence_level)?;
        let lower: Vec<f64> = means
            .iter()
            .zip(&std_errors)
            .map(|(m, se)| m - z * se)
            .collect();
        let upper: Vec<f64> = means
            .iter()
            .zip(&std_errors)
            .map(|(m, se)| m + z * se)
            .collect();

        let dates = state.end.future_dates(periods)?;
        ForecastTable::from_columns(dates, &means, &lower, &upper)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
