//! Forecasting strategies for inventory series
//!
//! Every strategy follows the same two-phase lifecycle: [`Forecaster::fit`]
//! replaces any previous state, then [`Forecaster::forecast`] produces a
//! [`ForecastTable`] of exactly the requested length, or an empty table when
//! the strategy is not fitted or prediction fails. Failures never escape as
//! panics; they are logged and reported through [`Forecaster::try_forecast`]
//! for callers that want the cause.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::frequency::Frequency;
use crate::series::InventorySeries;
use crate::table::ForecastTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod arima;
pub mod ensemble;
pub mod exponential_smoothing;

pub use arima::ArimaForecaster;
pub use ensemble::EnsembleForecaster;
pub use exponential_smoothing::ExponentialSmoothingForecaster;

/// Common interface for forecasting strategies
pub trait Forecaster: fmt::Debug + Send {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Fit the strategy to a series, discarding any previous fit.
    /// On error the strategy is left unfitted.
    fn fit(&mut self, series: &InventorySeries) -> Result<()>;

    /// Forecast `periods` steps ahead, reporting why it could not
    fn try_forecast(&self, periods: usize) -> Result<ForecastTable>;

    /// Whether the last call to `fit` succeeded
    fn is_fitted(&self) -> bool;

    /// Forecast `periods` steps ahead; empty when unfitted or on failure
    fn forecast(&self, periods: usize) -> ForecastTable {
        match self.try_forecast(periods) {
            Ok(table) => table,
            Err(err @ ForecastError::NotFitted(_)) => {
                log::debug!("{}", err);
                ForecastTable::empty()
            }
            Err(err) => {
                log::error!("Error forecasting {}: {}", self.name(), err);
                ForecastTable::empty()
            }
        }
    }
}

/// Available strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Arima,
    ExponentialSmoothing,
    Ensemble,
}

impl ModelKind {
    /// A fresh, unfitted strategy of this kind
    pub fn build(&self, config: &ForecastConfig) -> Box<dyn Forecaster> {
        match self {
            ModelKind::Arima => Box::new(ArimaForecaster::from_config(config.clone())),
            ModelKind::ExponentialSmoothing => {
                Box::new(ExponentialSmoothingForecaster::from_config(config.clone()))
            }
            ModelKind::Ensemble => Box::new(EnsembleForecaster::from_config(config)),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "arima" => Ok(ModelKind::Arima),
            "exponential_smoothing" | "es" | "holt_winters" | "ets" => {
                Ok(ModelKind::ExponentialSmoothing)
            }
            "ensemble" => Ok(ModelKind::Ensemble),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown model: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Arima => "arima",
            ModelKind::ExponentialSmoothing => "exponential_smoothing",
            ModelKind::Ensemble => "ensemble",
        };
        write!(f, "{}", name)
    }
}

/// Where the fitted series ended and how to step past it
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SeriesEnd {
    pub last_date: DateTime<Utc>,
    pub frequency: Frequency,
}

impl SeriesEnd {
    pub fn of(series: &InventorySeries, config: &ForecastConfig) -> Result<Self> {
        let frequency = match config.frequency_override()? {
            Some(frequency) => frequency,
            None => series.frequency(),
        };
        Ok(Self {
            last_date: series.last_date(),
            frequency,
        })
    }

    pub fn future_dates(&self, periods: usize) -> Result<Vec<DateTime<Utc>>> {
        self.frequency.future_dates(self.last_date, periods)
    }
}

pub(crate) fn check_periods(periods: usize) -> Result<()> {
    if periods == 0 {
        return Err(ForecastError::InvalidParameter(
            "Forecast horizon must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Log a failed fit at the strategy boundary and hand the error back
pub(crate) fn log_fit_failure(name: &str, err: ForecastError) -> ForecastError {
    log::error!("Error fitting {}: {}", name, err);
    err
}
