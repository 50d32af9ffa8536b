//! Metrics for evaluating forecast accuracy

use crate::capability::StatsCapability;
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::series::InventorySeries;
use lumbung_math::stats::mean;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, 0 when any actual value is zero
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl ForecastMetrics {
    /// Metrics keyed by name: `mae`, `rmse`, `mape`, `r2`
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("mae", self.mae),
            ("rmse", self.rmse),
            ("mape", self.mape),
            ("r2", self.r2),
        ])
    }
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:    {:.4}%", self.mape)?;
        writeln!(f, "  R2:      {:.4}", self.r2)?;
        Ok(())
    }
}

/// Score `predicted` against `actual`, truncating both to the shorter length
pub fn calculate_forecast_metrics(actual: &[f64], predicted: &[f64]) -> Result<ForecastMetrics> {
    calculate_forecast_metrics_with(StatsCapability::detect(), actual, predicted)
}

/// [`calculate_forecast_metrics`] with an explicit capability flag
pub fn calculate_forecast_metrics_with(
    capability: StatsCapability,
    actual: &[f64],
    predicted: &[f64],
) -> Result<ForecastMetrics> {
    capability.ensure()?;

    let len = actual.len().min(predicted.len());
    if len == 0 {
        return Err(ForecastError::DegenerateInput(
            "actual and predicted must both be non-empty".to_string(),
        ));
    }
    let actual = &actual[..len];
    let predicted = &predicted[..len];
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::DegenerateInput(
            "inputs contain non-finite values".to_string(),
        ));
    }

    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
    let sq_errors: Vec<f64> = errors.iter().map(|e| e * e).collect();

    let mae = mean(&abs_errors)?;
    let mse = mean(&sq_errors)?;
    let rmse = mse.sqrt();

    let pct_errors: Vec<f64> = errors
        .iter()
        .zip(actual)
        .map(|(e, a)| (e / a).abs())
        .collect();
    let mape = mean(&pct_errors)? * 100.0;
    let mape = if mape.is_finite() {
        mape
    } else {
        log::debug!("MAPE undefined with zero actual values, reporting 0");
        0.0
    };

    Ok(ForecastMetrics {
        mae,
        rmse,
        mape,
        r2: r_squared(actual, &sq_errors)?,
    })
}

/// Name-keyed metrics, or an empty map when they cannot be computed
pub fn forecast_metrics_map(actual: &[f64], predicted: &[f64]) -> BTreeMap<&'static str, f64> {
    match calculate_forecast_metrics(actual, predicted) {
        Ok(metrics) => metrics.to_map(),
        Err(err) => {
            log::error!("Error calculating metrics: {}", err);
            BTreeMap::new()
        }
    }
}

/// Fit on all but the last `test_len` observations and score the forecast
/// against the held-out tail
pub fn evaluate_holdout(
    forecaster: &mut dyn Forecaster,
    series: &InventorySeries,
    test_len: usize,
) -> Result<ForecastMetrics> {
    let (train, test) = series.split_holdout(test_len)?;
    forecaster.fit(&train)?;
    let table = forecaster.try_forecast(test_len)?;
    calculate_forecast_metrics(test.values(), &table.forecast_values())
}

// Constant actuals have no variance to explain: a perfect prediction scores 1,
// anything else 0.
fn r_squared(actual: &[f64], sq_errors: &[f64]) -> Result<f64> {
    let actual_mean = mean(actual)?;
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let ss_res: f64 = sq_errors.iter().sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_values() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];
        let metrics = calculate_forecast_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 2.4, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, 6.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(metrics.r2, 1.0 - 30.0 / 1000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_actual_gives_finite_mape() {
        let metrics = calculate_forecast_metrics(&[0.0, 5.0], &[1.0, 5.0]).unwrap();
        assert!(metrics.mape.is_finite());
        assert_eq!(metrics.mape, 0.0);
    }

    #[test]
    fn test_map_empty_on_failure() {
        assert!(forecast_metrics_map(&[], &[1.0]).is_empty());
        assert!(calculate_forecast_metrics_with(StatsCapability::unavailable(), &[1.0], &[1.0])
            .is_err());
        assert_eq!(forecast_metrics_map(&[1.0, 2.0], &[1.0, 2.0]).len(), 4);
    }
}
