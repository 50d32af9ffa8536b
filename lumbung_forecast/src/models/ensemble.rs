//! Equal-weight ensemble over other strategies

use crate::capability::StatsCapability;
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{
    check_periods, log_fit_failure, ArimaForecaster, ExponentialSmoothingForecaster, Forecaster,
};
use crate::series::InventorySeries;
use crate::table::ForecastTable;

const NAME: &str = "Ensemble";

/// Averages the forecasts of every member that fitted successfully.
///
/// Members that fail to fit are dropped until the next fit. Members whose
/// forecast comes back empty are skipped for that call. Dates are taken from
/// the first contributing member.
#[derive(Debug)]
pub struct EnsembleForecaster {
    members: Vec<Box<dyn Forecaster>>,
    active: Vec<usize>,
    capability: StatsCapability,
}

impl EnsembleForecaster {
    /// ARIMA and exponential smoothing with default configuration
    pub fn new() -> Self {
        Self::from_config(&ForecastConfig::default())
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::with_members(vec![
            Box::new(ArimaForecaster::from_config(config.clone())) as Box<dyn Forecaster>,
            Box::new(ExponentialSmoothingForecaster::from_config(config.clone())),
        ])
    }

    /// Ensemble over an arbitrary set of members
    pub fn with_members(members: Vec<Box<dyn Forecaster>>) -> Self {
        Self {
            members,
            active: Vec::new(),
            capability: StatsCapability::detect(),
        }
    }

    pub fn with_capability(mut self, capability: StatsCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Names of the members that survived the last fit
    pub fn active_members(&self) -> Vec<&str> {
        self.active.iter().map(|&i| self.members[i].name()).collect()
    }

    fn fit_members(&mut self, series: &InventorySeries) -> Result<()> {
        self.capability.ensure()?;
        for (i, member) in self.members.iter_mut().enumerate() {
            match member.fit(series) {
                Ok(()) => self.active.push(i),
                Err(err) => log::warn!("Dropping {} from ensemble: {}", member.name(), err),
            }
        }
        if self.active.is_empty() {
            return Err(ForecastError::fit_failed(NAME, "no member could be fitted"));
        }
        log::info!(
            "Ensemble fitted with {} of {} members",
            self.active.len(),
            self.members.len()
        );
        Ok(())
    }
}

impl Default for EnsembleForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for EnsembleForecaster {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, series: &InventorySeries) -> Result<()> {
        self.active.clear();
        self.fit_members(series).map_err(|e| log_fit_failure(NAME, e))
    }

    fn try_forecast(&self, periods: usize) -> Result<ForecastTable> {
        self.capability.ensure()?;
        if self.active.is_empty() {
            return Err(ForecastError::NotFitted(NAME.to_string()));
        }
        check_periods(periods)?;

        let tables: Vec<ForecastTable> = self
            .active
            .iter()
            .map(|&i| self.members[i].forecast(periods))
            .filter(|table| !table.is_empty())
            .collect();

        let first = tables.first().ok_or_else(|| {
            ForecastError::ForecastingError("every ensemble member failed to forecast".to_string())
        })?;

        let count = tables.len() as f64;
        let average = |column: fn(&ForecastTable) -> Vec<f64>| -> Vec<f64> {
            let mut sums = vec![0.0; periods];
            for table in &tables {
                for (sum, value) in sums.iter_mut().zip(column(table)) {
                    *sum += value;
                }
            }
            sums.into_iter().map(|s| s / count).collect()
        };

        let forecast = average(ForecastTable::forecast_values);
        let lower = average(ForecastTable::lower_values);
        let upper = average(ForecastTable::upper_values);

        ForecastTable::from_columns(first.dates(), &forecast, &lower, &upper)
    }

    fn is_fitted(&self) -> bool {
        !self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> InventorySeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InventorySeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_drops_member_that_cannot_fit() {
        // Three points: enough for Holt, too few for ARIMA(1,1,1)
        let data = series(&[10.0, 12.0, 14.0]);
        let mut ensemble = EnsembleForecaster::new();
        ensemble.fit(&data).unwrap();
        assert_eq!(ensemble.active_members(), vec!["ExponentialSmoothing"]);

        let mut alone = ExponentialSmoothingForecaster::new();
        alone.fit(&data).unwrap();
        assert_eq!(ensemble.forecast(4), alone.forecast(4));
    }

    #[test]
    fn test_no_member_fits() {
        let mut ensemble = EnsembleForecaster::new();
        assert!(ensemble.fit(&series(&[1.0, 2.0])).is_err());
        assert!(!ensemble.is_fitted());
        assert!(ensemble.forecast(3).is_empty());
    }

    #[test]
    fn test_unavailable_capability() {
        let values: Vec<f64> = (0..30).map(|i| 70.0 - i as f64).collect();
        let mut ensemble =
            EnsembleForecaster::new().with_capability(StatsCapability::unavailable());

        assert!(matches!(
            ensemble.fit(&series(&values)),
            Err(ForecastError::DependencyUnavailable)
        ));
        assert!(ensemble.active_members().is_empty());
        assert!(ensemble.forecast(3).is_empty());
    }
}
