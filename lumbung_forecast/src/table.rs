//! Forecast table: one row per future period

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use lumbung_math::stats::non_negative;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One forecast period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: DateTime<Utc>,
    pub forecast: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
}

/// Forecast output. Either exactly the requested number of rows or empty.
///
/// Every row satisfies `0 <= confidence_lower <= forecast <= confidence_upper`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// The empty table returned on any failure
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a table from parallel columns, clamping every value at zero.
    ///
    /// Fails if the columns differ in length, hold non-finite numbers, or if a
    /// lower bound exceeds its point forecast (or the point exceeds the upper).
    pub fn from_columns(
        dates: Vec<DateTime<Utc>>,
        forecast: &[f64],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Self> {
        let n = dates.len();
        if forecast.len() != n || lower.len() != n || upper.len() != n {
            return Err(ForecastError::ForecastingError(format!(
                "Column lengths differ: {} dates, {} forecasts, {} lower, {} upper",
                n,
                forecast.len(),
                lower.len(),
                upper.len()
            )));
        }

        let mut rows = Vec::with_capacity(n);
        for (i, date) in dates.into_iter().enumerate() {
            let (f, lo, hi) = (forecast[i], lower[i], upper[i]);
            if !(f.is_finite() && lo.is_finite() && hi.is_finite()) {
                return Err(ForecastError::ForecastingError(format!(
                    "Non-finite forecast at {}: {} [{}, {}]",
                    date, f, lo, hi
                )));
            }
            if lo > f || f > hi {
                return Err(ForecastError::ForecastingError(format!(
                    "Confidence bounds out of order at {}: {} [{}, {}]",
                    date, f, lo, hi
                )));
            }
            rows.push(ForecastRow {
                date,
                forecast: non_negative(f),
                confidence_lower: non_negative(lo),
                confidence_upper: non_negative(hi),
            });
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn forecast_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.forecast).collect()
    }

    pub fn lower_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.confidence_lower).collect()
    }

    pub fn upper_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.confidence_upper).collect()
    }

    /// Write as CSV with a `date,forecast,confidence_lower,confidence_upper` header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Serialize the rows as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.rows)?)
    }

    /// Convert to a DataFrame with dates as epoch milliseconds
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let millis: Vec<i64> = self.rows.iter().map(|r| r.date.timestamp_millis()).collect();
        let df = DataFrame::new(vec![
            Series::new("date", millis),
            Series::new("forecast", self.forecast_values()),
            Series::new("confidence_lower", self.lower_values()),
            Series::new("confidence_upper", self.upper_values()),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dates(n: u32) -> Vec<DateTime<Utc>> {
        (1..=n)
            .map(|d| Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn test_clamps_at_zero() {
        let table =
            ForecastTable::from_columns(dates(2), &[-1.0, 4.0], &[-3.0, 2.0], &[1.0, 6.0]).unwrap();

        let first = table.rows()[0];
        assert_eq!(first.forecast, 0.0);
        assert_eq!(first.confidence_lower, 0.0);
        assert_eq!(first.confidence_upper, 1.0);
        assert_eq!(table.forecast_values(), vec![0.0, 4.0]);
    }

    #[test]
    fn test_rejects_bad_columns() {
        assert!(ForecastTable::from_columns(dates(2), &[1.0], &[0.0], &[2.0]).is_err());
        assert!(ForecastTable::from_columns(dates(1), &[f64::NAN], &[0.0], &[2.0]).is_err());
        assert!(ForecastTable::from_columns(dates(1), &[1.0], &[1.5], &[2.0]).is_err());
    }

    #[test]
    fn test_csv_and_dataframe_export() {
        let table = ForecastTable::from_columns(dates(2), &[3.0, 4.0], &[2.0, 3.0], &[4.0, 5.0])
            .unwrap();

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("date,forecast,confidence_lower,confidence_upper"));
        assert_eq!(text.lines().count(), 3);

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 4));
    }

    #[test]
    fn test_empty_table() {
        let table = ForecastTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.to_json().unwrap(), "[]");
    }
}
