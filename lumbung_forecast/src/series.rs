//! Inventory time series handling for forecasting

use crate::error::{ForecastError, Result};
use crate::frequency::Frequency;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Observed quantities of one inventory item, ordered by time
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySeries {
    dates: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct SeriesRecord {
    #[serde(alias = "timestamp", alias = "time")]
    date: String,
    #[serde(alias = "quantity", alias = "stock")]
    value: f64,
}

impl InventorySeries {
    /// Create a series, checking that timestamps strictly increase and values are finite
    pub fn new(dates: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        if dates.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }
        if let Some(pos) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::DataError(format!(
                "Timestamps must strictly increase: {} is followed by {}",
                dates[pos],
                dates[pos + 1]
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite value {} at {}",
                values[pos], dates[pos]
            )));
        }

        Ok(Self { dates, values })
    }

    /// Create a series from `(date, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let (dates, values) = pairs.into_iter().unzip();
        Self::new(dates, values)
    }

    /// Load a series from a CSV file with `date` and `value` (or `quantity`) columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load a series from CSV text; rows are sorted by date before validation
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();
        for record in csv_reader.deserialize() {
            let record: SeriesRecord = record?;
            pairs.push((parse_date(&record.date)?, record.value));
        }
        pairs.sort_by_key(|(date, _)| *date);
        Self::from_pairs(pairs)
    }

    /// Create a series from a DataFrame, detecting the time and value columns
    /// when they are not named explicitly
    pub fn from_dataframe(
        df: &DataFrame,
        time_column: Option<&str>,
        value_column: Option<&str>,
    ) -> Result<Self> {
        let time_column = match time_column {
            Some(name) => name.to_string(),
            None => detect_time_column(df)?,
        };
        let value_column = match value_column {
            Some(name) => name.to_string(),
            None => detect_value_column(df, &time_column)?,
        };

        let dates = column_as_dates(df.column(&time_column)?)?;
        let values = column_as_f64(df.column(&value_column)?)?;
        Self::new(dates, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a validated series
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of the most recent observation
    pub fn last_date(&self) -> DateTime<Utc> {
        self.dates[self.dates.len() - 1]
    }

    /// Frequency inferred from the timestamps
    pub fn frequency(&self) -> Frequency {
        Frequency::infer(&self.dates)
    }

    /// Split off the last `test_len` observations for hold-out scoring
    pub fn split_holdout(&self, test_len: usize) -> Result<(Self, Self)> {
        if test_len == 0 || test_len >= self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Hold-out length must be between 1 and {}, got {}",
                self.len().saturating_sub(1),
                test_len
            )));
        }
        let cut = self.len() - test_len;
        Ok((
            Self {
                dates: self.dates[..cut].to_vec(),
                values: self.values[..cut].to_vec(),
            },
            Self {
                dates: self.dates[cut..].to_vec(),
                values: self.values[cut..].to_vec(),
            },
        ))
    }
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` as UTC
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }
    Err(ForecastError::DataError(format!("Unrecognised date: {}", s)))
}

fn detect_time_column(df: &DataFrame) -> Result<String> {
    for name in df.get_column_names() {
        let lower = name.to_lowercase();
        if lower.contains("date") || lower.contains("time") {
            return Ok(name.to_string());
        }
    }

    // Fall back to the first temporal column
    df.get_columns()
        .iter()
        .find(|s| s.dtype().is_temporal())
        .map(|s| s.name().to_string())
        .ok_or_else(|| ForecastError::DataError("No time column found in data".to_string()))
}

fn detect_value_column(df: &DataFrame, time_column: &str) -> Result<String> {
    let names = df.get_column_names();
    for wanted in ["quantity", "value", "stock", "amount"] {
        if let Some(name) = names.iter().find(|n| n.to_lowercase().contains(wanted)) {
            return Ok(name.to_string());
        }
    }

    df.get_columns()
        .iter()
        .find(|s| s.name() != time_column && s.dtype().is_numeric())
        .map(|s| s.name().to_string())
        .ok_or_else(|| ForecastError::DataError("No value column found in data".to_string()))
}

fn column_as_f64(col: &Series) -> Result<Vec<f64>> {
    let casted = col.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                let message = format!("Missing value in '{}' at row {}", col.name(), i);
                ForecastError::DataError(message)
            })
        })
        .collect()
}

fn column_as_dates(col: &Series) -> Result<Vec<DateTime<Utc>>> {
    let missing = |i: usize| {
        ForecastError::DataError(format!("Missing date in '{}' at row {}", col.name(), i))
    };

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.ok_or_else(|| missing(i)).and_then(parse_date))
            .collect(),
        DataType::Date => {
            let days = col.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(i, d)| {
                    let d = d.ok_or_else(|| missing(i))?;
                    from_millis(i64::from(d) * 86_400_000)
                })
                .collect()
        }
        dtype => {
            let per_milli = match dtype {
                DataType::Datetime(TimeUnit::Nanoseconds, _) => 1_000_000,
                DataType::Datetime(TimeUnit::Microseconds, _) => 1_000,
                DataType::Datetime(TimeUnit::Milliseconds, _) => 1,
                // Integer columns hold epoch milliseconds
                dt if dt.is_integer() => 1,
                other => {
                    return Err(ForecastError::DataError(format!(
                        "Column '{}' has unsupported time type {:?}",
                        col.name(),
                        other
                    )))
                }
            };
            let raw = col.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .enumerate()
                .map(|(i, v)| from_millis(v.ok_or_else(|| missing(i))? / per_milli))
                .collect()
        }
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ForecastError::DataError(format!("Timestamp out of range: {}", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(InventorySeries::new(vec![day(1), day(2)], vec![1.0]).is_err());
        assert!(InventorySeries::new(vec![], vec![]).is_err());
        assert!(InventorySeries::new(vec![day(2), day(1)], vec![1.0, 2.0]).is_err());
        assert!(InventorySeries::new(vec![day(1), day(1)], vec![1.0, 2.0]).is_err());
        assert!(InventorySeries::new(vec![day(1), day(2)], vec![1.0, f64::NAN]).is_err());

        let series = InventorySeries::new(vec![day(1), day(2)], vec![1.0, 2.0]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_date(), day(2));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-05").unwrap(), day(5));
        assert_eq!(parse_date("2024-03-05 00:00:00").unwrap(), day(5));
        assert_eq!(parse_date("2024-03-05T00:00:00Z").unwrap(), day(5));
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn test_split_holdout() {
        let series =
            InventorySeries::from_pairs((1..=5).map(|d| (day(d), d as f64))).unwrap();
        let (train, test) = series.split_holdout(2).unwrap();
        assert_eq!(train.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(test.values(), &[4.0, 5.0]);
        assert!(series.split_holdout(5).is_err());
        assert!(series.split_holdout(0).is_err());
    }

    #[test]
    fn test_from_dataframe_detects_columns() {
        let millis: Vec<i64> = (1..=3).map(|d| day(d).timestamp_millis()).collect();
        let df = DataFrame::new(vec![
            Series::new("date", millis),
            Series::new("quantity", vec![5.0, 6.0, 7.0]),
        ])
        .unwrap();

        let series = InventorySeries::from_dataframe(&df, None, None).unwrap();
        assert_eq!(series.dates(), &[day(1), day(2), day(3)]);
        assert_eq!(series.values(), &[5.0, 6.0, 7.0]);
    }
}
