//! Sampling frequency of a series and extrapolation of future dates

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Spacing between consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Constant step (hourly, daily, weekly, ...)
    Fixed(Duration),
    /// One calendar month; `month_end` pins every date to the last day of its month
    Monthly { month_end: bool },
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::daily()
    }
}

impl Frequency {
    pub fn daily() -> Self {
        Frequency::Fixed(Duration::days(1))
    }

    /// Infer the frequency from observed timestamps, falling back to daily.
    ///
    /// A constant gap gives [`Frequency::Fixed`]; gaps of exactly one calendar
    /// month give [`Frequency::Monthly`]; anything irregular is treated as daily.
    pub fn infer(timestamps: &[DateTime<Utc>]) -> Self {
        if timestamps.len() < 2 {
            return Frequency::daily();
        }

        let first_gap = timestamps[1] - timestamps[0];
        if first_gap > Duration::zero()
            && timestamps.windows(2).all(|w| w[1] - w[0] == first_gap)
        {
            return Frequency::Fixed(first_gap);
        }

        if timestamps.windows(2).all(|w| is_month_step(&w[0], &w[1])) {
            let month_end = timestamps.iter().all(is_month_end);
            return Frequency::Monthly { month_end };
        }

        Frequency::daily()
    }

    /// The `periods` dates following `last`
    pub fn future_dates(&self, last: DateTime<Utc>, periods: usize) -> Result<Vec<DateTime<Utc>>> {
        (1..=periods)
            .map(|k| {
                let next = match *self {
                    Frequency::Fixed(step) => i32::try_from(k)
                        .ok()
                        .and_then(|k| last.checked_add_signed(step * k)),
                    Frequency::Monthly { month_end: false } => {
                        last.checked_add_months(Months::new(k as u32))
                    }
                    Frequency::Monthly { month_end: true } => month_end_after(last, k as u32),
                };
                next.ok_or_else(|| {
                    ForecastError::ForecastingError(format!(
                        "Date overflow extrapolating {} periods from {}",
                        periods, last
                    ))
                })
            })
            .collect()
    }
}

fn is_month_step(prev: &DateTime<Utc>, next: &DateTime<Utc>) -> bool {
    let months = (next.year() - prev.year()) * 12 + next.month() as i32 - prev.month() as i32;
    months == 1
        && prev.time() == next.time()
        && (prev.day() == next.day() || (is_month_end(prev) && is_month_end(next)))
}

fn is_month_end(date: &DateTime<Utc>) -> bool {
    (date.date_naive() + Duration::days(1)).day() == 1
}

fn month_end_after(last: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let first_of_month = NaiveDate::from_ymd_opt(last.year(), last.month(), 1)?;
    let end = first_of_month.checked_add_months(Months::new(months + 1))? - Duration::days(1);
    Some(DateTime::<Utc>::from_naive_utc_and_offset(
        end.and_time(last.time()),
        Utc,
    ))
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Frequency::daily()),
            "weekly" | "w" | "1w" => Ok(Frequency::Fixed(Duration::weeks(1))),
            "monthly" | "m" | "1m" | "ms" => Ok(Frequency::Monthly { month_end: false }),
            "month_end" | "me" => Ok(Frequency::Monthly { month_end: true }),
            "hourly" | "h" | "1h" => Ok(Frequency::Fixed(Duration::hours(1))),
            "minute" | "min" | "1min" => Ok(Frequency::Fixed(Duration::minutes(1))),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unsupported frequency: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Fixed(step) if *step == Duration::days(1) => write!(f, "daily"),
            Frequency::Fixed(step) if *step == Duration::weeks(1) => write!(f, "weekly"),
            Frequency::Fixed(step) => write!(f, "every {}s", step.num_seconds()),
            Frequency::Monthly { month_end: false } => write!(f, "monthly"),
            Frequency::Monthly { month_end: true } => write!(f, "month_end"),
        }
    }
}
