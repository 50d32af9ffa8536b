//! # Lumbung
//!
//! Workspace facade for the lumbung inventory forecasting crates.
//!
//! - [`math`]: numerical kernels (differencing, ARIMA estimation, exponential
//!   smoothing, Nelder-Mead)
//! - [`forecast`]: forecasting strategies, metrics, batch runs and I/O
//!
//! ## Example
//!
//! ```
//! use lumbung_workspace::forecast::{Forecaster, InventorySeries, ExponentialSmoothingForecaster};
//!
//! let csv = "date,quantity\n2024-01-01,10\n2024-01-02,12\n2024-01-03,14\n2024-01-04,15\n";
//! let series = InventorySeries::from_csv_reader(csv.as_bytes()).unwrap();
//!
//! let mut model = ExponentialSmoothingForecaster::new();
//! model.fit(&series).unwrap();
//! assert_eq!(model.forecast(3).len(), 3);
//! ```

pub use lumbung_forecast as forecast;
pub use lumbung_math as math;
