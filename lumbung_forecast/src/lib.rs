//! # Lumbung Forecast
//!
//! Stock forecasting for a village cooperative's inventory.
//!
//! ## Features
//!
//! - ARIMA(1,1,1) forecasts with model-native confidence intervals
//! - Holt / Holt-Winters exponential smoothing with residual-based bands
//! - An equal-weight ensemble that drops members which fail to fit
//! - Accuracy metrics (MAE, RMSE, MAPE, R²) and hold-out evaluation
//! - Batch forecasting over many items with an optional TTL cache
//!
//! Forecasts never go below zero and come back either complete or empty.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lumbung_forecast::models::{EnsembleForecaster, Forecaster};
//! use lumbung_forecast::series::InventorySeries;
//!
//! let series = InventorySeries::from_csv("rice.csv")?;
//! let mut model = EnsembleForecaster::new();
//! model.fit(&series)?;
//!
//! for row in model.forecast(30).rows() {
//!     println!("{} {:.1} [{:.1}, {:.1}]",
//!         row.date, row.forecast, row.confidence_lower, row.confidence_upper);
//! }
//! # Ok::<(), lumbung_forecast::ForecastError>(())
//! ```
//!
//! Statistical model work is gated behind the `stats` cargo feature (on by
//! default). Without it every entry point fails fast with
//! [`ForecastError::DependencyUnavailable`] and forecasts come back empty.

pub mod batch;
pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod frequency;
pub mod metrics;
pub mod models;
pub mod series;
pub mod table;

pub use batch::{forecast_items, ItemForecast};
pub use cache::{ForecastCache, ForecastKey, TtlCache};
pub use capability::{StatsCapability, STATS_AVAILABLE};
pub use config::ForecastConfig;
pub use error::{ForecastError, Result};
pub use frequency::Frequency;
pub use metrics::{calculate_forecast_metrics, evaluate_holdout, ForecastMetrics};
pub use models::{
    ArimaForecaster, EnsembleForecaster, ExponentialSmoothingForecaster, Forecaster, ModelKind,
};
pub use series::InventorySeries;
pub use table::{ForecastRow, ForecastTable};
