//! Forecasting many inventory items in one pass

use crate::cache::{ForecastCache, ForecastKey};
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use crate::series::{parse_date, InventorySeries};
use crate::table::ForecastTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Outcome of forecasting one item. `table` is empty exactly when `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemForecast {
    pub item_id: String,
    pub model: ModelKind,
    pub table: ForecastTable,
    pub error: Option<String>,
}

impl ItemForecast {
    /// Failed outcome with an empty table
    pub fn failed(item_id: impl Into<String>, model: ModelKind, error: &ForecastError) -> Self {
        Self {
            item_id: item_id.into(),
            model,
            table: ForecastTable::empty(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Series read from an item CSV. Items whose rows do not form a valid series
/// (duplicate or non-increasing dates) are set aside in `rejected`.
#[derive(Debug, Default)]
pub struct ItemCsv {
    pub items: Vec<(String, InventorySeries)>,
    pub rejected: Vec<(String, ForecastError)>,
}

#[derive(Debug, Deserialize)]
struct ItemRecord {
    item_id: String,
    #[serde(alias = "timestamp")]
    date: String,
    #[serde(alias = "value", alias = "stock")]
    quantity: f64,
}

#[derive(Debug, Serialize)]
struct ItemForecastRecord<'a> {
    item_id: &'a str,
    model: String,
    date: DateTime<Utc>,
    forecast: f64,
    confidence_lower: f64,
    confidence_upper: f64,
}

/// Forecast every item with a fresh strategy of kind `model`.
///
/// A failing item is reported in its [`ItemForecast`] and never stops the
/// batch. Cached tables are keyed by item id, model and horizon only; clear
/// the cache when an item's history changes.
pub fn forecast_items(
    items: &[(String, InventorySeries)],
    periods: usize,
    model: ModelKind,
    config: &ForecastConfig,
    mut cache: Option<&mut ForecastCache>,
) -> Vec<ItemForecast> {
    items
        .iter()
        .map(|(item_id, series)| {
            let outcome = match cache.as_deref_mut() {
                Some(cache) => cache.get_or_try_insert_with(
                    ForecastKey::new(item_id.as_str(), model, periods),
                    || forecast_one(series, periods, model, config),
                ),
                None => forecast_one(series, periods, model, config),
            };

            match outcome {
                Ok(table) => ItemForecast {
                    item_id: item_id.clone(),
                    model,
                    table,
                    error: None,
                },
                Err(err) => {
                    log::warn!("Forecast for item {} failed: {}", item_id, err);
                    ItemForecast::failed(item_id.as_str(), model, &err)
                }
            }
        })
        .collect()
}

fn forecast_one(
    series: &InventorySeries,
    periods: usize,
    model: ModelKind,
    config: &ForecastConfig,
) -> Result<ForecastTable> {
    let mut forecaster = model.build(config);
    forecaster.fit(series)?;
    forecaster.try_forecast(periods)
}

/// Read `item_id,date,quantity` rows and group them into one series per item,
/// ordered by item id.
///
/// Malformed rows fail the whole read. An item whose rows do not make a valid
/// series is logged and moved to [`ItemCsv::rejected`].
pub fn read_item_csv<R: Read>(reader: R) -> Result<ItemCsv> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut grouped: BTreeMap<String, Vec<(DateTime<Utc>, f64)>> = BTreeMap::new();
    for record in csv_reader.deserialize() {
        let record: ItemRecord = record?;
        let date = parse_date(&record.date)?;
        grouped
            .entry(record.item_id)
            .or_default()
            .push((date, record.quantity));
    }

    let mut loaded = ItemCsv::default();
    for (item_id, mut pairs) in grouped {
        pairs.sort_by_key(|(date, _)| *date);
        match InventorySeries::from_pairs(pairs) {
            Ok(series) => loaded.items.push((item_id, series)),
            Err(err) => {
                log::warn!("Skipping item {}: {}", item_id, err);
                loaded.rejected.push((item_id, err));
            }
        }
    }
    Ok(loaded)
}

/// Write the successful forecasts as one CSV, one row per item and period
pub fn write_item_forecasts_csv<W: Write>(forecasts: &[ItemForecast], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for item in forecasts {
        for row in item.table.rows() {
            csv_writer.serialize(ItemForecastRecord {
                item_id: &item.item_id,
                model: item.model.to_string(),
                date: row.date,
                forecast: row.forecast,
                confidence_lower: row.confidence_lower,
                confidence_upper: row.confidence_upper,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
