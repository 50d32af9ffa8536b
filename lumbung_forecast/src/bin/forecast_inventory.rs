//! Forecast stock levels for every item in a CSV export.
//!
//! Usage: forecast_inventory <input.csv> <output.csv> [periods=30] [model=ensemble] [config.json]

use lumbung_forecast::batch::{forecast_items, read_item_csv, write_item_forecasts_csv};
use lumbung_forecast::{ForecastConfig, ForecastError, ItemForecast, ModelKind, Result};
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;

const USAGE: &str = "Usage: forecast_inventory <input.csv> <output.csv> \
                     [periods=30] [model=ensemble] [config.json]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        if matches!(err, ForecastError::InvalidParameter(_)) {
            eprintln!("{}", USAGE);
        }
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let (input, output) = match args {
        [input, output, ..] => (input, output),
        _ => {
            return Err(ForecastError::InvalidParameter(
                "input and output paths are required".to_string(),
            ))
        }
    };
    let periods = match args.get(2) {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            let message = format!("periods must be a positive integer, got {}", raw);
            ForecastError::InvalidParameter(message)
        })?,
        None => 30,
    };
    let model = match args.get(3) {
        Some(raw) => raw.parse::<ModelKind>()?,
        None => ModelKind::Ensemble,
    };
    let config = match args.get(4) {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };

    let loaded = read_item_csv(File::open(input)?)?;
    log::info!(
        "Forecasting {} items, {} periods ahead with {}",
        loaded.items.len(),
        periods,
        model
    );

    // Every item id is seen once per run, so no cache here
    let mut forecasts = forecast_items(&loaded.items, periods, model, &config, None);
    forecasts.extend(
        loaded
            .rejected
            .iter()
            .map(|(item_id, err)| ItemForecast::failed(item_id.as_str(), model, err)),
    );

    let failed = forecasts.iter().filter(|f| !f.is_ok()).count();
    for item in forecasts.iter().filter(|f| !f.is_ok()) {
        log::error!(
            "No forecast for {}: {}",
            item.item_id,
            item.error.as_deref().unwrap_or("unknown error")
        );
    }

    write_item_forecasts_csv(&forecasts, BufWriter::new(File::create(output)?))?;
    println!(
        "Wrote forecasts for {} of {} items to {}",
        forecasts.len() - failed,
        forecasts.len(),
        output
    );
    Ok(())
}
