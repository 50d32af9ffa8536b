// Compares the forecasting strategies on a synthetic monthly rice-stock series
use chrono::{TimeZone, Utc};
use lumbung_workspace::forecast::{
    evaluate_holdout, ForecastConfig, Forecaster, InventorySeries, ModelKind,
};

fn monthly_series() -> InventorySeries {
    // Four years of monthly stock with a harvest peak every March
    let pairs = (0..48).filter_map(|i: u32| {
        let date = Utc.with_ymd_and_hms(2020 + (i / 12) as i32, i % 12 + 1, 1, 0, 0, 0).single()?;
        let season = match i % 12 {
            2 => 80.0,
            3 => 40.0,
            8..=10 => -30.0,
            _ => 0.0,
        };
        Some((date, 300.0 + 2.5 * i as f64 + season))
    });
    InventorySeries::from_pairs(pairs).expect("synthetic series is valid")
}

fn main() {
    let series = monthly_series();
    let config = ForecastConfig::default();
    println!("Series: {} observations, frequency {}\n", series.len(), series.frequency());

    for kind in [
        ModelKind::Arima,
        ModelKind::ExponentialSmoothing,
        ModelKind::Ensemble,
    ] {
        let mut model = kind.build(&config);
        match evaluate_holdout(model.as_mut(), &series, 12) {
            Ok(metrics) => println!("=== {} ===\n{}", kind, metrics),
            Err(err) => println!("=== {} ===\nfailed: {}\n", kind, err),
        }
    }

    let mut ensemble = ModelKind::Ensemble.build(&config);
    if ensemble.fit(&series).is_ok() {
        println!("Next six months (ensemble):");
        for row in ensemble.forecast(6).rows() {
            println!(
                "  {}  {:>8.1}  [{:>8.1}, {:>8.1}]",
                row.date.format("%Y-%m"),
                row.forecast,
                row.confidence_lower,
                row.confidence_upper
            );
        }
    }
}
