use chrono::{DateTime, Duration, TimeZone, Utc};
use lumbung_forecast::models::{
    ArimaForecaster, EnsembleForecaster, ExponentialSmoothingForecaster, Forecaster, ModelKind,
};
use lumbung_forecast::{ForecastConfig, ForecastError, ForecastTable, InventorySeries, Result};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rstest::rstest;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn daily_series(values: &[f64]) -> InventorySeries {
    InventorySeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start() + Duration::days(i as i64), *v)),
    )
    .unwrap()
}

/// Linear trend plus seeded Gaussian noise
fn noisy_trend(len: usize, base: f64, slope: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    (0..len)
        .map(|i| base + slope * i as f64 + noise.sample(&mut rng))
        .collect()
}

fn assert_well_formed(table: &ForecastTable, periods: usize) {
    assert_eq!(table.len(), periods);
    for pair in table.rows().windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
    for row in table.rows() {
        assert!(0.0 <= row.confidence_lower, "negative lower bound: {:?}", row);
        assert!(row.confidence_lower <= row.forecast, "lower above forecast: {:?}", row);
        assert!(row.forecast <= row.confidence_upper, "forecast above upper: {:?}", row);
    }
}

#[rstest]
#[case(ModelKind::Arima)]
#[case(ModelKind::ExponentialSmoothing)]
#[case(ModelKind::Ensemble)]
fn test_forecast_has_requested_length(#[case] kind: ModelKind) {
    init_logger();
    let series = daily_series(&noisy_trend(60, 120.0, 0.8, 7));
    let mut model = kind.build(&ForecastConfig::default());

    model.fit(&series).unwrap();
    assert!(model.is_fitted());

    for periods in [1, 7, 30] {
        let table = model.forecast(periods);
        assert_well_formed(&table, periods);
    }
    assert_eq!(
        model.forecast(1).rows()[0].date,
        start() + Duration::days(60)
    );
}

#[rstest]
#[case(ModelKind::Arima)]
#[case(ModelKind::ExponentialSmoothing)]
#[case(ModelKind::Ensemble)]
fn test_declining_stock_is_clamped(#[case] kind: ModelKind) {
    init_logger();
    // Runs out of stock within the forecast horizon
    let values: Vec<f64> = (0..30).map(|i| 60.0 - 2.0 * i as f64).collect();
    let mut model = kind.build(&ForecastConfig::default());

    model.fit(&daily_series(&values)).unwrap();
    let table = model.forecast(40);

    assert_well_formed(&table, 40);
    assert_eq!(table.rows()[39].forecast, 0.0);
}

#[rstest]
#[case(ModelKind::Arima)]
#[case(ModelKind::ExponentialSmoothing)]
#[case(ModelKind::Ensemble)]
fn test_failed_fit_forecasts_empty(#[case] kind: ModelKind) {
    init_logger();
    let mut model = kind.build(&ForecastConfig::default());

    assert!(model.fit(&daily_series(&[5.0, 6.0])).is_err());
    assert!(!model.is_fitted());
    for _ in 0..2 {
        assert!(model.forecast(5).is_empty());
    }
}

#[rstest]
#[case(ModelKind::Arima)]
#[case(ModelKind::ExponentialSmoothing)]
#[case(ModelKind::Ensemble)]
fn test_failed_refit_discards_previous_fit(#[case] kind: ModelKind) {
    init_logger();
    let mut model = kind.build(&ForecastConfig::default());
    model.fit(&daily_series(&noisy_trend(40, 100.0, 1.0, 11))).unwrap();
    assert_eq!(model.forecast(3).len(), 3);

    assert!(model.fit(&daily_series(&[1.0])).is_err());
    assert!(model.forecast(3).is_empty());
}

#[rstest]
#[case(ModelKind::Arima)]
#[case(ModelKind::ExponentialSmoothing)]
#[case(ModelKind::Ensemble)]
fn test_refit_reflects_new_series(#[case] kind: ModelKind) {
    init_logger();
    let mut model = kind.build(&ForecastConfig::default());

    model.fit(&daily_series(&noisy_trend(40, 100.0, 1.0, 3))).unwrap();
    let rising = model.forecast(5).forecast_values();
    assert!(rising.iter().all(|v| *v > 120.0 && *v < 170.0));

    model.fit(&daily_series(&noisy_trend(40, 900.0, -1.0, 5))).unwrap();
    let falling = model.forecast(5).forecast_values();
    assert!(falling.iter().all(|v| *v > 800.0 && *v < 900.0));
}

#[test]
fn test_unfitted_forecasts_empty() {
    init_logger();
    assert!(ArimaForecaster::new().forecast(4).is_empty());
    assert!(ExponentialSmoothingForecaster::new().forecast(4).is_empty());
    assert!(EnsembleForecaster::new().forecast(4).is_empty());
    assert!(matches!(
        ArimaForecaster::new().try_forecast(4),
        Err(ForecastError::NotFitted(_))
    ));
}

#[test]
fn test_zero_periods_is_empty() {
    init_logger();
    let mut model = ExponentialSmoothingForecaster::new();
    model.fit(&daily_series(&noisy_trend(20, 50.0, 0.5, 1))).unwrap();
    assert!(model.forecast(0).is_empty());
    assert!(matches!(
        model.try_forecast(0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_monthly_dates_follow_calendar() {
    init_logger();
    let pairs = (0..24u32).map(|i| {
        let date = Utc
            .with_ymd_and_hms(2022 + (i / 12) as i32, i % 12 + 1, 1, 0, 0, 0)
            .unwrap();
        (date, 200.0 + (i % 12) as f64 * 5.0)
    });
    let series = InventorySeries::from_pairs(pairs).unwrap();

    let mut model = ExponentialSmoothingForecaster::new();
    model.fit(&series).unwrap();
    let dates = model.forecast(3).dates();

    assert_eq!(
        dates,
        vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ]
    );
}

#[test]
fn test_frequency_override_from_config() {
    init_logger();
    let config = ForecastConfig::from_json_str(r#"{"frequency": "weekly"}"#).unwrap();
    let mut model = ArimaForecaster::from_config(config);
    model.fit(&daily_series(&noisy_trend(20, 80.0, 0.3, 2))).unwrap();

    let dates = model.forecast(2).dates();
    assert_eq!(dates[0], start() + Duration::days(19) + Duration::weeks(1));
    assert_eq!(dates[1] - dates[0], Duration::weeks(1));
}

/// Member that never fits
#[derive(Debug)]
struct Broken;

impl Forecaster for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    fn fit(&mut self, _series: &InventorySeries) -> Result<()> {
        Err(ForecastError::fit_failed("Broken", "singular matrix"))
    }

    fn try_forecast(&self, _periods: usize) -> Result<ForecastTable> {
        Err(ForecastError::NotFitted("Broken".to_string()))
    }

    fn is_fitted(&self) -> bool {
        false
    }
}

#[test]
fn test_ensemble_with_one_survivor_matches_it() {
    init_logger();
    let series = daily_series(&noisy_trend(40, 150.0, 0.4, 9));

    let mut ensemble = EnsembleForecaster::with_members(vec![
        Box::new(Broken) as Box<dyn Forecaster>,
        Box::new(ExponentialSmoothingForecaster::new()),
    ]);
    ensemble.fit(&series).unwrap();
    assert_eq!(ensemble.active_members(), vec!["ExponentialSmoothing"]);

    let mut alone = ExponentialSmoothingForecaster::new();
    alone.fit(&series).unwrap();

    assert_eq!(ensemble.forecast(10), alone.forecast(10));
}

#[test]
fn test_ensemble_averages_members() {
    init_logger();
    let series = daily_series(&noisy_trend(50, 300.0, -0.5, 21));

    let mut ensemble = EnsembleForecaster::new();
    ensemble.fit(&series).unwrap();
    let mut arima = ArimaForecaster::new();
    arima.fit(&series).unwrap();
    let mut smoothing = ExponentialSmoothingForecaster::new();
    smoothing.fit(&series).unwrap();

    let combined = ensemble.forecast(5);
    let a = arima.forecast(5);
    let b = smoothing.forecast(5);
    for i in 0..5 {
        let expected = (a.rows()[i].forecast + b.rows()[i].forecast) / 2.0;
        approx::assert_relative_eq!(combined.rows()[i].forecast, expected, epsilon = 1e-9);
    }
    assert_eq!(combined.dates(), a.dates());
}

#[test]
fn test_ensemble_fails_when_every_member_fails() {
    init_logger();
    let mut ensemble = EnsembleForecaster::with_members(vec![
        Box::new(Broken) as Box<dyn Forecaster>,
        Box::new(Broken),
    ]);

    let err = ensemble.fit(&daily_series(&noisy_trend(30, 10.0, 1.0, 4))).unwrap_err();
    assert!(matches!(err, ForecastError::FitFailed { .. }));
    assert!(ensemble.forecast(3).is_empty());
}
