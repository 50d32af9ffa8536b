//! Differencing and integration of series

/// Apply `d` rounds of first differencing
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut current = values.to_vec();
    for _ in 0..d {
        if current.len() < 2 {
            return Vec::new();
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Undo `d` rounds of differencing on values that continue `history`.
///
/// `forecast_diff` lives on the `d`-times differenced scale and follows the
/// end of `history` directly.
pub fn integrate(forecast_diff: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    if d == 0 {
        return forecast_diff.to_vec();
    }

    // Last observed value at each differencing level 0..d-1
    let anchors: Vec<f64> = (0..d)
        .map(|level| difference(history, level).last().copied().unwrap_or(0.0))
        .collect();

    let mut current = forecast_diff.to_vec();
    for level in (0..d).rev() {
        let mut running = anchors[level];
        current = current
            .iter()
            .map(|delta| {
                running += delta;
                running
            })
            .collect();
    }
    current
}
