//! ARIMA estimation by conditional sum of squares
//!
//! The model on the `d`-times differenced series `w_t` is
//!
//! `w_t = c + Σ φ_i (w_{t-i} - c) + Σ θ_j e_{t-j} + e_t`
//!
//! with `c` fixed at zero whenever `d > 0` (no drift term). Coefficients are
//! estimated with a bounded Nelder-Mead search over the stationary and
//! invertible region, and forecast standard errors come from the psi weights
//! of the integrated process.

use crate::differencing::{difference, integrate};
use crate::optimization::{nelder_mead, NelderMeadConfig};
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average order
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Shortest series this order can be estimated from
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }

    fn has_intercept(&self) -> bool {
        self.d == 0
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// A fitted ARIMA model
#[derive(Debug, Clone)]
pub struct ArimaFit {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
}

impl ArimaFit {
    /// Estimate an ARIMA model of the given order
    pub fn estimate(values: &[f64], order: ArimaOrder, config: &NelderMeadConfig) -> Result<Self> {
        let needed = order.min_observations();
        if values.len() < needed {
            return Err(MathError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let differenced = difference(values, order.d);
        let (p, q) = (order.p, order.q);

        let mean = differenced.iter().sum::<f64>() / differenced.len() as f64;
        let intercept_guess = if order.has_intercept() { mean } else { 0.0 };

        let (intercept, ar, ma) = if p == 0 && q == 0 {
            (intercept_guess, Vec::new(), Vec::new())
        } else {
            let offset = usize::from(order.has_intercept());
            let mut initial = Vec::with_capacity(offset + p + q);
            let mut bounds = Vec::with_capacity(offset + p + q);
            if order.has_intercept() {
                initial.push(intercept_guess);
                bounds.push((f64::NEG_INFINITY, f64::INFINITY));
            }
            for lag in (1..=p).chain(1..=q) {
                initial.push(0.1 / lag as f64);
                bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
            }

            let split = |params: &[f64]| {
                let c = if offset == 1 { params[0] } else { 0.0 };
                (
                    c,
                    params[offset..offset + p].to_vec(),
                    params[offset + p..].to_vec(),
                )
            };

            let result = nelder_mead(
                |params| {
                    let (c, ar, ma) = split(params);
                    conditional_sum_of_squares(&differenced, c, &ar, &ma)
                },
                &initial,
                Some(bounds.as_slice()),
                config,
            );

            if !result.optimal_value.is_finite() || result.optimal_value == f64::MAX {
                return Err(MathError::CalculationError(format!(
                    "{} estimation did not produce a finite objective",
                    order
                )));
            }
            split(&result.optimal_point)
        };

        let residuals = conditional_residuals(&differenced, intercept, &ar, &ma);
        let start = p.max(q);
        let effective = &residuals[start.min(residuals.len())..];
        if effective.is_empty() {
            return Err(MathError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        let sigma2 = effective.iter().map(|r| r * r).sum::<f64>() / effective.len() as f64;
        if !sigma2.is_finite() {
            return Err(MathError::CalculationError(
                "Residual variance is not finite".to_string(),
            ));
        }

        Ok(Self {
            order,
            intercept,
            ar,
            ma,
            history: values.to_vec(),
            differenced,
            residuals,
            sigma2,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// In-sample residuals on the differenced scale
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Point forecasts and their standard errors for `horizon` steps
    pub fn forecast(&self, horizon: usize) -> (Vec<f64>, Vec<f64>) {
        if horizon == 0 {
            return (Vec::new(), Vec::new());
        }

        let c = self.intercept;
        let mut extended = self.differenced.clone();
        let mut shocks = self.residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = c;
            for (i, phi) in self.ar.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - c);
                }
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if t > j {
                    pred += theta * shocks[t - 1 - j];
                }
            }
            extended.push(pred);
            // Future shocks have zero expectation
            shocks.push(0.0);
        }

        let on_diff_scale = &extended[self.differenced.len()..];
        let means = integrate(on_diff_scale, &self.history, self.order.d);

        let psi = integrated_psi_weights(&self.ar, &self.ma, self.order.d, horizon);
        let mut cumulative = 0.0;
        let std_errors = psi
            .iter()
            .map(|w| {
                cumulative += w * w;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        (means, std_errors)
    }
}

/// One-step-ahead residuals of an ARMA recursion; the first `max(p, q)` are zero.
pub fn conditional_residuals(series: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let n = series.len();
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; n];

    for t in start..n {
        let mut pred = intercept;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * (series[t - 1 - i] - intercept);
        }
        for (j, theta) in ma.iter().enumerate() {
            pred += theta * residuals[t - 1 - j];
        }
        residuals[t] = series[t] - pred;
    }

    residuals
}

/// Conditional sum of squared residuals, `f64::MAX` when there is nothing to score
pub fn conditional_sum_of_squares(series: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let start = ar.len().max(ma.len());
    if series.len() <= start {
        return f64::MAX;
    }
    conditional_residuals(series, intercept, ar, ma)[start..]
        .iter()
        .map(|e| e * e)
        .sum()
}

/// Psi weights `ψ_0..ψ_{h-1}` of ARMA(p, q), cumulated `d` times for integration
pub fn integrated_psi_weights(ar: &[f64], ma: &[f64], d: usize, horizon: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut weight = ma.get(j - 1).copied().unwrap_or(0.0);
        for (i, phi) in ar.iter().enumerate() {
            if i < j {
                weight += phi * psi[j - 1 - i];
            }
        }
        psi.push(weight);
    }

    for _ in 0..d {
        let mut running = 0.0;
        for w in psi.iter_mut() {
            running += *w;
            *w = running;
        }
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trending(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 2.0 * i as f64 + (i as f64 * 0.9).sin() * 3.0)
            .collect()
    }

    #[test]
    fn test_psi_weights() {
        // ARMA(1,1): psi_1 = phi + theta, psi_2 = phi * psi_1
        let psi = integrated_psi_weights(&[0.5], &[0.2], 0, 3);
        assert_relative_eq!(psi[0], 1.0);
        assert_relative_eq!(psi[1], 0.7);
        assert_relative_eq!(psi[2], 0.35);

        let integrated = integrated_psi_weights(&[0.5], &[0.2], 1, 3);
        assert_relative_eq!(integrated[2], 2.05);
    }

    #[test]
    fn test_estimate_arima_111() {
        let values = trending(40);
        let fit = ArimaFit::estimate(&values, ArimaOrder::default(), &NelderMeadConfig::default())
            .unwrap();

        assert_eq!(fit.ar_coefficients().len(), 1);
        assert_eq!(fit.ma_coefficients().len(), 1);
        assert!(fit.ar_coefficients()[0].abs() <= COEFFICIENT_BOUND);
        assert_eq!(fit.intercept(), 0.0);

        let (means, std_errors) = fit.forecast(5);
        assert_eq!(means.len(), 5);
        assert!(means.iter().all(|m| m.is_finite()));
        // Uncertainty grows with the horizon
        for pair in std_errors.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_constant_series_has_zero_variance() {
        let values = vec![10.0; 12];
        let fit = ArimaFit::estimate(&values, ArimaOrder::default(), &NelderMeadConfig::default())
            .unwrap();
        assert_relative_eq!(fit.sigma2(), 0.0, epsilon = 1e-12);
        let (means, std_errors) = fit.forecast(3);

        for m in means {
            assert_relative_eq!(m, 10.0, epsilon = 1e-9);
        }
        for se in std_errors {
            assert_relative_eq!(se, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_too_short_series() {
        let config = NelderMeadConfig::default();
        let err = ArimaFit::estimate(&[1.0, 2.0, 3.0], ArimaOrder::default(), &config).unwrap_err();
        assert_eq!(err, MathError::InsufficientData { needed: 4, got: 3 });
    }

    #[test]
    fn test_non_finite_input() {
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0];
        assert!(ArimaFit::estimate(&values, ArimaOrder::default(), &NelderMeadConfig::default())
            .is_err());
    }
}
