//! Additive exponential smoothing: Holt's linear trend and Holt-Winters
//!
//! Level, trend and (optionally) seasonal state are updated with
//!
//! - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
//! - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
//!
//! and forecast as `ŷ_{t+h} = l_t + h·b_t + s_{t+h-m}`. Without a seasonal
//! component the `s` terms are zero.

use crate::optimization::{nelder_mead, NelderMeadConfig};
use crate::{MathError, Result};

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Which smoothing model to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingKind {
    /// Additive trend, no seasonality
    Holt,
    /// Additive trend and additive seasonality with the given period
    HoltWinters { period: usize },
}

impl SmoothingKind {
    /// Shortest series the model can be fitted to
    pub fn min_observations(&self) -> usize {
        match self {
            SmoothingKind::Holt => 3,
            SmoothingKind::HoltWinters { period } => 2 * period,
        }
    }

    fn validate(&self, len: usize) -> Result<()> {
        if let SmoothingKind::HoltWinters { period } = self {
            if *period < 2 {
                return Err(MathError::InvalidInput(format!(
                    "Seasonal period must be at least 2, got {}",
                    period
                )));
            }
        }
        let needed = self.min_observations();
        if len < needed {
            return Err(MathError::InsufficientData { needed, got: len });
        }
        Ok(())
    }
}

/// Smoothing state after a pass over the data
#[derive(Debug, Clone)]
pub struct SmoothingFit {
    kind: SmoothingKind,
    alpha: f64,
    beta: f64,
    gamma: Option<f64>,
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    n: usize,
    residuals: Vec<f64>,
}

impl SmoothingFit {
    /// Run the recursion with fixed smoothing parameters.
    /// `gamma` is ignored for [`SmoothingKind::Holt`].
    pub fn run(
        values: &[f64],
        kind: SmoothingKind,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        kind.validate(values.len())?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(MathError::InvalidInput(format!(
                    "{} must be between 0 and 1 (exclusive), got {}",
                    name, value
                )));
            }
        }

        Ok(match kind {
            SmoothingKind::Holt => Self::run_holt(values, alpha, beta),
            SmoothingKind::HoltWinters { period } => {
                Self::run_holt_winters(values, alpha, beta, gamma, period)
            }
        })
    }

    /// Choose smoothing parameters by minimising the in-sample SSE
    pub fn optimize(
        values: &[f64],
        kind: SmoothingKind,
        config: &NelderMeadConfig,
    ) -> Result<Self> {
        kind.validate(values.len())?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let (initial, bounds): (Vec<f64>, Vec<(f64, f64)>) = match kind {
            SmoothingKind::Holt => (vec![0.3, 0.1], vec![PARAM_BOUNDS; 2]),
            SmoothingKind::HoltWinters { .. } => (vec![0.3, 0.1, 0.1], vec![PARAM_BOUNDS; 3]),
        };

        let result = nelder_mead(
            |params| {
                let gamma = params.get(2).copied().unwrap_or(0.5);
                match kind {
                    SmoothingKind::Holt => Self::run_holt(values, params[0], params[1]).sse(),
                    SmoothingKind::HoltWinters { period } => {
                        Self::run_holt_winters(values, params[0], params[1], gamma, period).sse()
                    }
                }
            },
            &initial,
            Some(bounds.as_slice()),
            config,
        );

        let clamp = |i: usize| {
            result
                .optimal_point
                .get(i)
                .copied()
                .unwrap_or(0.5)
                .clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)
        };
        let fit = Self::run(values, kind, clamp(0), clamp(1), clamp(2))?;
        if !fit.sse().is_finite() {
            return Err(MathError::CalculationError(
                "Smoothing produced a non-finite error sum".to_string(),
            ));
        }
        Ok(fit)
    }

    fn run_holt(values: &[f64], alpha: f64, beta: f64) -> Self {
        let n = values.len();
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut residuals = Vec::with_capacity(n.saturating_sub(2));

        // The second observation is reproduced exactly by the initial trend
        let prev = level;
        level = alpha * values[1] + (1.0 - alpha) * (prev + trend);
        trend = beta * (level - prev) + (1.0 - beta) * trend;

        for &y in &values[2..] {
            let forecast = level + trend;
            residuals.push(y - forecast);

            let prev = level;
            level = alpha * y + (1.0 - alpha) * (prev + trend);
            trend = beta * (level - prev) + (1.0 - beta) * trend;
        }

        Self {
            kind: SmoothingKind::Holt,
            alpha,
            beta,
            gamma: None,
            level,
            trend,
            seasonals: Vec::new(),
            n,
            residuals,
        }
    }

    fn run_holt_winters(values: &[f64], alpha: f64, beta: f64, gamma: f64, period: usize) -> Self {
        let n = values.len();
        let m = period as f64;

        let first_season = &values[..period];
        let mut level = first_season.iter().sum::<f64>() / m;
        let mut trend = (0..period)
            .map(|i| (values[period + i] - values[i]) / m)
            .sum::<f64>()
            / m;
        let mut seasonals: Vec<f64> = first_season.iter().map(|y| y - level).collect();
        let adjustment = seasonals.iter().sum::<f64>() / m;
        for s in seasonals.iter_mut() {
            *s -= adjustment;
        }

        let mut residuals = Vec::with_capacity(n - period);

        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];
            let forecast = level + trend + s;
            residuals.push(y - forecast);

            let prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (prev + trend);
            trend = beta * (level - prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        Self {
            kind: SmoothingKind::HoltWinters { period },
            alpha,
            beta,
            gamma: Some(gamma),
            level,
            trend,
            seasonals,
            n,
            residuals,
        }
    }

    /// Forecast `horizon` steps past the end of the data
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| {
                let seasonal = match self.kind {
                    SmoothingKind::Holt => 0.0,
                    SmoothingKind::HoltWinters { period } => {
                        self.seasonals[(self.n + h - 1) % period]
                    }
                };
                self.level + h as f64 * self.trend + seasonal
            })
            .collect()
    }

    /// Sum of squared one-step-ahead errors
    pub fn sse(&self) -> f64 {
        self.residuals.iter().map(|e| e * e).sum()
    }

    pub fn kind(&self) -> SmoothingKind {
        self.kind
    }

    /// `(alpha, beta, gamma)`
    pub fn params(&self) -> (f64, f64, Option<f64>) {
        (self.alpha, self.beta, self.gamma)
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// One-step-ahead residuals after the initialisation window
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_holt_on_linear_series() {
        let values: Vec<f64> = (0..10).map(|i| 10.0 + 5.0 * i as f64).collect();
        let fit = SmoothingFit::run(&values, SmoothingKind::Holt, 0.5, 0.3, 0.5).unwrap();

        // A perfect line is tracked exactly
        assert_relative_eq!(fit.trend(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(fit.sse(), 0.0, epsilon = 1e-9);
        let forecast = fit.forecast(2);
        assert_relative_eq!(forecast[0], 60.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[1], 65.0, epsilon = 1e-9);
    }

    #[test]
    fn test_holt_winters_repeats_season() {
        let pattern = [10.0, 20.0, 30.0, 20.0];
        let values: Vec<f64> = (0..16).map(|i| pattern[i % 4]).collect();
        let fit = SmoothingFit::optimize(
            &values,
            SmoothingKind::HoltWinters { period: 4 },
            &NelderMeadConfig::default(),
        )
        .unwrap();

        let forecast = fit.forecast(4);
        for (f, expected) in forecast.iter().zip(pattern.iter()) {
            assert!((f - expected).abs() < 1.0, "{} vs {}", f, expected);
        }
        assert_eq!(fit.residuals().len(), 12);

        let (alpha, beta, gamma) = fit.params();
        for p in [alpha, beta, gamma.unwrap()] {
            assert!((PARAM_BOUNDS.0..=PARAM_BOUNDS.1).contains(&p));
        }
    }

    #[test]
    fn test_minimum_lengths() {
        assert!(SmoothingFit::run(&[1.0, 2.0], SmoothingKind::Holt, 0.5, 0.5, 0.5).is_err());
        let short: Vec<f64> = (0..7).map(|i| i as f64).collect();
        let err = SmoothingFit::optimize(
            &short,
            SmoothingKind::HoltWinters { period: 4 },
            &NelderMeadConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, MathError::InsufficientData { needed: 8, got: 7 });
    }

    #[test]
    fn test_invalid_parameters() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(SmoothingFit::run(&values, SmoothingKind::Holt, 1.5, 0.5, 0.5).is_err());
        let single = SmoothingKind::HoltWinters { period: 1 };
        assert!(SmoothingFit::run(&values, single, 0.5, 0.5, 0.5).is_err());
    }
}
