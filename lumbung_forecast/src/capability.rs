//! Availability of the statistical forecasting capability
//!
//! Builds without the `stats` feature keep the whole public surface but every
//! entry point short-circuits: `fit` fails, `forecast` is empty and metrics are
//! an empty map. Callers that never forecast are unaffected.

use crate::error::{ForecastError, Result};

/// Whether this build carries the statistical models
pub const STATS_AVAILABLE: bool = cfg!(feature = "stats");

/// Capability flag consulted by every forecasting entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsCapability {
    available: bool,
}

impl StatsCapability {
    /// The capability compiled into this build
    pub const fn detect() -> Self {
        Self {
            available: STATS_AVAILABLE,
        }
    }

    /// A capability that is always missing
    pub const fn unavailable() -> Self {
        Self { available: false }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// `Err(DependencyUnavailable)` unless the capability is present
    pub fn ensure(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(ForecastError::DependencyUnavailable)
        }
    }
}

impl Default for StatsCapability {
    fn default() -> Self {
        Self::detect()
    }
}
