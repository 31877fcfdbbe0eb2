//! Maintenance Forecast
//!
//! Ordinary least squares over the trailing window of membrane integrity
//! readings, extrapolated to the tick where the fitted line crosses the
//! critical threshold.

use serde::{Deserialize, Serialize};

use crate::domain::StationState;
use crate::error::{Result, TwinError};

/// Forecast window and threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    /// Trailing samples used for the fit
    pub window: usize,
    /// Samples required before a forecast is attempted
    pub min_samples: usize,
    /// Membrane integrity (%) at which maintenance is due
    pub critical_threshold_pct: f64,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            window: 60,
            min_samples: 10,
            critical_threshold_pct: 30.0,
        }
    }
}

impl ForecastPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.min_samples < 2 {
            return Err(TwinError::InvalidPolicy(format!(
                "forecast needs at least 2 samples, got min_samples={}",
                self.min_samples
            )));
        }
        if self.window < self.min_samples {
            return Err(TwinError::InvalidPolicy(format!(
                "forecast window {} shorter than min_samples {}",
                self.window, self.min_samples
            )));
        }
        if !(0.0..=100.0).contains(&self.critical_threshold_pct) {
            return Err(TwinError::InvalidPolicy(format!(
                "critical threshold {}% outside [0, 100]",
                self.critical_threshold_pct
            )));
        }
        Ok(())
    }
}

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub samples: usize,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares fit of `(x, y)` points.
///
/// Returns `None` for fewer than two points or when every x is equal.
pub fn fit_ols(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let (sxx, sxy, syy) = points.iter().fold((0.0, 0.0, 0.0), |(sxx, sxy, syy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (sxx + dx * dx, sxy + dx * dy, syy + dy * dy)
    });

    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r2 = if syy > 1e-12 {
        (sxy * sxy) / (sxx * syy)
    } else {
        1.0 // flat line fits exactly
    };

    Some(LinearFit {
        slope,
        intercept,
        r2,
        samples: n,
    })
}

/// Result of a maintenance projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForecastOutcome {
    /// Fewer samples than the policy requires
    InsufficientHistory { samples: usize, required: usize },
    /// Fitted slope is flat or rising; no crossing to project
    NotDegrading,
    /// Latest reading is already at or below the threshold
    ThresholdReached,
    /// Fitted line crosses the threshold at `crossing_tick`
    Projected { crossing_tick: f64, ticks_remaining: f64 },
}

/// Derived forecast, computed on demand from history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceForecast {
    /// Latest membrane integrity (%), if any history exists
    pub current_integrity_pct: Option<f64>,
    pub fit: Option<LinearFit>,
    pub threshold_pct: f64,
    pub outcome: ForecastOutcome,
}

impl MaintenanceForecast {
    /// Ticks left before maintenance is due; `None` when unknown or not
    /// applicable.
    pub fn ticks_until_threshold(&self) -> Option<f64> {
        match self.outcome {
            ForecastOutcome::Projected {
                ticks_remaining, ..
            } => Some(ticks_remaining),
            ForecastOutcome::ThresholdReached => Some(0.0),
            _ => None,
        }
    }
}

/// Project when membrane integrity crosses the policy threshold.
///
/// Only the trailing `policy.window` states are fitted, against their tick
/// indices.
pub fn forecast_maintenance<'a, I>(history: I, policy: &ForecastPolicy) -> MaintenanceForecast
where
    I: IntoIterator<Item = &'a StationState>,
{
    let points: Vec<(f64, f64)> = history
        .into_iter()
        .map(|s| (s.tick() as f64, s.membrane_integrity_pct()))
        .collect();
    let window = &points[points.len().saturating_sub(policy.window)..];

    let current = window.last().copied();
    let threshold_pct = policy.critical_threshold_pct;

    let insufficient = MaintenanceForecast {
        current_integrity_pct: current.map(|(_, y)| y),
        fit: None,
        threshold_pct,
        outcome: ForecastOutcome::InsufficientHistory {
            samples: window.len(),
            required: policy.min_samples,
        },
    };

    let Some((current_tick, current_integrity)) = current else {
        return insufficient;
    };
    if window.len() < policy.min_samples {
        return insufficient;
    }

    let Some(fit) = fit_ols(window) else {
        return insufficient;
    };

    let outcome = if current_integrity <= threshold_pct {
        ForecastOutcome::ThresholdReached
    } else if fit.slope >= 0.0 {
        ForecastOutcome::NotDegrading
    } else {
        let crossing_tick = (threshold_pct - fit.intercept) / fit.slope;
        ForecastOutcome::Projected {
            crossing_tick,
            ticks_remaining: (crossing_tick - current_tick).max(0.0),
        }
    };

    MaintenanceForecast {
        current_integrity_pct: Some(current_integrity),
        fit: Some(fit),
        threshold_pct,
        outcome,
    }
}
