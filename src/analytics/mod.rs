//! # Station Analytics
//!
//! Pure functions over a snapshot or a history of snapshots:
//!
//! - **WQI**: weighted 0-100 water quality index with letter grade
//! - **Compliance**: PASS / PARTIAL / FAIL against WHO-style limits
//! - **Efficiency**: litres desalinated per kWh of solar input
//! - **Forecast**: OLS projection of membrane maintenance
//! - **Summary**: session statistics

pub mod compliance;
pub mod efficiency;
pub mod forecast;
pub mod summary;
pub mod wqi;

pub use compliance::{check_compliance, check_readings, ComplianceCheck, ComplianceReport, ComplianceVerdict};
pub use efficiency::energy_efficiency;
pub use forecast::{fit_ols, forecast_maintenance, ForecastOutcome, ForecastPolicy, LinearFit, MaintenanceForecast};
pub use summary::SessionSummary;
pub use wqi::{compute_wqi, wqi_from_readings, Grade, GradeCutoffs, WqiPolicy, WqiScore};

use crate::domain::StationState;
use crate::error::Result;

/// Bundles the configurable policies so callers need a single handle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalyticsEngine {
    wqi: WqiPolicy,
    forecast: ForecastPolicy,
}

impl AnalyticsEngine {
    pub fn new(wqi: WqiPolicy, forecast: ForecastPolicy) -> Result<Self> {
        wqi.validate()?;
        forecast.validate()?;
        Ok(Self { wqi, forecast })
    }

    pub fn wqi_policy(&self) -> &WqiPolicy {
        &self.wqi
    }

    pub fn forecast_policy(&self) -> &ForecastPolicy {
        &self.forecast
    }

    pub fn wqi(&self, state: &StationState) -> WqiScore {
        compute_wqi(state, &self.wqi)
    }

    pub fn compliance(&self, state: &StationState) -> ComplianceReport {
        check_compliance(state)
    }

    /// L/kWh, `None` in the dark
    pub fn efficiency(&self, state: &StationState) -> Option<f64> {
        energy_efficiency(state.desalination_rate_lhr(), state.solar_irradiance_wm2())
    }

    pub fn forecast<'a, I>(&self, history: I) -> MaintenanceForecast
    where
        I: IntoIterator<Item = &'a StationState>,
    {
        forecast_maintenance(history, &self.forecast)
    }

    pub fn summary<'a, I>(&self, history: I, alert_count: usize) -> SessionSummary
    where
        I: IntoIterator<Item = &'a StationState>,
    {
        SessionSummary::from_history(history, alert_count, &self.wqi)
    }
}
