use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wqi::{compute_wqi, WqiPolicy};
use crate::domain::StationState;

/// Session statistics over a station's retained history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Latest tick reached
    pub ticks_elapsed: u64,
    /// Snapshots the statistics cover
    pub samples: usize,
    pub avg_irradiance_wm2: Option<f64>,
    pub irradiance_range_wm2: Option<(f64, f64)>,
    pub avg_membrane_pct: Option<f64>,
    pub avg_ph: Option<f64>,
    pub avg_wqi: Option<f64>,
    /// Alerts emitted over the whole session
    pub alert_count: usize,
}

impl SessionSummary {
    pub fn from_history<'a, I>(history: I, alert_count: usize, policy: &WqiPolicy) -> Self
    where
        I: IntoIterator<Item = &'a StationState>,
    {
        let states: Vec<&StationState> = history.into_iter().collect();

        let irradiance_range_wm2 = match states.iter().map(|s| s.solar_irradiance_wm2()).minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        };

        Self {
            ticks_elapsed: states.last().map(|s| s.tick()).unwrap_or(0),
            samples: states.len(),
            avg_irradiance_wm2: mean(states.iter().map(|s| s.solar_irradiance_wm2())),
            irradiance_range_wm2,
            avg_membrane_pct: mean(states.iter().map(|s| s.membrane_integrity_pct())),
            avg_ph: mean(states.iter().map(|s| s.ph())),
            avg_wqi: mean(states.iter().map(|s| compute_wqi(s, policy).score)),
            alert_count,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "N/A".into());
        write!(
            f,
            "Summary: ticks={}, avg irradiance={} W/m², avg membrane={}%, avg pH={}, avg WQI={}, alerts={}",
            self.ticks_elapsed,
            show(self.avg_irradiance_wm2),
            show(self.avg_membrane_pct),
            show(self.avg_ph),
            show(self.avg_wqi),
            self.alert_count
        )
    }
}

/// Arithmetic mean, `None` for an empty sequence
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
