//! Tabular and JSON export of station data.
//!
//! Output is plain text. Station ids are written verbatim; renderers that
//! embed exported text in markup must escape it first.

use itertools::Itertools;

use crate::analytics::AnalyticsEngine;
use crate::domain::{AlertEvent, Channel, StationState};
use crate::error::Result;
use crate::registry::SimClock;

/// Telemetry columns, in export order
const CHANNEL_COLUMNS: [Channel; 8] = [
    Channel::SolarIrradiance,
    Channel::Ph,
    Channel::Turbidity,
    Channel::Biofouling,
    Channel::HeavyMetal,
    Channel::MembraneIntegrity,
    Channel::DesalinationRate,
    Channel::EnergyEfficiency,
];

/// Header row of [`history_csv`]
pub fn csv_header() -> String {
    ["tick", "timestamp"]
        .into_iter()
        .map(str::to_string)
        .chain(CHANNEL_COLUMNS.iter().map(|c| c.to_string()))
        .chain(["wqi", "grade", "verdict"].into_iter().map(str::to_string))
        .join(",")
}

/// One row per snapshot: tick, simulated timestamp, every channel, WQI,
/// grade and compliance verdict.
///
/// `energy_efficiency_lkwh` is left empty below the irradiance floor, where
/// efficiency is undefined, rather than showing the stored 0.
pub fn history_csv<'a, I>(history: I, analytics: &AnalyticsEngine, clock: &SimClock) -> String
where
    I: IntoIterator<Item = &'a StationState>,
{
    let mut out = csv_header();
    out.push('\n');

    for state in history {
        let wqi = analytics.wqi(state);
        let verdict = analytics.compliance(state).verdict;
        let cell = |channel: Channel| match channel {
            Channel::EnergyEfficiency => analytics
                .efficiency(state)
                .map(|e| format!("{:.4}", e))
                .unwrap_or_default(),
            _ => format!("{:.4}", state.value(channel)),
        };

        let row = [state.tick().to_string(), clock.timestamp(state.tick()).to_rfc3339()]
            .into_iter()
            .chain(CHANNEL_COLUMNS.iter().map(|c| cell(*c)))
            .chain([format!("{:.2}", wqi.score), wqi.grade.to_string(), verdict.to_string()])
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    out
}

/// Alert log as a JSON array
pub fn alerts_json<'a, I>(alerts: I) -> Result<String>
where
    I: IntoIterator<Item = &'a AlertEvent>,
{
    let alerts: Vec<&AlertEvent> = alerts.into_iter().collect();
    Ok(serde_json::to_string_pretty(&alerts)?)
}
