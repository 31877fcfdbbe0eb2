use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::state::{Channel, StationId};

/// Alert severity, ordered `Info < Warning < Critical`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Station subsystem an alert is attributed to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Subsystem {
    /// Solar collector and desalination drive
    #[strum(serialize = "solar")]
    Solar,
    /// Membrane stack and biofilm defence
    #[strum(serialize = "membrane")]
    Membrane,
    /// Water chemistry (pH, turbidity, heavy metals)
    #[strum(serialize = "water")]
    Water,
    /// Sensor array health
    #[strum(serialize = "sensors")]
    Sensors,
}

/// What condition an alert reports
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum AlertKind {
    #[strum(serialize = "night-cycle")]
    NightCycle,
    #[strum(serialize = "biofouling-spike")]
    BiofoulingSpike,
    #[strum(serialize = "maintenance-required")]
    MaintenanceRequired,
    #[strum(serialize = "ph-excursion")]
    PhExcursion,
    #[strum(serialize = "turbidity-spike")]
    TurbiditySpike,
    #[strum(serialize = "heavy-metal-exceedance")]
    HeavyMetalExceedance,
    #[strum(serialize = "sensor-fault")]
    SensorFault,
}

/// One alert raised by the reasoner.
///
/// `message` is plain text. Renderers must escape it before embedding it in
/// markup; see [`crate::text::escape_markup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub station_id: StationId,
    pub tick: u64,
    pub subsystem: Subsystem,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// Triggering metric
    pub metric: Channel,
    /// Observed value of `metric`
    pub value: f64,
    /// Threshold that was crossed
    pub threshold: f64,
}

impl AlertEvent {
    /// Debounce key
    pub fn key(&self) -> (Subsystem, AlertKind) {
        (self.subsystem, self.kind)
    }
}
