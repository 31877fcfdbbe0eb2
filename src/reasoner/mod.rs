//! # Autonomous Reasoner
//!
//! Inspects each state transition against a per-subsystem threshold table
//! and turns breaches into [`AlertEvent`]s plus one imperative narration line
//! per tick. Provides defense against:
//! - Membrane wear and biofilm build-up
//! - pH, turbidity and heavy-metal excursions
//! - Failed sensors reporting implausible readings
//! - Loss of solar drive at nightfall
//!
//! The reasoner holds no state of its own. Its debounce and sensor-suspicion
//! memory is an [`AlertMemory`] value passed in and handed back on every
//! call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::{
    AlertEvent, AlertKind, Channel, ClimateProfile, Severity, StationState, Subsystem,
};
use crate::error::{Result, TwinError};

/// Largest tick-to-tick change a healthy sensor can report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibleStep {
    pub ph: f64,
    pub turbidity_ntu: f64,
    pub heavy_metal_ppm: f64,
}

impl Default for PlausibleStep {
    fn default() -> Self {
        Self {
            ph: 2.0,
            turbidity_ntu: 50.0,
            heavy_metal_ppm: 0.5,
        }
    }
}

impl PlausibleStep {
    fn limit(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Ph => self.ph,
            Channel::Turbidity => self.turbidity_ntu,
            Channel::HeavyMetal => self.heavy_metal_ppm,
            _ => f64::INFINITY,
        }
    }
}

/// Threshold table and debounce window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Ticks an identical (subsystem, kind) alert stays suppressed after it fires
    pub cooldown_ticks: u64,
    pub biofouling_warning_pct: f64,
    pub membrane_critical_pct: f64,
    pub ph_min: f64,
    pub ph_max: f64,
    pub turbidity_warning_ntu: f64,
    pub heavy_metal_critical_ppm: f64,
    /// Afternoon irradiance below which the night cycle is announced
    pub night_irradiance_wm2: f64,
    pub plausible_step: PlausibleStep,
    /// Consecutive consistent readings before a jumped level is trusted
    pub fault_confirm_ticks: u32,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: 5,
            biofouling_warning_pct: 70.0,
            membrane_critical_pct: 30.0,
            ph_min: 6.5,
            ph_max: 8.5,
            turbidity_warning_ntu: 4.0,
            heavy_metal_critical_ppm: 0.01,
            night_irradiance_wm2: 200.0,
            plausible_step: PlausibleStep::default(),
            fault_confirm_ticks: 3,
        }
    }
}

impl ReasonerConfig {
    /// Conservative profile (earlier warnings, longer quiet periods)
    pub fn conservative() -> Self {
        Self {
            cooldown_ticks: 15,
            biofouling_warning_pct: 60.0,
            membrane_critical_pct: 40.0,
            turbidity_warning_ntu: 2.0,
            ..Default::default()
        }
    }

    /// Relaxed profile (fewer alerts, for demos)
    pub fn relaxed() -> Self {
        Self {
            cooldown_ticks: 30,
            biofouling_warning_pct: 80.0,
            membrane_critical_pct: 20.0,
            turbidity_warning_ntu: 8.0,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ph_min < self.ph_max) {
            return Err(TwinError::InvalidPolicy(format!(
                "pH band [{}, {}] is empty",
                self.ph_min, self.ph_max
            )));
        }
        let steps = self.plausible_step;
        if [steps.ph, steps.turbidity_ntu, steps.heavy_metal_ppm]
            .iter()
            .any(|s| !(*s > 0.0))
        {
            return Err(TwinError::InvalidPolicy(
                "plausible sensor steps must be positive".to_string(),
            ));
        }
        if self.fault_confirm_ticks < 2 {
            return Err(TwinError::InvalidPolicy(format!(
                "fault confirmation needs at least 2 readings, got {}",
                self.fault_confirm_ticks
            )));
        }
        Ok(())
    }
}

/// What the reasoner currently believes about one sensor
#[derive(Debug, Clone, Copy, PartialEq)]
struct SensorTrust {
    /// Last reading accepted as real
    trusted: f64,
    /// Trusted level before the most recent confirmed jump
    before_jump: Option<f64>,
    /// Latest unconfirmed reading and how many consistent readings led to it
    pending: Option<(f64, u32)>,
    suspect: bool,
}

impl SensorTrust {
    fn new(channel: Channel, reading: f64) -> Self {
        let trusted = if saturated(channel, reading) {
            channel.nominal()
        } else {
            reading
        };
        Self {
            trusted,
            before_jump: None,
            pending: None,
            suspect: false,
        }
    }

    fn accept(&mut self, reading: f64) {
        self.trusted = reading;
        self.pending = None;
        self.suspect = false;
    }
}

/// Bounded memory carried between observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertMemory {
    /// Tick each (subsystem, kind) last fired
    last_emitted: BTreeMap<(Subsystem, AlertKind), u64>,
    sensors: BTreeMap<Channel, SensorTrust>,
    /// Tick each sensor last raised a fault
    fault_reported: BTreeMap<Channel, u64>,
    /// Simulated day of the last night-cycle announcement
    night_announced_day: Option<u64>,
}

impl AlertMemory {
    pub fn last_emitted(&self, subsystem: Subsystem, kind: AlertKind) -> Option<u64> {
        self.last_emitted.get(&(subsystem, kind)).copied()
    }

    pub fn is_suspect(&self, channel: Channel) -> bool {
        self.sensors.get(&channel).map(|p| p.suspect).unwrap_or(false)
    }

    /// Last reading on `channel` accepted as real
    pub fn trusted(&self, channel: Channel) -> Option<f64> {
        self.sensors.get(&channel).map(|p| p.trusted)
    }

    fn fault_in_cooldown(&self, channel: Channel, tick: u64, cooldown: u64) -> bool {
        self.fault_reported
            .get(&channel)
            .map(|last| tick.saturating_sub(*last) < cooldown)
            .unwrap_or(false)
    }

    fn in_cooldown(&self, key: (Subsystem, AlertKind), tick: u64, cooldown: u64) -> bool {
        self.last_emitted
            .get(&key)
            .map(|last| tick.saturating_sub(*last) < cooldown)
            .unwrap_or(false)
    }

    fn forget_expired(&mut self, tick: u64, cooldown: u64) {
        self.last_emitted
            .retain(|_, last| tick.saturating_sub(*last) < cooldown);
        self.fault_reported
            .retain(|_, last| tick.saturating_sub(*last) < cooldown);
    }
}

/// Result of one observation
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub alerts: Vec<AlertEvent>,
    pub narration: String,
    pub memory: AlertMemory,
    /// Breaches held back by the cooldown this tick
    pub suppressed: usize,
}

/// Sensors checked for implausible jumps
const SENSED_CHANNELS: [Channel; 3] = [Channel::Ph, Channel::Turbidity, Channel::HeavyMetal];

/// A sensor pinned at the end of its range has failed, whatever it read before.
/// Turbidity and heavy metal legitimately read zero in clean water.
fn saturated(channel: Channel, reading: f64) -> bool {
    let (lo, hi) = channel.bounds();
    match channel {
        Channel::Ph => reading <= lo || reading >= hi,
        _ => reading >= hi,
    }
}

/// Stateless transition inspector
#[derive(Debug, Clone, Default)]
pub struct Reasoner {
    config: ReasonerConfig,
}

impl Reasoner {
    pub fn new(config: ReasonerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Inspect `prev -> next` and report alerts, narration and updated memory.
    pub fn observe(
        &self,
        prev: &StationState,
        next: &StationState,
        profile: &ClimateProfile,
        memory: AlertMemory,
    ) -> Observation {
        let mut memory = memory;
        let tick = next.tick();
        let cfg = &self.config;
        let mut alerts = Vec::new();
        let mut suppressed = 0;

        // Sensor health first: a suspected fault masks that channel's thresholds
        let mut masked = Vec::new();
        let mut faulted = Vec::new();
        for channel in SENSED_CHANNELS {
            if let Some(finding) = self.inspect_sensor(channel, prev, next, &mut memory) {
                masked.push(channel);
                faulted.push(finding);
            }
        }

        // Fault debounce is per sensor, so a second sensor failing is never hidden
        let (fresh, held): (Vec<_>, Vec<_>) = faulted
            .into_iter()
            .partition(|(c, _, _)| !memory.fault_in_cooldown(*c, tick, cfg.cooldown_ticks));
        if !held.is_empty() && fresh.is_empty() {
            suppressed += 1;
            debug!(station = %next.station_id(), tick, "sensor fault suppressed by cooldown");
        }
        if let Some(&(channel, _, to)) = fresh.first() {
            let described = fresh
                .iter()
                .map(|(c, from, to)| format!("{} ({:.4} -> {:.4})", c, from, to))
                .collect::<Vec<_>>()
                .join(", ");
            let event = self.event(
                next,
                Subsystem::Sensors,
                AlertKind::SensorFault,
                Severity::Warning,
                format!("implausible reading on {}: suspected sensor fault", described),
                channel,
                to,
                cfg.plausible_step.limit(channel),
            );
            for (c, _, _) in &fresh {
                memory.fault_reported.insert(*c, tick);
            }
            log_alert(&event);
            alerts.push(event);
        }

        let mut candidates = Vec::new();

        let afternoon = profile.tick_of_day(tick) > profile.noon_tick();
        let day = tick / profile.diurnal_period();
        if afternoon
            && memory.night_announced_day != Some(day)
            && prev.solar_irradiance_wm2() >= cfg.night_irradiance_wm2
            && next.solar_irradiance_wm2() < cfg.night_irradiance_wm2
        {
            candidates.push(self.event(
                next,
                Subsystem::Solar,
                AlertKind::NightCycle,
                Severity::Info,
                format!(
                    "night cycle approaching: irradiance {:.0} W/m² below {:.0} W/m², desalination capacity reduced",
                    next.solar_irradiance_wm2(),
                    cfg.night_irradiance_wm2
                ),
                Channel::SolarIrradiance,
                next.solar_irradiance_wm2(),
                cfg.night_irradiance_wm2,
            ));
        }

        if next.biofouling_pct() > cfg.biofouling_warning_pct {
            candidates.push(self.event(
                next,
                Subsystem::Membrane,
                AlertKind::BiofoulingSpike,
                Severity::Warning,
                format!(
                    "biofouling spiked to {:.1}% (threshold {:.1}%)",
                    next.biofouling_pct(),
                    cfg.biofouling_warning_pct
                ),
                Channel::Biofouling,
                next.biofouling_pct(),
                cfg.biofouling_warning_pct,
            ));
        }

        if next.membrane_integrity_pct() < cfg.membrane_critical_pct {
            candidates.push(self.event(
                next,
                Subsystem::Membrane,
                AlertKind::MaintenanceRequired,
                Severity::Critical,
                format!(
                    "membrane integrity {:.1}% below {:.1}%: maintenance now",
                    next.membrane_integrity_pct(),
                    cfg.membrane_critical_pct
                ),
                Channel::MembraneIntegrity,
                next.membrane_integrity_pct(),
                cfg.membrane_critical_pct,
            ));
        }

        let ph = next.ph();
        if !masked.contains(&Channel::Ph) && (ph < cfg.ph_min || ph > cfg.ph_max) {
            let threshold = if ph < cfg.ph_min { cfg.ph_min } else { cfg.ph_max };
            candidates.push(self.event(
                next,
                Subsystem::Water,
                AlertKind::PhExcursion,
                Severity::Warning,
                format!(
                    "pH {:.2} outside safe band [{:.2}, {:.2}]",
                    ph, cfg.ph_min, cfg.ph_max
                ),
                Channel::Ph,
                ph,
                threshold,
            ));
        }

        if !masked.contains(&Channel::Turbidity) && next.turbidity_ntu() > cfg.turbidity_warning_ntu {
            candidates.push(self.event(
                next,
                Subsystem::Water,
                AlertKind::TurbiditySpike,
                Severity::Warning,
                format!(
                    "turbidity {:.2} NTU above {:.2} NTU: sediment event probable",
                    next.turbidity_ntu(),
                    cfg.turbidity_warning_ntu
                ),
                Channel::Turbidity,
                next.turbidity_ntu(),
                cfg.turbidity_warning_ntu,
            ));
        }

        if !masked.contains(&Channel::HeavyMetal)
            && next.heavy_metal_ppm() > cfg.heavy_metal_critical_ppm
        {
            candidates.push(self.event(
                next,
                Subsystem::Water,
                AlertKind::HeavyMetalExceedance,
                Severity::Critical,
                format!(
                    "heavy metals {:.4} PPM above WHO limit {:.4} PPM",
                    next.heavy_metal_ppm(),
                    cfg.heavy_metal_critical_ppm
                ),
                Channel::HeavyMetal,
                next.heavy_metal_ppm(),
                cfg.heavy_metal_critical_ppm,
            ));
        }

        // Debounce: fixed window per (subsystem, kind)
        for event in candidates {
            if memory.in_cooldown(event.key(), tick, cfg.cooldown_ticks) {
                suppressed += 1;
                debug!(
                    station = %event.station_id,
                    tick,
                    kind = %event.kind,
                    "alert suppressed by cooldown"
                );
                continue;
            }
            memory.last_emitted.insert(event.key(), tick);
            if event.kind == AlertKind::NightCycle {
                memory.night_announced_day = Some(day);
            }
            log_alert(&event);
            alerts.push(event);
        }
        memory.forget_expired(tick, cfg.cooldown_ticks);

        let narration = narrate(tick, &alerts, suppressed);

        Observation {
            alerts,
            narration,
            memory,
            suppressed,
        }
    }

    /// Classify one sensor reading against what the sensor is trusted to read.
    ///
    /// A reading within the plausible step of the trusted level is accepted.
    /// A saturated reading is always a fault. Any other jump stays a fault
    /// until `fault_confirm_ticks` consecutive readings agree with each other.
    /// Returns `(channel, trusted, reading)` for a fault.
    fn inspect_sensor(
        &self,
        channel: Channel,
        prev: &StationState,
        next: &StationState,
        memory: &mut AlertMemory,
    ) -> Option<(Channel, f64, f64)> {
        let limit = self.config.plausible_step.limit(channel);
        let to = next.value(channel);
        let sensor = memory
            .sensors
            .entry(channel)
            .or_insert_with(|| SensorTrust::new(channel, prev.value(channel)));

        if saturated(channel, to) {
            sensor.pending = None;
            sensor.suspect = true;
            return Some((channel, sensor.trusted, to));
        }

        if (to - sensor.trusted).abs() <= limit {
            sensor.accept(to);
            return None;
        }

        // Back to where it was before a confirmed jump
        if let Some(level) = sensor.before_jump {
            if (to - level).abs() <= limit {
                sensor.before_jump = None;
                sensor.accept(to);
                return None;
            }
        }

        let streak = match sensor.pending {
            Some((last, count)) if (to - last).abs() <= limit => count + 1,
            _ => 1,
        };
        if streak >= self.config.fault_confirm_ticks {
            sensor.before_jump = Some(sensor.trusted);
            sensor.accept(to);
            return None;
        }

        sensor.pending = Some((to, streak));
        sensor.suspect = true;
        Some((channel, sensor.trusted, to))
    }

    #[allow(clippy::too_many_arguments)]
    fn event(
        &self,
        state: &StationState,
        subsystem: Subsystem,
        kind: AlertKind,
        severity: Severity,
        message: String,
        metric: Channel,
        value: f64,
        threshold: f64,
    ) -> AlertEvent {
        AlertEvent {
            station_id: state.station_id().to_string(),
            tick: state.tick(),
            subsystem,
            kind,
            severity,
            message,
            metric,
            value,
            threshold,
        }
    }
}

fn log_alert(event: &AlertEvent) {
    match event.severity {
        Severity::Info => info!(
            station = %event.station_id,
            tick = event.tick,
            kind = %event.kind,
            "{}", event.message
        ),
        Severity::Warning | Severity::Critical => warn!(
            station = %event.station_id,
            tick = event.tick,
            severity = %event.severity,
            kind = %event.kind,
            "{}", event.message
        ),
    }
}

/// Corrective action for each alert kind, phrased as an order
pub fn corrective_action(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::NightCycle => "Throttle desalination to night-cycle throughput",
        AlertKind::BiofoulingSpike => "Engage quorum quenching and flush the membrane",
        AlertKind::MaintenanceRequired => "Schedule membrane replacement now",
        AlertKind::PhExcursion => "Dose pH correction and trace mineral runoff",
        AlertKind::TurbiditySpike => "Divert intake through the sediment settler",
        AlertKind::HeavyMetalExceedance => "Isolate output and route through ion-exchange polish",
        AlertKind::SensorFault => "Discard the reading and recalibrate the sensor",
    }
}

/// One log line for the tick, driven by the most severe emitted alert.
///
/// Ties go to the alert raised first, which follows the fixed order of the
/// threshold table.
pub fn narrate(tick: u64, alerts: &[AlertEvent], suppressed: usize) -> String {
    let lead = alerts
        .iter()
        .fold(None::<&AlertEvent>, |best, a| match best {
            Some(b) if b.severity >= a.severity => Some(b),
            _ => Some(a),
        });

    match lead {
        Some(alert) => {
            let extra = if alerts.len() > 1 {
                format!(" [+{} more]", alerts.len() - 1)
            } else {
                String::new()
            };
            format!(
                "[T+{:06}] {} {}/{}: {} ({}){}",
                tick,
                alert.severity,
                alert.subsystem,
                alert.kind,
                corrective_action(alert.kind),
                alert.message,
                extra
            )
        }
        None if suppressed > 0 => format!(
            "[T+{:06}] MONITOR: Continue corrective actions ({} persistent condition(s) under cooldown)",
            tick, suppressed
        ),
        None => format!(
            "[T+{:06}] NOMINAL: Continue autonomous operation (all subsystems within thresholds)",
            tick
        ),
    }
}
