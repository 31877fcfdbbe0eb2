use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::mem;
use tracing::{debug, info};

use crate::domain::{AlertEvent, ClimateProfile, StationId, StationState};
use crate::reasoner::{AlertMemory, Reasoner};
use crate::simulation::{initial_state, seeded_stream, step, SeededStream};

/// Geographic placement of a station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

/// Everything the registry owns for one station.
///
/// The random stream, history and reasoner memory are private to the record;
/// stations never share any mutable state.
#[derive(Debug, Clone)]
pub struct StationRecord {
    id: StationId,
    site: Site,
    seed: u64,
    profile: ClimateProfile,
    rng: SeededStream,
    history: VecDeque<StationState>,
    alerts: VecDeque<AlertEvent>,
    alert_total: usize,
    narration: VecDeque<String>,
    memory: AlertMemory,
    service_pending: bool,
}

impl StationRecord {
    pub(crate) fn commission(id: StationId, site: Site, seed: u64, profile: ClimateProfile) -> Self {
        let state = initial_state(&id, &profile);
        let mut history = VecDeque::new();
        history.push_back(state);

        Self {
            id,
            site,
            seed,
            profile,
            rng: seeded_stream(seed),
            history,
            alerts: VecDeque::new(),
            alert_total: 0,
            narration: VecDeque::new(),
            memory: AlertMemory::default(),
            service_pending: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn profile(&self) -> &ClimateProfile {
        &self.profile
    }

    /// Retained snapshots, oldest first
    pub fn history(&self) -> &VecDeque<StationState> {
        &self.history
    }

    /// Latest snapshot. A record always holds at least its commissioning state.
    pub fn latest(&self) -> &StationState {
        &self.history[self.history.len() - 1]
    }

    /// Most recent alerts, oldest first
    pub fn alerts(&self) -> &VecDeque<AlertEvent> {
        &self.alerts
    }

    /// Alerts emitted since commissioning, including evicted ones
    pub fn alert_total(&self) -> usize {
        self.alert_total
    }

    /// Retained narration lines, oldest first
    pub fn narration(&self) -> &VecDeque<String> {
        &self.narration
    }

    pub fn memory(&self) -> &AlertMemory {
        &self.memory
    }

    pub fn service_pending(&self) -> bool {
        self.service_pending
    }

    pub(crate) fn schedule_service(&mut self) {
        self.service_pending = true;
    }

    /// Advance one tick, returning the alerts it emitted.
    pub(crate) fn advance(&mut self, reasoner: &Reasoner, retention: Retention) -> Vec<AlertEvent> {
        let latest = self.latest();
        let prev = if self.service_pending {
            info!(station = %self.id, tick = latest.tick(), "membrane replaced");
            latest.serviced()
        } else {
            latest.clone()
        };
        self.service_pending = false;

        let tick = prev.tick() + 1;
        let next = step(&prev, tick, &self.profile, &mut self.rng);
        let observation = reasoner.observe(&prev, &next, &self.profile, mem::take(&mut self.memory));

        debug!(
            station = %self.id,
            tick,
            irradiance = next.solar_irradiance_wm2(),
            membrane = next.membrane_integrity_pct(),
            alerts = observation.alerts.len(),
            "tick"
        );

        self.memory = observation.memory;
        push_bounded(&mut self.history, next, retention.history);
        push_bounded(&mut self.narration, observation.narration, retention.history);

        self.alert_total += observation.alerts.len();
        for alert in &observation.alerts {
            push_bounded(&mut self.alerts, alert.clone(), retention.alerts);
        }
        observation.alerts
    }
}

/// Per-station buffer sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Snapshots and narration lines
    pub history: usize,
    pub alerts: usize,
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, capacity: usize) {
    buffer.push_back(item);
    while buffer.len() > capacity.max(1) {
        buffer.pop_front();
    }
}
