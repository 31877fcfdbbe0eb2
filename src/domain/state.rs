//! # Station State
//!
//! Immutable per-tick telemetry snapshot. The only way to construct one is
//! through [`StationStateBuilder::build`], which clamps every channel into its
//! physical range, so an out-of-bound value can never reach analytics.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::simulation::solar::CloudCover;

/// Station identifier as registered with the registry
pub type StationId = String;

/// Telemetry channel carried by every [`StationState`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Channel {
    #[strum(serialize = "solar_irradiance_wm2")]
    SolarIrradiance,
    #[strum(serialize = "ph")]
    Ph,
    #[strum(serialize = "turbidity_ntu")]
    Turbidity,
    #[strum(serialize = "biofouling_pct")]
    Biofouling,
    #[strum(serialize = "heavy_metal_ppm")]
    HeavyMetal,
    #[strum(serialize = "membrane_integrity_pct")]
    MembraneIntegrity,
    #[strum(serialize = "desalination_rate_lhr")]
    DesalinationRate,
    #[strum(serialize = "energy_efficiency_lkwh")]
    EnergyEfficiency,
}

impl Channel {
    /// Inclusive physical range `(min, max)`.
    ///
    /// Turbidity and heavy metal are capped at their sensor saturation
    /// points; desalination and efficiency are open-ended.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Channel::SolarIrradiance => (0.0, 1400.0),
            Channel::Ph => (0.0, 14.0),
            Channel::Turbidity => (0.0, 1000.0),
            Channel::Biofouling => (0.0, 100.0),
            Channel::HeavyMetal => (0.0, 10.0),
            Channel::MembraneIntegrity => (0.0, 100.0),
            Channel::DesalinationRate => (0.0, f64::INFINITY),
            Channel::EnergyEfficiency => (0.0, f64::INFINITY),
        }
    }

    /// Value substituted for a NaN reading
    pub fn nominal(&self) -> f64 {
        match self {
            Channel::SolarIrradiance => 0.0,
            Channel::Ph => 7.2,
            Channel::Turbidity => 0.8,
            Channel::Biofouling => 15.0,
            Channel::HeavyMetal => 0.005,
            Channel::MembraneIntegrity => 85.0,
            Channel::DesalinationRate => 0.0,
            Channel::EnergyEfficiency => 0.0,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::SolarIrradiance => "W/m²",
            Channel::Ph => "",
            Channel::Turbidity => "NTU",
            Channel::Biofouling | Channel::MembraneIntegrity => "%",
            Channel::HeavyMetal => "PPM",
            Channel::DesalinationRate => "L/hr",
            Channel::EnergyEfficiency => "L/kWh",
        }
    }

    /// Clamp a raw value into this channel's range.
    pub fn clamp_reading(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.nominal();
        }
        let (lo, hi) = self.bounds();
        raw.clamp(lo, hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        value >= lo && value <= hi
    }
}

/// Latent water chemistry: what the sensors would read if they were healthy.
///
/// Drift and mean reversion act on these values; a faulted sensor only
/// corrupts the reading, so the spike disappears on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chemistry {
    pub ph: f64,
    pub turbidity_ntu: f64,
    pub heavy_metal_ppm: f64,
}

impl Chemistry {
    fn clamped(self) -> Self {
        Self {
            ph: Channel::Ph.clamp_reading(self.ph),
            turbidity_ntu: Channel::Turbidity.clamp_reading(self.turbidity_ntu),
            heavy_metal_ppm: Channel::HeavyMetal.clamp_reading(self.heavy_metal_ppm),
        }
    }
}

impl Default for Chemistry {
    fn default() -> Self {
        Self {
            ph: Channel::Ph.nominal(),
            turbidity_ntu: Channel::Turbidity.nominal(),
            heavy_metal_ppm: Channel::HeavyMetal.nominal(),
        }
    }
}

/// Persisting cloud regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyState {
    pub cover: CloudCover,
    /// Ticks before a new regime is drawn
    pub ticks_remaining: u32,
}

impl Default for SkyState {
    fn default() -> Self {
        Self {
            cover: CloudCover::Clear,
            ticks_remaining: 0,
        }
    }
}

/// Snapshot of every subsystem at one tick.
///
/// Deserialized snapshots pass through [`StationStateBuilder::build`] too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StationStateBuilder")]
pub struct StationState {
    station_id: StationId,
    tick: u64,
    solar_irradiance_wm2: f64,
    ph: f64,
    turbidity_ntu: f64,
    biofouling_pct: f64,
    heavy_metal_ppm: f64,
    membrane_integrity_pct: f64,
    desalination_rate_lhr: f64,
    energy_efficiency_lkwh: f64,
    quorum_quenching_active: bool,
    chemistry: Chemistry,
    sky: SkyState,
}

/// Biofouling level above which quorum quenching engages
pub const QUORUM_QUENCHING_THRESHOLD_PCT: f64 = 20.0;

impl StationState {
    /// Start building a snapshot for `station_id` at `tick`
    pub fn builder(station_id: impl Into<StationId>, tick: u64) -> StationStateBuilder {
        StationStateBuilder::new(station_id.into(), tick)
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn solar_irradiance_wm2(&self) -> f64 {
        self.solar_irradiance_wm2
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    pub fn turbidity_ntu(&self) -> f64 {
        self.turbidity_ntu
    }

    pub fn biofouling_pct(&self) -> f64 {
        self.biofouling_pct
    }

    pub fn heavy_metal_ppm(&self) -> f64 {
        self.heavy_metal_ppm
    }

    pub fn membrane_integrity_pct(&self) -> f64 {
        self.membrane_integrity_pct
    }

    pub fn desalination_rate_lhr(&self) -> f64 {
        self.desalination_rate_lhr
    }

    pub fn energy_efficiency_lkwh(&self) -> f64 {
        self.energy_efficiency_lkwh
    }

    pub fn quorum_quenching_active(&self) -> bool {
        self.quorum_quenching_active
    }

    pub fn chemistry(&self) -> &Chemistry {
        &self.chemistry
    }

    pub fn sky(&self) -> &SkyState {
        &self.sky
    }

    /// Reading for a channel
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::SolarIrradiance => self.solar_irradiance_wm2,
            Channel::Ph => self.ph,
            Channel::Turbidity => self.turbidity_ntu,
            Channel::Biofouling => self.biofouling_pct,
            Channel::HeavyMetal => self.heavy_metal_ppm,
            Channel::MembraneIntegrity => self.membrane_integrity_pct,
            Channel::DesalinationRate => self.desalination_rate_lhr,
            Channel::EnergyEfficiency => self.energy_efficiency_lkwh,
        }
    }

    /// True when every channel lies inside its physical range.
    pub fn within_bounds(&self) -> bool {
        Channel::iter().all(|c| c.contains(self.value(c)))
            && Channel::Ph.contains(self.chemistry.ph)
            && Channel::Turbidity.contains(self.chemistry.turbidity_ntu)
            && Channel::HeavyMetal.contains(self.chemistry.heavy_metal_ppm)
    }

    /// Copy of this snapshot with a fresh membrane installed.
    ///
    /// Integrity returns to 100% and biofouling to a clean-membrane level;
    /// everything else, including the tick, is unchanged.
    pub fn serviced(&self) -> StationState {
        StationStateBuilder::from_state(self)
            .membrane_integrity_pct(100.0)
            .biofouling_pct(5.0)
            .build()
    }
}

/// Validated factory for [`StationState`]
#[derive(Debug, Clone, Deserialize)]
pub struct StationStateBuilder {
    station_id: StationId,
    tick: u64,
    solar_irradiance_wm2: f64,
    ph: f64,
    turbidity_ntu: f64,
    biofouling_pct: f64,
    heavy_metal_ppm: f64,
    membrane_integrity_pct: f64,
    desalination_rate_lhr: f64,
    energy_efficiency_lkwh: f64,
    #[serde(default)]
    chemistry: Option<Chemistry>,
    #[serde(default)]
    sky: SkyState,
}

impl From<StationStateBuilder> for StationState {
    fn from(builder: StationStateBuilder) -> Self {
        builder.build()
    }
}

impl StationStateBuilder {
    fn new(station_id: StationId, tick: u64) -> Self {
        Self {
            station_id,
            tick,
            solar_irradiance_wm2: Channel::SolarIrradiance.nominal(),
            ph: Channel::Ph.nominal(),
            turbidity_ntu: Channel::Turbidity.nominal(),
            biofouling_pct: Channel::Biofouling.nominal(),
            heavy_metal_ppm: Channel::HeavyMetal.nominal(),
            membrane_integrity_pct: Channel::MembraneIntegrity.nominal(),
            desalination_rate_lhr: Channel::DesalinationRate.nominal(),
            energy_efficiency_lkwh: Channel::EnergyEfficiency.nominal(),
            chemistry: None,
            sky: SkyState::default(),
        }
    }

    /// Builder pre-filled with every value of an existing snapshot
    pub fn from_state(state: &StationState) -> Self {
        Self {
            station_id: state.station_id.clone(),
            tick: state.tick,
            solar_irradiance_wm2: state.solar_irradiance_wm2,
            ph: state.ph,
            turbidity_ntu: state.turbidity_ntu,
            biofouling_pct: state.biofouling_pct,
            heavy_metal_ppm: state.heavy_metal_ppm,
            membrane_integrity_pct: state.membrane_integrity_pct,
            desalination_rate_lhr: state.desalination_rate_lhr,
            energy_efficiency_lkwh: state.energy_efficiency_lkwh,
            chemistry: Some(state.chemistry),
            sky: state.sky,
        }
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn solar_irradiance_wm2(mut self, value: f64) -> Self {
        self.solar_irradiance_wm2 = value;
        self
    }

    pub fn ph(mut self, value: f64) -> Self {
        self.ph = value;
        self
    }

    pub fn turbidity_ntu(mut self, value: f64) -> Self {
        self.turbidity_ntu = value;
        self
    }

    pub fn biofouling_pct(mut self, value: f64) -> Self {
        self.biofouling_pct = value;
        self
    }

    pub fn heavy_metal_ppm(mut self, value: f64) -> Self {
        self.heavy_metal_ppm = value;
        self
    }

    pub fn membrane_integrity_pct(mut self, value: f64) -> Self {
        self.membrane_integrity_pct = value;
        self
    }

    pub fn desalination_rate_lhr(mut self, value: f64) -> Self {
        self.desalination_rate_lhr = value;
        self
    }

    pub fn energy_efficiency_lkwh(mut self, value: f64) -> Self {
        self.energy_efficiency_lkwh = value;
        self
    }

    /// Latent chemistry. Defaults to the water-quality readings when unset.
    pub fn chemistry(mut self, chemistry: Chemistry) -> Self {
        self.chemistry = Some(chemistry);
        self
    }

    pub fn sky(mut self, sky: SkyState) -> Self {
        self.sky = sky;
        self
    }

    /// Clamp every channel and freeze the snapshot.
    pub fn build(self) -> StationState {
        let ph = Channel::Ph.clamp_reading(self.ph);
        let turbidity_ntu = Channel::Turbidity.clamp_reading(self.turbidity_ntu);
        let heavy_metal_ppm = Channel::HeavyMetal.clamp_reading(self.heavy_metal_ppm);
        let biofouling_pct = Channel::Biofouling.clamp_reading(self.biofouling_pct);

        let chemistry = self
            .chemistry
            .unwrap_or(Chemistry {
                ph,
                turbidity_ntu,
                heavy_metal_ppm,
            })
            .clamped();

        StationState {
            station_id: self.station_id,
            tick: self.tick,
            solar_irradiance_wm2: Channel::SolarIrradiance.clamp_reading(self.solar_irradiance_wm2),
            ph,
            turbidity_ntu,
            biofouling_pct,
            heavy_metal_ppm,
            membrane_integrity_pct: Channel::MembraneIntegrity.clamp_reading(self.membrane_integrity_pct),
            desalination_rate_lhr: Channel::DesalinationRate.clamp_reading(self.desalination_rate_lhr),
            energy_efficiency_lkwh: Channel::EnergyEfficiency.clamp_reading(self.energy_efficiency_lkwh),
            quorum_quenching_active: biofouling_pct > QUORUM_QUENCHING_THRESHOLD_PCT,
            chemistry,
            sky: self.sky,
        }
    }
}
