//! # Climate Profiles
//!
//! Static per-zone parameters that shape a station's telemetry: noise
//! amplitude, sensor-fault probability, diurnal period, peak irradiance and
//! membrane degradation. A profile is derived once from the station latitude
//! and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum::{Display, EnumIter};

use crate::error::{Result, TwinError};

/// Latitude-banded climate zone
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum ClimateZone {
    /// |lat| < 23.5°
    Tropical,
    /// 23.5° ≤ |lat| < 35°
    Arid,
    /// 35° ≤ |lat| < 55°
    Temperate,
    /// 55° ≤ |lat| < 66.5°
    Cold,
    /// |lat| ≥ 66.5°
    Polar,
}

impl ClimateZone {
    /// Zone for a latitude in degrees (sign ignored)
    pub fn from_latitude(latitude_deg: f64) -> Self {
        let a = latitude_deg.abs();
        if a < 23.5 {
            ClimateZone::Tropical
        } else if a < 35.0 {
            ClimateZone::Arid
        } else if a < 55.0 {
            ClimateZone::Temperate
        } else if a < 66.5 {
            ClimateZone::Cold
        } else {
            ClimateZone::Polar
        }
    }

    /// Multiplier applied to every channel's base noise sigma
    pub fn noise_amplitude(&self) -> f64 {
        match self {
            ClimateZone::Tropical => 1.0,
            ClimateZone::Arid => 1.3,
            ClimateZone::Temperate => 1.1,
            ClimateZone::Cold => 1.4,
            ClimateZone::Polar => 1.6,
        }
    }

    /// Per-sensor, per-tick fault probability
    pub fn sensor_fault_probability(&self) -> f64 {
        match self {
            ClimateZone::Tropical => 0.04,
            ClimateZone::Arid => 0.03,
            ClimateZone::Temperate => 0.02,
            ClimateZone::Cold => 0.02,
            ClimateZone::Polar => 0.05,
        }
    }

    /// Ticks per simulated day
    pub fn diurnal_period(&self) -> u64 {
        match self {
            ClimateZone::Tropical => 120,
            ClimateZone::Arid => 130,
            ClimateZone::Temperate => 150,
            ClimateZone::Cold => 180,
            ClimateZone::Polar => 240,
        }
    }

    /// Baseline membrane integrity loss in percentage points per tick.
    /// Warm water fouls faster.
    pub fn membrane_decay_rate(&self) -> f64 {
        match self {
            ClimateZone::Tropical => 0.05,
            ClimateZone::Arid => 0.03,
            ClimateZone::Temperate => 0.02,
            ClimateZone::Cold => 0.015,
            ClimateZone::Polar => 0.01,
        }
    }
}

/// Immutable climate parameter set for one station.
///
/// Deserialization goes through the same checks as [`ClimateProfile::custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileFields")]
pub struct ClimateProfile {
    zone: ClimateZone,
    noise_amplitude: f64,
    sensor_fault_probability: f64,
    diurnal_period: u64,
    peak_irradiance_wm2: f64,
    membrane_decay_rate: f64,
    membrane_baseline_pct: f64,
}

impl ClimateProfile {
    /// Derive the profile for a latitude.
    ///
    /// Peak irradiance and membrane baseline follow cosine laws of |lat|, so
    /// both are monotonic within and across zone bands.
    pub fn from_latitude(latitude_deg: f64) -> Result<Self> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(TwinError::InvalidLatitude(latitude_deg));
        }

        let zone = ClimateZone::from_latitude(latitude_deg);
        let cos_lat = (latitude_deg.abs() * PI / 180.0).cos();

        Ok(Self {
            zone,
            noise_amplitude: zone.noise_amplitude(),
            sensor_fault_probability: zone.sensor_fault_probability(),
            diurnal_period: zone.diurnal_period(),
            peak_irradiance_wm2: 500.0 + 800.0 * cos_lat,
            membrane_decay_rate: zone.membrane_decay_rate(),
            membrane_baseline_pct: 80.0 + 10.0 * (1.0 - 0.3 * cos_lat),
        })
    }

    /// Build a profile from explicit parameters.
    ///
    /// Used for what-if runs and adversarial testing. Rates and
    /// probabilities must lie in [0, 1], amplitudes must be finite and
    /// non-negative, the diurnal period must be at least 2 ticks.
    pub fn custom(
        zone: ClimateZone,
        noise_amplitude: f64,
        sensor_fault_probability: f64,
        diurnal_period: u64,
        peak_irradiance_wm2: f64,
        membrane_decay_rate: f64,
    ) -> Result<Self> {
        if !noise_amplitude.is_finite() || noise_amplitude < 0.0 {
            return Err(TwinError::InvalidProfile(format!(
                "noise amplitude {} must be finite and >= 0",
                noise_amplitude
            )));
        }
        if !(0.0..=1.0).contains(&sensor_fault_probability) {
            return Err(TwinError::InvalidProfile(format!(
                "sensor fault probability {} outside [0, 1]",
                sensor_fault_probability
            )));
        }
        if !(0.0..=1.0).contains(&membrane_decay_rate) {
            return Err(TwinError::InvalidProfile(format!(
                "membrane decay rate {} outside [0, 1]",
                membrane_decay_rate
            )));
        }
        if diurnal_period < 2 {
            return Err(TwinError::InvalidProfile(format!(
                "diurnal period {} must be at least 2 ticks",
                diurnal_period
            )));
        }
        if !peak_irradiance_wm2.is_finite() || peak_irradiance_wm2 < 0.0 {
            return Err(TwinError::InvalidProfile(format!(
                "peak irradiance {} must be finite and >= 0",
                peak_irradiance_wm2
            )));
        }

        Ok(Self {
            zone,
            noise_amplitude,
            sensor_fault_probability,
            diurnal_period,
            peak_irradiance_wm2,
            membrane_decay_rate,
            membrane_baseline_pct: 85.0,
        })
    }

    pub fn zone(&self) -> ClimateZone {
        self.zone
    }

    pub fn noise_amplitude(&self) -> f64 {
        self.noise_amplitude
    }

    pub fn sensor_fault_probability(&self) -> f64 {
        self.sensor_fault_probability
    }

    pub fn diurnal_period(&self) -> u64 {
        self.diurnal_period
    }

    pub fn peak_irradiance_wm2(&self) -> f64 {
        self.peak_irradiance_wm2
    }

    pub fn membrane_decay_rate(&self) -> f64 {
        self.membrane_decay_rate
    }

    /// Membrane integrity of a freshly commissioned station
    pub fn membrane_baseline_pct(&self) -> f64 {
        self.membrane_baseline_pct
    }

    /// Tick index within the current simulated day, with 0 = local midnight
    pub fn tick_of_day(&self, tick: u64) -> u64 {
        tick % self.diurnal_period
    }

    /// Tick offset of local solar noon within a day
    pub fn noon_tick(&self) -> u64 {
        self.diurnal_period / 2
    }
}

/// Unchecked wire form of a [`ClimateProfile`]
#[derive(Deserialize)]
struct ProfileFields {
    zone: ClimateZone,
    noise_amplitude: f64,
    sensor_fault_probability: f64,
    diurnal_period: u64,
    peak_irradiance_wm2: f64,
    membrane_decay_rate: f64,
    membrane_baseline_pct: f64,
}

impl TryFrom<ProfileFields> for ClimateProfile {
    type Error = TwinError;

    fn try_from(fields: ProfileFields) -> Result<Self> {
        if !(0.0..=100.0).contains(&fields.membrane_baseline_pct) {
            return Err(TwinError::InvalidProfile(format!(
                "membrane baseline {} outside [0, 100]",
                fields.membrane_baseline_pct
            )));
        }
        let profile = ClimateProfile::custom(
            fields.zone,
            fields.noise_amplitude,
            fields.sensor_fault_probability,
            fields.diurnal_period,
            fields.peak_irradiance_wm2,
            fields.membrane_decay_rate,
        )?;
        Ok(Self {
            membrane_baseline_pct: fields.membrane_baseline_pct,
            ..profile
        })
    }
}
