//! # Solar Irradiance Model
//!
//! Diurnal cosine irradiance scaled by the climate profile, attenuated by a
//! persistent cloud regime drawn from the station's random stream.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::domain::{ClimateProfile, SkyState};

/// Cloud cover level affecting solar irradiance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudCover {
    /// Clear sky (0-10% clouds)
    Clear,
    /// Partly cloudy (10-50% clouds)
    PartlyCloudy,
    /// Mostly cloudy (50-90% clouds)
    MostlyCloudy,
    /// Overcast (90-100% clouds)
    Overcast,
}

impl CloudCover {
    /// Get the radiation transmission factor (0.0 = blocked, 1.0 = full)
    pub fn transmission_factor(&self) -> f64 {
        match self {
            CloudCover::Clear => 1.0,
            CloudCover::PartlyCloudy => 0.7,
            CloudCover::MostlyCloudy => 0.4,
            CloudCover::Overcast => 0.15,
        }
    }

    /// Get a random cloud cover (weighted towards clear/partly cloudy)
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let roll = rng.gen_range(0..100);
        match roll {
            0..=40 => CloudCover::Clear,
            41..=70 => CloudCover::PartlyCloudy,
            71..=85 => CloudCover::MostlyCloudy,
            _ => CloudCover::Overcast,
        }
    }
}

/// Shortest and longest cloud regime, in ticks
const CLOUD_PERSISTENCE_TICKS: (u32, u32) = (10, 45);

/// Advance the cloud regime by one tick.
///
/// Draws a new regime (and its duration) only when the current one expires,
/// so a station's stream is consumed identically on every replay.
pub fn next_sky<R: Rng>(previous: &SkyState, rng: &mut R) -> SkyState {
    if previous.ticks_remaining > 1 {
        return SkyState {
            cover: previous.cover,
            ticks_remaining: previous.ticks_remaining - 1,
        };
    }

    let cover = CloudCover::random(rng);
    let (lo, hi) = CLOUD_PERSISTENCE_TICKS;
    SkyState {
        cover,
        ticks_remaining: rng.gen_range(lo..=hi),
    }
}

/// Clear-sky irradiance in W/m² at `tick`.
///
/// Cosine of the tick-within-day phase, peaking at the profile's peak
/// irradiance at local noon (`period / 2`) and clamped to zero through the
/// night half of the cycle.
pub fn clear_sky_irradiance(profile: &ClimateProfile, tick: u64) -> f64 {
    let period = profile.diurnal_period() as f64;
    let phase = profile.tick_of_day(tick) as f64 / period;
    let elevation = (2.0 * PI * (phase - 0.5)).cos();

    // Sun below horizon = no radiation
    if elevation <= 0.0 {
        return 0.0;
    }

    profile.peak_irradiance_wm2() * elevation
}

/// True when the sun is below the horizon at `tick`
pub fn is_night(profile: &ClimateProfile, tick: u64) -> bool {
    clear_sky_irradiance(profile, tick) <= 0.0
}
