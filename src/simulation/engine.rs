//! # Station Engine
//!
//! Pure per-tick state transition. Given the previous snapshot, the target
//! tick, the climate profile and the station's random stream, [`step`]
//! produces the next snapshot. The stream is the only source of randomness
//! and is consumed in a fixed order, so equal inputs replay bit-identically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use super::solar::{clear_sky_irradiance, next_sky};
use crate::analytics::efficiency::energy_efficiency;
use crate::domain::{Channel, Chemistry, ClimateProfile, StationState};

/// Per-station deterministic random stream
pub type SeededStream = ChaCha8Rng;

/// Create the stream for a station seed
pub fn seeded_stream(seed: u64) -> SeededStream {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Desalination yield per W/m² of irradiance through an intact membrane (L/hr)
pub const DESALINATION_YIELD_LHR_PER_WM2: f64 = 0.008;

/// Slow-varying baseline and dynamics of a mean-reverting chemistry channel
struct Reversion {
    baseline: f64,
    swing: f64,
    swing_period_ticks: f64,
    rate: f64,
    sigma: f64,
}

impl Reversion {
    fn target(&self, tick: u64) -> f64 {
        self.baseline + self.swing * (2.0 * PI * tick as f64 / self.swing_period_ticks).sin()
    }

    fn next(&self, previous: f64, tick: u64, amplitude: f64, z: f64) -> f64 {
        previous + self.rate * (self.target(tick) - previous) + self.sigma * amplitude * z
    }
}

const PH: Reversion = Reversion {
    baseline: 7.2,
    swing: 0.4,
    swing_period_ticks: 80.0,
    rate: 0.15,
    sigma: 0.05,
};

const TURBIDITY: Reversion = Reversion {
    baseline: 0.7,
    swing: 0.5,
    swing_period_ticks: 150.0,
    rate: 0.1,
    sigma: 0.08,
};

const HEAVY_METAL: Reversion = Reversion {
    baseline: 0.005,
    swing: 0.004,
    swing_period_ticks: 200.0,
    rate: 0.1,
    sigma: 0.0008,
};

const IRRADIANCE_SIGMA_WM2: f64 = 15.0;
const BIOFOULING_SIGMA_PCT: f64 = 0.8;
const MEMBRANE_WEAR_SIGMA_PCT: f64 = 0.01;

/// Biofilm growth rate toward its membrane-driven target
const BIOFOULING_GROWTH_RATE: f64 = 0.1;
/// Growth rate while quorum quenching suppresses biofilm signalling
const BIOFOULING_QUENCHED_RATE: f64 = 0.05;

/// Raw ranges a failed sensor reports from, before clamping. Each fault draws
/// a fresh value, so a dead sensor never holds a steady level.
const FAULT_PH_HIGH: (f64, f64) = (12.5, 20.0);
const FAULT_PH_LOW: (f64, f64) = (-6.0, 1.5);
const FAULT_TURBIDITY_NTU: (f64, f64) = (100.0, 2500.0);
const FAULT_HEAVY_METAL_PPM: (f64, f64) = (1.0, 50.0);

fn fault_reading(rng: &mut SeededStream, (lo, hi): (f64, f64)) -> f64 {
    rng.gen_range(lo..hi)
}

/// Commissioning snapshot at tick 0
pub fn initial_state(station_id: &str, profile: &ClimateProfile) -> StationState {
    let membrane = profile.membrane_baseline_pct();
    let irradiance = clear_sky_irradiance(profile, 0);
    let desalination = desalination_rate(irradiance, membrane);

    StationState::builder(station_id, 0)
        .solar_irradiance_wm2(irradiance)
        .ph(PH.target(0))
        .turbidity_ntu(TURBIDITY.target(0))
        .heavy_metal_ppm(HEAVY_METAL.target(0))
        .biofouling_pct(biofouling_target(membrane))
        .membrane_integrity_pct(membrane)
        .desalination_rate_lhr(desalination)
        .energy_efficiency_lkwh(energy_efficiency(desalination, irradiance).unwrap_or(0.0))
        .build()
}

/// Advance `prev` to `tick`.
///
/// Never fails: every channel is clamped into its physical range, which
/// also repairs a `prev` that somehow violated its bounds.
pub fn step(
    prev: &StationState,
    tick: u64,
    profile: &ClimateProfile,
    rng: &mut SeededStream,
) -> StationState {
    let amplitude = profile.noise_amplitude();

    // Fixed draw order: sky, irradiance, chemistry, biofilm, membrane, sensors.
    let sky = next_sky(prev.sky(), rng);
    let z_irradiance = gaussian(rng);
    let z_ph = gaussian(rng);
    let z_turbidity = gaussian(rng);
    let z_metal = gaussian(rng);
    let z_biofouling = gaussian(rng);
    let z_membrane = gaussian(rng);

    // Solar
    let clear_sky = clear_sky_irradiance(profile, tick) * sky.cover.transmission_factor();
    let irradiance = if clear_sky <= 0.0 {
        0.0
    } else {
        Channel::SolarIrradiance.clamp_reading(clear_sky + IRRADIANCE_SIGMA_WM2 * amplitude * z_irradiance)
    };

    // Latent chemistry evolves from the previous latent values, not readings
    let latent = prev.chemistry();
    let chemistry = Chemistry {
        ph: Channel::Ph.clamp_reading(PH.next(latent.ph, tick, amplitude, z_ph)),
        turbidity_ntu: Channel::Turbidity.clamp_reading(TURBIDITY.next(
            latent.turbidity_ntu,
            tick,
            amplitude,
            z_turbidity,
        )),
        heavy_metal_ppm: Channel::HeavyMetal.clamp_reading(HEAVY_METAL.next(
            latent.heavy_metal_ppm,
            tick,
            amplitude,
            z_metal,
        )),
    };

    // Membrane wear accelerates with biofilm load and never reverses on its own
    let prev_membrane = Channel::MembraneIntegrity.clamp_reading(prev.membrane_integrity_pct());
    let wear = profile.membrane_decay_rate() * (1.0 + prev.biofouling_pct() / 100.0)
        + (MEMBRANE_WEAR_SIGMA_PCT * amplitude * z_membrane).abs();
    let membrane = Channel::MembraneIntegrity
        .clamp_reading(prev_membrane - wear)
        .min(prev_membrane);

    let growth = if prev.quorum_quenching_active() {
        BIOFOULING_QUENCHED_RATE
    } else {
        BIOFOULING_GROWTH_RATE
    };
    let biofouling = prev.biofouling_pct()
        + growth * (biofouling_target(membrane) - prev.biofouling_pct())
        + BIOFOULING_SIGMA_PCT * amplitude * z_biofouling;

    // Sensor faults corrupt readings only
    let fault_p = profile.sensor_fault_probability();
    let ph = if rng.gen::<f64>() < fault_p {
        let range = if rng.gen_bool(0.5) {
            FAULT_PH_HIGH
        } else {
            FAULT_PH_LOW
        };
        fault_reading(rng, range)
    } else {
        chemistry.ph
    };
    let turbidity = if rng.gen::<f64>() < fault_p {
        fault_reading(rng, FAULT_TURBIDITY_NTU)
    } else {
        chemistry.turbidity_ntu
    };
    let heavy_metal = if rng.gen::<f64>() < fault_p {
        fault_reading(rng, FAULT_HEAVY_METAL_PPM)
    } else {
        chemistry.heavy_metal_ppm
    };

    let desalination = desalination_rate(irradiance, membrane);

    StationState::builder(prev.station_id(), tick)
        .solar_irradiance_wm2(irradiance)
        .ph(ph)
        .turbidity_ntu(turbidity)
        .heavy_metal_ppm(heavy_metal)
        .biofouling_pct(biofouling)
        .membrane_integrity_pct(membrane)
        .desalination_rate_lhr(desalination)
        .energy_efficiency_lkwh(energy_efficiency(desalination, irradiance).unwrap_or(0.0))
        .chemistry(chemistry)
        .sky(sky)
        .build()
}

/// Desalination output (L/hr) for a given irradiance and membrane integrity
pub fn desalination_rate(irradiance_wm2: f64, membrane_integrity_pct: f64) -> f64 {
    Channel::DesalinationRate.clamp_reading(
        irradiance_wm2 * DESALINATION_YIELD_LHR_PER_WM2 * (membrane_integrity_pct / 100.0),
    )
}

/// Equilibrium biofilm coverage for a membrane condition
fn biofouling_target(membrane_integrity_pct: f64) -> f64 {
    (100.0 - membrane_integrity_pct) * 1.1
}

fn gaussian(rng: &mut SeededStream) -> f64 {
    rng.sample(StandardNormal)
}
