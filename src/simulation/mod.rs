//! # Station Simulation Module
//!
//! Stylised stochastic model of an off-grid purification station.
//!
//! ## Components
//!
//! - **Solar**: Diurnal cosine irradiance with persistent cloud regimes
//! - **Engine**: Pure per-tick transition of every telemetry channel, with
//!   climate-scaled noise, drift, mean reversion and sensor faults
//!
//! ## Usage
//!
//! ```rust
//! use hydra_twin::domain::ClimateProfile;
//! use hydra_twin::simulation::{initial_state, seeded_stream, step};
//!
//! let profile = ClimateProfile::from_latitude(18.5883).unwrap();
//! let mut rng = seeded_stream(42);
//!
//! let mut state = initial_state("Doi Inthanon", &profile);
//! for tick in 1..=60 {
//!     state = step(&state, tick, &profile, &mut rng);
//! }
//! assert!(state.within_bounds());
//! ```

pub mod engine;
pub mod solar;

pub use engine::{desalination_rate, initial_state, seeded_stream, step, SeededStream};
pub use solar::{clear_sky_irradiance, is_night, CloudCover};
