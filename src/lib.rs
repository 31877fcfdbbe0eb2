//! # HYDRA Station Twin
//!
//! Deterministic digital twin of off-grid, solar-driven water purification
//! stations. Each registered station advances in discrete ticks from its own
//! seeded random stream; every transition is inspected by a rule-based
//! reasoner and scored by pure analytics.
//!
//! - [`simulation`]: per-tick stochastic model of every telemetry channel
//! - [`reasoner`]: thresholds, debounce, sensor-fault suspicion, narration
//! - [`analytics`]: WQI, compliance, efficiency, maintenance forecast
//! - [`registry`]: station ownership, history retention, comparison
//! - [`export`]: CSV history and JSON alert log

pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod reasoner;
pub mod registry;
pub mod simulation;
pub mod telemetry;
pub mod text;

pub use error::{Result, TwinError};
