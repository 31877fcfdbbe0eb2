//! WHO-style drinking water compliance.
//!
//! Boundaries: pH is compliant on the closed band [6.5, 8.5]; turbidity and
//! heavy metals must be strictly below their limits.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::domain::{Channel, StationState};

pub const PH_MIN: f64 = 6.5;
pub const PH_MAX: f64 = 8.5;
pub const TURBIDITY_LIMIT_NTU: f64 = 1.0;
pub const HEAVY_METAL_LIMIT_PPM: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ComplianceVerdict {
    /// All checks hold
    Pass,
    /// Some, but not all, checks hold
    Partial,
    /// No check holds
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub parameter: Channel,
    pub value: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub verdict: ComplianceVerdict,
    pub checks: Vec<ComplianceCheck>,
}

impl ComplianceReport {
    pub fn failed(&self) -> impl Iterator<Item = &ComplianceCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

pub fn ph_compliant(ph: f64) -> bool {
    (PH_MIN..=PH_MAX).contains(&ph)
}

pub fn turbidity_compliant(turbidity_ntu: f64) -> bool {
    turbidity_ntu < TURBIDITY_LIMIT_NTU
}

pub fn heavy_metal_compliant(heavy_metal_ppm: f64) -> bool {
    heavy_metal_ppm < HEAVY_METAL_LIMIT_PPM
}

/// Run the three checks against raw readings
pub fn check_readings(ph: f64, turbidity_ntu: f64, heavy_metal_ppm: f64) -> ComplianceReport {
    let checks = vec![
        ComplianceCheck {
            parameter: Channel::Ph,
            value: ph,
            passed: ph_compliant(ph),
        },
        ComplianceCheck {
            parameter: Channel::Turbidity,
            value: turbidity_ntu,
            passed: turbidity_compliant(turbidity_ntu),
        },
        ComplianceCheck {
            parameter: Channel::HeavyMetal,
            value: heavy_metal_ppm,
            passed: heavy_metal_compliant(heavy_metal_ppm),
        },
    ];

    let passed = checks.iter().filter(|c| c.passed).count();
    let verdict = if passed == checks.len() {
        ComplianceVerdict::Pass
    } else if passed == 0 {
        ComplianceVerdict::Fail
    } else {
        ComplianceVerdict::Partial
    };

    ComplianceReport { verdict, checks }
}

/// Compliance of a snapshot's readings
pub fn check_compliance(state: &StationState) -> ComplianceReport {
    debug_assert!(state.within_bounds(), "out-of-bound state reached analytics");
    check_readings(state.ph(), state.turbidity_ntu(), state.heavy_metal_ppm())
}
