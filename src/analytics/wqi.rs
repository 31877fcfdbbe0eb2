//! Water Quality Index
//!
//! Each water-chemistry reading maps to a 0-100 sub-score through a linear
//! penalty; a weighted sum gives the composite, which is banded into a
//! letter grade. All penalties are non-increasing in "badness", so a worse
//! reading can never raise the score.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::domain::StationState;
use crate::error::{Result, TwinError};

/// Half-width of the pH band that incurs no penalty, centred on 7.5
const PH_FREE_HALF_WIDTH: f64 = 1.0;
/// Points lost per pH unit outside the free band
const PH_PENALTY_PER_UNIT: f64 = 15.0;
/// Points lost per NTU (zero at 10 NTU)
const TURBIDITY_PENALTY_PER_NTU: f64 = 10.0;
/// Points lost per PPM (zero at 0.05 PPM)
const HEAVY_METAL_PENALTY_PER_PPM: f64 = 2000.0;

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

/// Minimum score for each grade; anything below `d` is an F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeCutoffs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeCutoffs {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 80.0,
            c: 70.0,
            d: 60.0,
        }
    }
}

/// Weighting and grading policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WqiPolicy {
    pub ph_weight: f64,
    pub turbidity_weight: f64,
    pub heavy_metal_weight: f64,
    pub cutoffs: GradeCutoffs,
}

impl Default for WqiPolicy {
    fn default() -> Self {
        Self {
            ph_weight: 0.35,
            turbidity_weight: 0.35,
            heavy_metal_weight: 0.30,
            cutoffs: GradeCutoffs::default(),
        }
    }
}

impl WqiPolicy {
    /// Weights must be non-negative and sum to 1; cutoffs must lie in
    /// [0, 100] and strictly descend from A to D.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.ph_weight, self.turbidity_weight, self.heavy_metal_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(TwinError::InvalidPolicy(format!(
                "WQI weights must be finite and non-negative: {:?}",
                weights
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(TwinError::InvalidPolicy(format!(
                "WQI weights sum to {} instead of 1",
                total
            )));
        }

        let c = self.cutoffs;
        let ordered = [c.a, c.b, c.c, c.d];
        if ordered.iter().any(|v| !(0.0..=100.0).contains(v))
            || ordered.windows(2).any(|pair| pair[0] <= pair[1])
        {
            return Err(TwinError::InvalidPolicy(format!(
                "grade cutoffs must strictly descend within [0, 100]: {:?}",
                ordered
            )));
        }

        Ok(())
    }

    pub fn grade(&self, score: f64) -> Grade {
        let c = self.cutoffs;
        if score >= c.a {
            Grade::A
        } else if score >= c.b {
            Grade::B
        } else if score >= c.c {
            Grade::C
        } else if score >= c.d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Composite score with its components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WqiScore {
    pub score: f64,
    pub grade: Grade,
    pub ph_subscore: f64,
    pub turbidity_subscore: f64,
    pub heavy_metal_subscore: f64,
}

/// 100 inside pH [6.5, 8.5], falling linearly outside it.
pub fn ph_subscore(ph: f64) -> f64 {
    let deviation = ((ph - 7.5).abs() - PH_FREE_HALF_WIDTH).max(0.0);
    (100.0 - deviation * PH_PENALTY_PER_UNIT).clamp(0.0, 100.0)
}

/// 100 at 0 NTU, 0 at 10 NTU and beyond.
pub fn turbidity_subscore(turbidity_ntu: f64) -> f64 {
    (100.0 - turbidity_ntu.max(0.0) * TURBIDITY_PENALTY_PER_NTU).clamp(0.0, 100.0)
}

/// 100 at 0 PPM, 0 at 0.05 PPM and beyond.
pub fn heavy_metal_subscore(heavy_metal_ppm: f64) -> f64 {
    (100.0 - heavy_metal_ppm.max(0.0) * HEAVY_METAL_PENALTY_PER_PPM).clamp(0.0, 100.0)
}

/// WQI from raw readings
pub fn wqi_from_readings(
    ph: f64,
    turbidity_ntu: f64,
    heavy_metal_ppm: f64,
    policy: &WqiPolicy,
) -> WqiScore {
    let ph_subscore = ph_subscore(ph);
    let turbidity_subscore = turbidity_subscore(turbidity_ntu);
    let heavy_metal_subscore = heavy_metal_subscore(heavy_metal_ppm);

    let score = (ph_subscore * policy.ph_weight
        + turbidity_subscore * policy.turbidity_weight
        + heavy_metal_subscore * policy.heavy_metal_weight)
        .clamp(0.0, 100.0);

    WqiScore {
        score,
        grade: policy.grade(score),
        ph_subscore,
        turbidity_subscore,
        heavy_metal_subscore,
    }
}

/// WQI of a snapshot's readings
pub fn compute_wqi(state: &StationState, policy: &WqiPolicy) -> WqiScore {
    debug_assert!(state.within_bounds(), "out-of-bound state reached analytics");
    wqi_from_readings(
        state.ph(),
        state.turbidity_ntu(),
        state.heavy_metal_ppm(),
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_water_scores_100() {
        let wqi = wqi_from_readings(7.5, 0.0, 0.0, &WqiPolicy::default());
        assert!((wqi.score - 100.0).abs() < 1e-9);
        assert_eq!(wqi.grade, Grade::A);
    }

    #[test]
    fn test_subscores() {
        assert_eq!(ph_subscore(6.5), 100.0);
        assert_eq!(ph_subscore(8.5), 100.0);
        assert!((ph_subscore(9.5) - 85.0).abs() < 1e-9);
        assert_eq!(ph_subscore(0.0), 2.5);
        assert!((turbidity_subscore(1.0) - 90.0).abs() < 1e-9);
        assert_eq!(turbidity_subscore(25.0), 0.0);
        assert!((heavy_metal_subscore(0.01) - 80.0).abs() < 1e-9);
        assert_eq!(heavy_metal_subscore(1.0), 0.0);
    }

    #[test]
    fn test_grade_banding() {
        let policy = WqiPolicy::default();
        assert_eq!(policy.grade(90.0), Grade::A);
        assert_eq!(policy.grade(89.99), Grade::B);
        assert_eq!(policy.grade(80.0), Grade::B);
        assert_eq!(policy.grade(70.0), Grade::C);
        assert_eq!(policy.grade(60.0), Grade::D);
        assert_eq!(policy.grade(59.9), Grade::F);
    }

    #[test]
    fn test_custom_policy() {
        let policy = WqiPolicy {
            ph_weight: 0.0,
            turbidity_weight: 0.0,
            heavy_metal_weight: 1.0,
            cutoffs: GradeCutoffs {
                a: 95.0,
                b: 85.0,
                c: 50.0,
                d: 10.0,
            },
        };
        policy.validate().unwrap();
        let wqi = wqi_from_readings(2.0, 50.0, 0.001, &policy);
        assert!((wqi.score - 98.0).abs() < 1e-9);
        assert_eq!(wqi.grade, Grade::A);
    }

    #[test]
    fn test_policy_validation() {
        assert!(WqiPolicy::default().validate().is_ok());

        let bad_weights = WqiPolicy {
            ph_weight: 0.5,
            ..WqiPolicy::default()
        };
        assert!(bad_weights.validate().is_err());

        let bad_cutoffs = WqiPolicy {
            cutoffs: GradeCutoffs {
                a: 80.0,
                b: 80.0,
                c: 70.0,
                d: 60.0,
            },
            ..WqiPolicy::default()
        };
        assert!(bad_cutoffs.validate().is_err());
    }
}
