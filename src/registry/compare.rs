//! Side-by-side comparison of two stations over their retained histories.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::analytics::{summary::mean, AnalyticsEngine};
use crate::domain::{Channel, StationId, StationState};

/// Differences smaller than this count as a tie
const TIE_EPSILON: f64 = 1e-9;

/// Metrics compared between stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Metric {
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
    #[strum(serialize = "wqi")]
    Wqi,
}

/// Which way is better for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
    /// No single direction is better (pH is best near neutral)
    Unranked,
}

impl Metric {
    pub fn direction(&self) -> Direction {
        match self {
            Metric::SolarIrradiance
            | Metric::MembraneIntegrity
            | Metric::DesalinationRate
            | Metric::EnergyEfficiency
            | Metric::Wqi => Direction::HigherIsBetter,
            Metric::Turbidity | Metric::Biofouling | Metric::HeavyMetal => Direction::LowerIsBetter,
            Metric::Ph => Direction::Unranked,
        }
    }

    fn channel(&self) -> Option<Channel> {
        match self {
            Metric::SolarIrradiance => Some(Channel::SolarIrradiance),
            Metric::Ph => Some(Channel::Ph),
            Metric::Turbidity => Some(Channel::Turbidity),
            Metric::Biofouling => Some(Channel::Biofouling),
            Metric::HeavyMetal => Some(Channel::HeavyMetal),
            Metric::MembraneIntegrity => Some(Channel::MembraneIntegrity),
            Metric::DesalinationRate => Some(Channel::DesalinationRate),
            Metric::EnergyEfficiency | Metric::Wqi => None,
        }
    }

    /// History average of this metric. Efficiency only counts daylight ticks.
    fn average(&self, history: &[&StationState], analytics: &AnalyticsEngine) -> Option<f64> {
        match self {
            Metric::Wqi => mean(history.iter().map(|s| analytics.wqi(s).score)),
            Metric::EnergyEfficiency => mean(history.iter().filter_map(|s| analytics.efficiency(s))),
            _ => {
                let channel = self.channel()?;
                mean(history.iter().map(|s| s.value(channel)))
            }
        }
    }
}

/// Outcome for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Winner {
    A,
    B,
    Tie,
    NotRanked,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub a: Option<f64>,
    pub b: Option<f64>,
    /// `a - b`, when both sides have a value
    pub delta: Option<f64>,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationComparison {
    pub station_a: StationId,
    pub station_b: StationId,
    pub metrics: Vec<MetricComparison>,
}

impl StationComparison {
    pub fn metric(&self, metric: Metric) -> Option<&MetricComparison> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    /// Metrics won by each side, `(a, b)`
    pub fn score(&self) -> (usize, usize) {
        self.metrics.iter().fold((0, 0), |(a, b), m| match m.winner {
            Winner::A => (a + 1, b),
            Winner::B => (a, b + 1),
            _ => (a, b),
        })
    }
}

pub(crate) fn compare_histories(
    station_a: &str,
    history_a: &[&StationState],
    station_b: &str,
    history_b: &[&StationState],
    analytics: &AnalyticsEngine,
) -> StationComparison {
    let metrics = Metric::iter()
        .map(|metric| {
            let a = metric.average(history_a, analytics);
            let b = metric.average(history_b, analytics);
            let delta = a.zip(b).map(|(a, b)| a - b);
            MetricComparison {
                metric,
                a,
                b,
                delta,
                winner: winner(metric.direction(), delta),
            }
        })
        .collect();

    StationComparison {
        station_a: station_a.to_string(),
        station_b: station_b.to_string(),
        metrics,
    }
}

fn winner(direction: Direction, delta: Option<f64>) -> Winner {
    let Some(delta) = delta else {
        return Winner::NotRanked;
    };
    match direction {
        Direction::Unranked => Winner::NotRanked,
        _ if delta.abs() < TIE_EPSILON => Winner::Tie,
        Direction::HigherIsBetter if delta > 0.0 => Winner::A,
        Direction::LowerIsBetter if delta < 0.0 => Winner::A,
        _ => Winner::B,
    }
}
