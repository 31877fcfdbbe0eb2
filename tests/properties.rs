use proptest::prelude::*;

use hydra_twin::analytics::{
    check_readings, forecast_maintenance, wqi_from_readings, ComplianceVerdict, ForecastOutcome,
    ForecastPolicy, WqiPolicy,
};
use hydra_twin::domain::{ClimateProfile, ClimateZone, StationState};
use hydra_twin::simulation::{initial_state, seeded_stream, step};

fn run(profile: &ClimateProfile, seed: u64, ticks: u64) -> Vec<StationState> {
    let mut rng = seeded_stream(seed);
    let mut states = vec![initial_state("prop", profile)];
    for tick in 1..=ticks {
        let next = step(&states[states.len() - 1], tick, profile, &mut rng);
        states.push(next);
    }
    states
}

fn adversarial_profile() -> impl Strategy<Value = ClimateProfile> {
    (
        prop_oneof![0.0..10.0f64, 10.0..1e9f64],
        0.0..=1.0f64,
        2u64..400,
        0.0..5000.0f64,
        0.0..=1.0f64,
    )
        .prop_map(|(noise, fault_p, period, peak, decay)| {
            ClimateProfile::custom(ClimateZone::Tropical, noise, fault_p, period, peak, decay)
                .expect("strategy only yields valid profiles")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_channels_stay_in_bounds(profile in adversarial_profile(), seed in any::<u64>()) {
        for state in run(&profile, seed, 150) {
            prop_assert!(state.within_bounds(), "out of bounds at tick {}: {:?}", state.tick(), state);
        }
    }

    #[test]
    fn prop_replay_is_deterministic(latitude in -90.0..=90.0f64, seed in any::<u64>()) {
        let profile = ClimateProfile::from_latitude(latitude).unwrap();
        prop_assert_eq!(run(&profile, seed, 80), run(&profile, seed, 80));
    }

    #[test]
    fn prop_membrane_never_recovers_on_its_own(profile in adversarial_profile(), seed in any::<u64>()) {
        let states = run(&profile, seed, 120);
        for pair in states.windows(2) {
            prop_assert!(pair[1].membrane_integrity_pct() <= pair[0].membrane_integrity_pct());
        }
    }

    #[test]
    fn prop_worse_turbidity_never_raises_wqi(
        ph in 0.0..=14.0f64,
        turbidity in 0.0..=1000.0f64,
        metal in 0.0..=10.0f64,
        extra in 0.0..=100.0f64,
    ) {
        let policy = WqiPolicy::default();
        let better = wqi_from_readings(ph, turbidity, metal, &policy);
        let worse = wqi_from_readings(ph, turbidity + extra, metal, &policy);
        prop_assert!(worse.score <= better.score);
    }

    #[test]
    fn prop_worse_metal_never_raises_wqi(
        ph in 0.0..=14.0f64,
        turbidity in 0.0..=1000.0f64,
        metal in 0.0..=10.0f64,
        extra in 0.0..=1.0f64,
    ) {
        let policy = WqiPolicy::default();
        let better = wqi_from_readings(ph, turbidity, metal, &policy);
        let worse = wqi_from_readings(ph, turbidity, metal + extra, &policy);
        prop_assert!(worse.score <= better.score);
    }

    #[test]
    fn prop_ph_further_from_neutral_never_raises_wqi(
        ph in 0.0..=14.0f64,
        stretch in 1.0..=3.0f64,
        turbidity in 0.0..=20.0f64,
        metal in 0.0..=0.1f64,
    ) {
        let policy = WqiPolicy::default();
        let worse_ph = (7.5 + (ph - 7.5) * stretch).clamp(0.0, 14.0);
        let better = wqi_from_readings(ph, turbidity, metal, &policy);
        let worse = wqi_from_readings(worse_ph, turbidity, metal, &policy);
        prop_assert!(worse.score <= better.score);
        prop_assert!((0.0..=100.0).contains(&worse.score));
    }

    #[test]
    fn prop_verdict_matches_checks(
        ph in 0.0..=14.0f64,
        turbidity in 0.0..=3.0f64,
        metal in 0.0..=0.03f64,
    ) {
        let report = check_readings(ph, turbidity, metal);
        let passed = report.checks.iter().filter(|c| c.passed).count();
        let expected = match passed {
            3 => ComplianceVerdict::Pass,
            0 => ComplianceVerdict::Fail,
            _ => ComplianceVerdict::Partial,
        };
        prop_assert_eq!(report.verdict, expected);
    }

    #[test]
    fn prop_linear_decline_projects_exact_crossing(
        start in 60.0..=100.0f64,
        rate in 0.05..=2.0f64,
    ) {
        let policy = ForecastPolicy::default();
        let history: Vec<StationState> = (0..30u64)
            .map(|t| StationState::builder("prop", t)
                .membrane_integrity_pct(start - rate * t as f64)
                .build())
            .collect();
        prop_assume!(history[29].membrane_integrity_pct() > policy.critical_threshold_pct);

        let forecast = forecast_maintenance(&history, &policy);
        let expected = (start - policy.critical_threshold_pct) / rate;
        match forecast.outcome {
            ForecastOutcome::Projected { crossing_tick, ticks_remaining } => {
                prop_assert!((crossing_tick - expected).abs() < 1e-6);
                prop_assert!((ticks_remaining - (expected - 29.0)).abs() < 1e-6);
            }
            other => prop_assert!(false, "expected projection, got {:?}", other),
        }
    }
}
