use std::collections::BTreeMap;

use hydra_twin::domain::{AlertKind, ClimateProfile, ClimateZone, Severity, StationState, Subsystem};
use hydra_twin::reasoner::{AlertMemory, Reasoner};
use hydra_twin::registry::{RegistrySettings, Site, StationRegistry};
use hydra_twin::simulation::{initial_state, seeded_stream, step};
use hydra_twin::text::escape_markup;

const SITE: Site = Site {
    latitude: 18.5883,
    longitude: 98.4861,
    altitude_m: 2565.0,
};

fn station_with_fault_rate(fault_p: f64) -> StationRegistry {
    let profile = ClimateProfile::custom(ClimateZone::Tropical, 1.0, fault_p, 120, 1250.0, 0.05).unwrap();
    let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
    registry.add_station_with_profile("Pai", SITE, 42, profile).unwrap();
    registry
}

#[test]
fn test_healthy_sensors_raise_no_faults() {
    let mut registry = station_with_fault_rate(0.0);
    registry.advance_all(300);
    assert!(registry
        .alerts("Pai")
        .unwrap()
        .iter()
        .all(|a| a.kind != AlertKind::SensorFault));
}

#[test]
fn test_faulty_sensors_are_flagged() {
    let mut registry = station_with_fault_rate(0.05);
    registry.advance_all(300);

    let faults: Vec<_> = registry
        .alerts("Pai")
        .unwrap()
        .iter()
        .filter(|a| a.kind == AlertKind::SensorFault)
        .collect();
    assert!(!faults.is_empty());
    assert!(faults
        .iter()
        .all(|a| a.subsystem == Subsystem::Sensors && a.severity == Severity::Warning));
}

#[test]
fn test_nightfall_is_announced_in_the_afternoon() {
    let mut registry = station_with_fault_rate(0.0);
    // Ten 120-tick days
    registry.advance_all(1200);

    let profile = registry.profile("Pai").unwrap().clone();
    let nights: Vec<_> = registry
        .alerts("Pai")
        .unwrap()
        .iter()
        .filter(|a| a.kind == AlertKind::NightCycle)
        .collect();
    assert!(!nights.is_empty());
    assert!(nights
        .iter()
        .all(|a| profile.tick_of_day(a.tick) > profile.noon_tick() && a.severity == Severity::Info));
}

#[test]
fn test_nightfall_is_announced_at_most_once_per_day() {
    let mut registry = station_with_fault_rate(0.0);
    registry.advance_all(2400);

    let period = registry.profile("Pai").unwrap().diurnal_period();
    let mut per_day: BTreeMap<u64, usize> = BTreeMap::new();
    for alert in registry.alerts("Pai").unwrap() {
        if alert.kind == AlertKind::NightCycle {
            *per_day.entry(alert.tick / period).or_default() += 1;
        }
    }
    assert!(!per_day.is_empty());
    assert!(per_day.values().all(|count| *count == 1));
}

fn reads_true_chemistry(state: &StationState) -> bool {
    let latent = state.chemistry();
    state.ph() == latent.ph
        && state.turbidity_ntu() == latent.turbidity_ntu
        && state.heavy_metal_ppm() == latent.heavy_metal_ppm
}

#[test]
fn test_dead_sensors_never_raise_water_quality_alerts() {
    let reasoner = Reasoner::default();
    let config = reasoner.config().clone();
    let profiles = [
        ClimateProfile::from_latitude(18.5883).unwrap(),
        ClimateProfile::from_latitude(-33.9).unwrap(),
        ClimateProfile::from_latitude(70.0).unwrap(),
        ClimateProfile::custom(ClimateZone::Tropical, 1.0, 0.08, 120, 1250.0, 0.05).unwrap(),
    ];

    let mut fault_alerts = 0;
    for (seed, profile) in profiles.iter().enumerate() {
        let mut rng = seeded_stream(seed as u64 + 11);
        let mut memory = AlertMemory::default();
        let mut prev = initial_state("Pai", profile);
        for tick in 1..=5000 {
            let next = step(&prev, tick, profile, &mut rng);
            let obs = reasoner.observe(&prev, &next, profile, memory);
            let latent = next.chemistry();

            for alert in &obs.alerts {
                match alert.kind {
                    AlertKind::HeavyMetalExceedance => {
                        assert!(latent.heavy_metal_ppm > config.heavy_metal_critical_ppm, "{:?}", alert)
                    }
                    AlertKind::TurbiditySpike => {
                        assert!(latent.turbidity_ntu > config.turbidity_warning_ntu, "{:?}", alert)
                    }
                    AlertKind::PhExcursion => {
                        assert!(latent.ph < config.ph_min || latent.ph > config.ph_max, "{:?}", alert)
                    }
                    AlertKind::SensorFault => {
                        assert!(!reads_true_chemistry(&next), "{:?}", alert);
                        fault_alerts += 1;
                    }
                    _ => {}
                }
            }
            memory = obs.memory;
            prev = next;
        }
    }
    assert!(fault_alerts > 0);
}

#[test]
fn test_narration_line_per_tick() {
    let mut registry = station_with_fault_rate(0.0);
    registry.advance_all(50);

    let narration = registry.narration("Pai").unwrap();
    assert_eq!(narration.len(), 50);
    assert!(narration.iter().all(|line| line.starts_with("[T+")));
    assert!(narration[0].starts_with("[T+000001]"));
}

#[test]
fn test_station_text_is_escaped_at_render_time() {
    let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
    let id = registry
        .add_station("<b onload=x>", 10.0, 10.0, 0.0, 3)
        .unwrap();

    // The core stores the id as plain data
    assert_eq!(id, "<b onload=x>");
    let rendered = escape_markup(registry.latest_state(&id).unwrap().station_id());
    assert_eq!(rendered, "&lt;b onload=x&gt;");
}
