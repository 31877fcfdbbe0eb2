use hydra_twin::analytics::{check_compliance, ForecastOutcome};
use hydra_twin::domain::{AlertEvent, ClimateZone, StationState};
use hydra_twin::registry::{RegistrySettings, StationRegistry, Winner, Metric};
use hydra_twin::reasoner::ReasonerConfig;
use hydra_twin::simulation::clear_sky_irradiance;
use hydra_twin::TwinError;

fn presets() -> StationRegistry {
    StationRegistry::with_default_stations(RegistrySettings::default()).unwrap()
}

#[test]
fn test_replay_is_bit_identical() {
    let mut first = presets();
    let mut second = presets();

    let alerts_first = first.advance_all(250);
    let alerts_second = second.advance_all(250);

    assert_eq!(alerts_first, alerts_second);
    for id in ["Doi Inthanon", "Chiang Rai", "Nan"] {
        let a: Vec<&StationState> = first.history(id).unwrap().iter().collect();
        let b: Vec<&StationState> = second.history(id).unwrap().iter().collect();
        assert_eq!(a, b);
        assert_eq!(first.narration(id).unwrap(), second.narration(id).unwrap());
    }
}

#[test]
fn test_stations_do_not_share_randomness() {
    let mut alone = StationRegistry::new(RegistrySettings::default()).unwrap();
    alone.add_station("Nan", 18.7756, 100.7730, 240.0, 256).unwrap();
    alone.advance_all(120);

    let mut crowded = presets();
    crowded.add_custom_station("Bangkok", 13.7563, 100.5018).unwrap();
    crowded.advance_all(120);

    assert_eq!(alone.history("Nan").unwrap(), crowded.history("Nan").unwrap());
}

#[test]
fn test_chunked_advance_matches_single_call() {
    let mut once = presets();
    once.advance_all(40);

    let mut chunked = presets();
    for _ in 0..8 {
        chunked.advance_all(5);
    }

    assert_eq!(
        once.latest_state("Chiang Rai").unwrap(),
        chunked.latest_state("Chiang Rai").unwrap()
    );
}

#[test]
fn test_tropical_day_night_scenario() {
    let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
    registry.add_station("Doi Inthanon", 18.5883, 98.4861, 2565.0, 42).unwrap();
    registry.advance_all(100);

    let profile = registry.profile("Doi Inthanon").unwrap().clone();
    assert_eq!(profile.zone(), ClimateZone::Tropical);

    let history = registry.history("Doi Inthanon").unwrap();
    assert_eq!(history.len(), 101);

    let night: Vec<&StationState> = history
        .iter()
        .filter(|s| clear_sky_irradiance(&profile, s.tick()) <= 0.0)
        .collect();
    assert!(!night.is_empty());
    assert!(night.iter().all(|s| s.solar_irradiance_wm2() == 0.0));

    let noon = profile.noon_tick();
    let near_noon = history
        .iter()
        .filter(|s| s.tick().abs_diff(noon) <= 5)
        .map(|s| s.solar_irradiance_wm2())
        .fold(0.0, f64::max);
    assert!(near_noon > 0.0);

    for state in history {
        assert!(state.within_bounds());
        let report = check_compliance(state);
        assert_eq!(report.checks.len(), 3);
    }
}

#[test]
fn test_membrane_only_recovers_through_service() {
    let mut registry = presets();
    registry.advance_all(80);

    let history = registry.history("Nan").unwrap();
    let pairs: Vec<(f64, f64)> = history
        .iter()
        .zip(history.iter().skip(1))
        .map(|(a, b)| (a.membrane_integrity_pct(), b.membrane_integrity_pct()))
        .collect();
    assert!(pairs.iter().all(|(before, after)| after <= before));

    let worn = registry.latest_state("Nan").unwrap().membrane_integrity_pct();
    registry.service_membrane("Nan").unwrap();
    registry.advance_all(1);
    let fresh = registry.latest_state("Nan").unwrap().membrane_integrity_pct();
    assert!(fresh > worn);
    assert!(fresh > 99.0);
}

#[test]
fn test_forecast_projects_wear() {
    let mut registry = presets();

    let early = registry.forecast("Chiang Rai").unwrap();
    assert!(matches!(early.outcome, ForecastOutcome::InsufficientHistory { .. }));

    registry.advance_all(100);
    let forecast = registry.forecast("Chiang Rai").unwrap();
    match forecast.outcome {
        ForecastOutcome::Projected { ticks_remaining, .. } => assert!(ticks_remaining > 0.0),
        other => panic!("expected a projection, got {:?}", other),
    }
    assert!(forecast.fit.unwrap().slope < 0.0);
}

#[test]
fn test_history_eviction_keeps_forecast_window() {
    let settings = RegistrySettings {
        retention: 60,
        ..Default::default()
    };
    let mut registry = StationRegistry::with_default_stations(settings).unwrap();
    registry.advance_all(300);

    let history = registry.history("Nan").unwrap();
    assert_eq!(history.len(), 60);
    assert_eq!(history[0].tick(), 241);
    let forecast = registry.forecast("Nan").unwrap();
    assert_eq!(forecast.fit.unwrap().samples, 60);
}

#[test]
fn test_alert_log_is_append_only() {
    let settings = RegistrySettings {
        reasoner: ReasonerConfig {
            cooldown_ticks: 1,
            ..ReasonerConfig::conservative()
        },
        ..Default::default()
    };
    let mut registry = StationRegistry::with_default_stations(settings).unwrap();

    let emitted = registry.advance_all(200);
    let before: Vec<AlertEvent> = registry.alerts("Nan").unwrap().iter().cloned().collect();
    registry.advance_all(200);
    let after: Vec<AlertEvent> = registry.alerts("Nan").unwrap().iter().cloned().collect();

    assert_eq!(&after[..before.len()], before.as_slice());
    let total: usize = registry.ids().map(|id| registry.alerts(id).unwrap().len()).sum();
    assert!(total >= emitted.len());
    assert_eq!(registry.summary("Nan").unwrap().alert_count, after.len());
}

#[test]
fn test_alert_log_is_capped_but_counted() {
    let settings = RegistrySettings {
        alert_retention: 8,
        reasoner: ReasonerConfig {
            cooldown_ticks: 1,
            ..ReasonerConfig::conservative()
        },
        ..Default::default()
    };
    let mut registry = StationRegistry::with_default_stations(settings).unwrap();
    let emitted = registry.advance_all(600);

    let nan_emitted: Vec<&AlertEvent> = emitted.iter().filter(|a| a.station_id == "Nan").collect();
    assert!(nan_emitted.len() > 8);

    let kept = registry.alerts("Nan").unwrap();
    assert_eq!(kept.len(), 8);
    let newest: Vec<&AlertEvent> = nan_emitted[nan_emitted.len() - 8..].to_vec();
    assert_eq!(kept.iter().collect::<Vec<_>>(), newest);
    assert_eq!(registry.summary("Nan").unwrap().alert_count, nan_emitted.len());

    let json = registry.export_alerts_json("Nan").unwrap();
    let parsed: Vec<AlertEvent> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), 8);
}

#[test]
fn test_compare_reports_every_metric() {
    let mut registry = presets();
    registry.advance_all(60);

    let cmp = registry.compare("Doi Inthanon", "Nan").unwrap();
    assert_eq!(cmp.station_a, "Doi Inthanon");
    assert_eq!(cmp.metrics.len(), 9);
    assert_eq!(cmp.metric(Metric::Ph).unwrap().winner, Winner::NotRanked);

    let self_cmp = registry.compare("Nan", "Nan").unwrap();
    assert!(self_cmp
        .metrics
        .iter()
        .all(|m| matches!(m.winner, Winner::Tie | Winner::NotRanked)));
    assert_eq!(self_cmp.score(), (0, 0));
}

#[test]
fn test_csv_export_has_row_per_snapshot() {
    let mut registry = presets();
    registry.advance_all(25);

    let csv = registry.export_csv("Nan").unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 27);
    assert!(lines[0].starts_with("tick,timestamp,"));
    assert!(lines[26].starts_with("25,2024-01-01T00:00:25+00:00,"));
}

#[test]
fn test_configuration_errors_surface_immediately() {
    let mut registry = presets();
    assert!(matches!(
        registry.add_station("Nan", 18.0, 100.0, 0.0, 1),
        Err(TwinError::DuplicateStation(_))
    ));
    assert!(matches!(
        registry.add_station("North", 95.0, 0.0, 0.0, 1),
        Err(TwinError::InvalidLatitude(_))
    ));
    assert!(matches!(
        registry.add_custom_station("East", 0.0, 200.0),
        Err(TwinError::InvalidLongitude(_))
    ));
    assert_eq!(registry.len(), 3);
}
