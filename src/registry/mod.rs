//! # Station Registry
//!
//! Owns every registered station and is the only mutator of station history.
//! Each station carries its own seeded random stream, so advancing one
//! station never perturbs another's trajectory.
//!
//! ```rust
//! use hydra_twin::registry::{RegistrySettings, StationRegistry};
//!
//! let mut registry = StationRegistry::with_default_stations(RegistrySettings::default()).unwrap();
//! registry.advance_all(10);
//!
//! for entry in registry.global_view() {
//!     println!("{} {:.1} {}", entry.station_id, entry.wqi.score, entry.verdict);
//! }
//! ```

pub mod clock;
pub mod compare;
pub mod record;

pub use clock::SimClock;
pub use compare::{Direction, Metric, MetricComparison, StationComparison, Winner};
pub use record::{Retention, Site, StationRecord};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use tracing::info;

use crate::analytics::{
    AnalyticsEngine, ComplianceVerdict, ForecastPolicy, MaintenanceForecast, SessionSummary,
    WqiPolicy, WqiScore,
};
use crate::domain::{AlertEvent, ClimateProfile, StationId, StationState};
use crate::error::{Result, TwinError};
use crate::reasoner::{Reasoner, ReasonerConfig};

/// Longest accepted station id, in characters
pub const MAX_STATION_ID_CHARS: usize = 64;

/// A preset station site
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub site: Site,
    pub seed: u64,
}

/// Stations registered by [`StationRegistry::with_default_stations`]
pub const PRESETS: [Preset; 3] = [
    Preset {
        id: "Doi Inthanon",
        site: Site {
            latitude: 18.5883,
            longitude: 98.4861,
            altitude_m: 2565.0,
        },
        seed: 42,
    },
    Preset {
        id: "Chiang Rai",
        site: Site {
            latitude: 19.9105,
            longitude: 99.8406,
            altitude_m: 580.0,
        },
        seed: 137,
    },
    Preset {
        id: "Nan",
        site: Site {
            latitude: 18.7756,
            longitude: 100.7730,
            altitude_m: 240.0,
        },
        seed: 256,
    },
];

/// Registry-wide policies
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    /// Snapshots kept per station
    pub retention: usize,
    /// Alerts kept per station
    pub alert_retention: usize,
    pub clock: SimClock,
    pub reasoner: ReasonerConfig,
    pub wqi: WqiPolicy,
    pub forecast: ForecastPolicy,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            retention: 1000,
            alert_retention: 1000,
            clock: SimClock::default(),
            reasoner: ReasonerConfig::default(),
            wqi: WqiPolicy::default(),
            forecast: ForecastPolicy::default(),
        }
    }
}

/// One row of the global view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalEntry {
    pub station_id: StationId,
    pub site: Site,
    pub tick: u64,
    pub wqi: WqiScore,
    pub verdict: ComplianceVerdict,
}

#[derive(Debug, Clone)]
pub struct StationRegistry {
    stations: BTreeMap<StationId, StationRecord>,
    reasoner: Reasoner,
    analytics: AnalyticsEngine,
    retention: Retention,
    clock: SimClock,
}

impl StationRegistry {
    /// Empty registry.
    ///
    /// Fails when the forecast window does not fit in the retained history or
    /// a policy is inconsistent.
    pub fn new(settings: RegistrySettings) -> Result<Self> {
        if settings.forecast.window > settings.retention {
            return Err(TwinError::InvalidRetention {
                window: settings.forecast.window,
                retention: settings.retention,
            });
        }

        Ok(Self {
            stations: BTreeMap::new(),
            reasoner: Reasoner::new(settings.reasoner)?,
            analytics: AnalyticsEngine::new(settings.wqi, settings.forecast)?,
            retention: Retention {
                history: settings.retention,
                alerts: settings.alert_retention,
            },
            clock: settings.clock,
        })
    }

    /// Registry pre-loaded with the [`PRESETS`]
    pub fn with_default_stations(settings: RegistrySettings) -> Result<Self> {
        let mut registry = Self::new(settings)?;
        for preset in PRESETS {
            let site = preset.site;
            registry.add_station(preset.id, site.latitude, site.longitude, site.altitude_m, preset.seed)?;
        }
        Ok(registry)
    }

    /// Register a station at tick 0 with a latitude-derived climate profile.
    ///
    /// Control characters are stripped from `id` first; the returned id is
    /// the one the station is registered under.
    pub fn add_station(
        &mut self,
        id: &str,
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
        seed: u64,
    ) -> Result<StationId> {
        let profile = ClimateProfile::from_latitude(latitude)?;
        let site = validate_site(latitude, longitude, altitude_m)?;
        self.insert(id, site, seed, profile)
    }

    /// Register a station with an explicit climate profile
    pub fn add_station_with_profile(
        &mut self,
        id: &str,
        site: Site,
        seed: u64,
        profile: ClimateProfile,
    ) -> Result<StationId> {
        let site = validate_site(site.latitude, site.longitude, site.altitude_m)?;
        self.insert(id, site, seed, profile)
    }

    /// Register a sea-level station whose seed is derived from its coordinates
    pub fn add_custom_station(&mut self, id: &str, latitude: f64, longitude: f64) -> Result<StationId> {
        let seed = coordinate_seed(latitude, longitude);
        self.add_station(id, latitude, longitude, 0.0, seed)
    }

    fn insert(&mut self, id: &str, site: Site, seed: u64, profile: ClimateProfile) -> Result<StationId> {
        let id = sanitize_station_id(id)?;
        if self.stations.contains_key(&id) {
            return Err(TwinError::DuplicateStation(id));
        }

        info!(
            station = %id,
            latitude = site.latitude,
            longitude = site.longitude,
            zone = %profile.zone(),
            seed,
            "station registered"
        );

        let record = StationRecord::commission(id.clone(), site, seed, profile);
        self.stations.insert(id.clone(), record);
        Ok(id)
    }

    /// Advance every station by `n_ticks`, returning the alerts emitted.
    ///
    /// Stations advance in id order within each tick; their streams are
    /// independent, so the order does not affect any trajectory.
    pub fn advance_all(&mut self, n_ticks: u64) -> Vec<AlertEvent> {
        let mut emitted = Vec::new();
        for _ in 0..n_ticks {
            for record in self.stations.values_mut() {
                emitted.extend(record.advance(&self.reasoner, self.retention));
            }
        }
        emitted
    }

    /// Schedule a membrane replacement, applied on the station's next advance
    pub fn service_membrane(&mut self, id: &str) -> Result<()> {
        let record = self.record_mut(id)?;
        record.schedule_service();
        info!(station = %id, tick = record.latest().tick(), "membrane service scheduled");
        Ok(())
    }

    /// Per-metric history averages of two stations with a winner for each
    pub fn compare(&self, id_a: &str, id_b: &str) -> Result<StationComparison> {
        let a = self.station(id_a)?;
        let b = self.station(id_b)?;
        let history_a: Vec<&StationState> = a.history().iter().collect();
        let history_b: Vec<&StationState> = b.history().iter().collect();

        Ok(compare::compare_histories(
            a.id(),
            &history_a,
            b.id(),
            &history_b,
            &self.analytics,
        ))
    }

    /// Latest WQI and compliance verdict of every station, in id order
    pub fn global_view(&self) -> Vec<GlobalEntry> {
        self.stations
            .values()
            .map(|record| {
                let latest = record.latest();
                GlobalEntry {
                    station_id: record.id().to_string(),
                    site: record.site(),
                    tick: latest.tick(),
                    wqi: self.analytics.wqi(latest),
                    verdict: self.analytics.compliance(latest).verdict,
                }
            })
            .collect()
    }

    pub fn station(&self, id: &str) -> Result<&StationRecord> {
        self.stations
            .get(id)
            .ok_or_else(|| TwinError::UnknownStation(id.to_string()))
    }

    fn record_mut(&mut self, id: &str) -> Result<&mut StationRecord> {
        self.stations
            .get_mut(id)
            .ok_or_else(|| TwinError::UnknownStation(id.to_string()))
    }

    pub fn latest_state(&self, id: &str) -> Result<&StationState> {
        Ok(self.station(id)?.latest())
    }

    pub fn history(&self, id: &str) -> Result<&VecDeque<StationState>> {
        Ok(self.station(id)?.history())
    }

    /// Retained alerts of a station, oldest first
    pub fn alerts(&self, id: &str) -> Result<&VecDeque<AlertEvent>> {
        Ok(self.station(id)?.alerts())
    }

    pub fn narration(&self, id: &str) -> Result<&VecDeque<String>> {
        Ok(self.station(id)?.narration())
    }

    pub fn profile(&self, id: &str) -> Result<&ClimateProfile> {
        Ok(self.station(id)?.profile())
    }

    /// Membrane maintenance forecast over the station's retained history
    pub fn forecast(&self, id: &str) -> Result<MaintenanceForecast> {
        Ok(self.analytics.forecast(self.station(id)?.history()))
    }

    pub fn summary(&self, id: &str) -> Result<SessionSummary> {
        let record = self.station(id)?;
        Ok(self.analytics.summary(record.history(), record.alert_total()))
    }

    /// CSV export of the station's retained history
    pub fn export_csv(&self, id: &str) -> Result<String> {
        Ok(crate::export::history_csv(
            self.station(id)?.history(),
            &self.analytics,
            &self.clock,
        ))
    }

    /// JSON export of the station's retained alerts
    pub fn export_alerts_json(&self, id: &str) -> Result<String> {
        crate::export::alerts_json(self.station(id)?.alerts())
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Snapshots kept per station
    pub fn retention(&self) -> usize {
        self.retention.history
    }

    pub fn alert_retention(&self) -> usize {
        self.retention.alerts
    }

    /// Registered ids in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

fn validate_site(latitude: f64, longitude: f64, altitude_m: f64) -> Result<Site> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(TwinError::InvalidLatitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(TwinError::InvalidLongitude(longitude));
    }
    if !altitude_m.is_finite() {
        return Err(TwinError::InvalidAltitude(altitude_m));
    }
    Ok(Site {
        latitude,
        longitude,
        altitude_m,
    })
}

/// Strip control characters and surrounding whitespace, then check length.
pub fn sanitize_station_id(raw: &str) -> Result<StationId> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    let chars = cleaned.chars().count();
    if chars == 0 || chars > MAX_STATION_ID_CHARS {
        return Err(TwinError::InvalidStationId(raw.to_string()));
    }
    Ok(cleaned.to_string())
}

/// Seed for a custom station: first 32 bits (big-endian) of SHA-256 over
/// `"{lat:.6},{lon:.6}"`.
pub fn coordinate_seed(latitude: f64, longitude: f64) -> u64 {
    let digest = Sha256::digest(format!("{:.6},{:.6}", latitude, longitude).as_bytes());
    u64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_presets_register() {
        let registry = StationRegistry::with_default_stations(RegistrySettings::default()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["Chiang Rai", "Doi Inthanon", "Nan"]
        );
        assert_eq!(registry.station("Nan").unwrap().seed(), 256);
    }

    #[test]
    fn test_duplicate_station_rejected() {
        let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
        registry.add_station("alpha", 10.0, 20.0, 5.0, 1).unwrap();
        let err = registry.add_station("alpha", 11.0, 21.0, 5.0, 2).unwrap_err();
        assert!(matches!(err, TwinError::DuplicateStation(id) if id == "alpha"));

        // Sanitised ids collide too
        let err = registry.add_station("al\u{7}pha", 11.0, 21.0, 5.0, 2).unwrap_err();
        assert!(matches!(err, TwinError::DuplicateStation(_)));
    }

    #[rstest]
    #[case(91.0, 0.0, 0.0)]
    #[case(f64::NAN, 0.0, 0.0)]
    #[case(0.0, 180.5, 0.0)]
    #[case(0.0, 0.0, f64::INFINITY)]
    fn test_invalid_site_rejected(#[case] lat: f64, #[case] lon: f64, #[case] alt: f64) {
        let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
        let err = registry.add_station("x", lat, lon, alt, 1).unwrap_err();
        assert!(err.is_configuration());
        assert!(registry.is_empty());
    }

    #[rstest]
    #[case("", false)]
    #[case("   ", false)]
    #[case("\n\t", false)]
    #[case("Mae Hong Son", true)]
    #[case("<script>", true)]
    fn test_station_id_rules(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(sanitize_station_id(raw).is_ok(), ok);
    }

    #[test]
    fn test_station_id_length_limit() {
        assert!(sanitize_station_id(&"x".repeat(64)).is_ok());
        assert!(sanitize_station_id(&"x".repeat(65)).is_err());
        assert_eq!(sanitize_station_id("  Nan\r\n").unwrap(), "Nan");
    }

    #[test]
    fn test_retention_must_cover_forecast_window() {
        let settings = RegistrySettings {
            retention: 30,
            ..Default::default()
        };
        let err = StationRegistry::new(settings).unwrap_err();
        assert!(matches!(
            err,
            TwinError::InvalidRetention {
                window: 60,
                retention: 30
            }
        ));
    }

    #[test]
    fn test_coordinate_seed_is_stable() {
        let a = coordinate_seed(13.7563, 100.5018);
        assert_eq!(a, coordinate_seed(13.7563, 100.5018));
        assert_ne!(a, coordinate_seed(13.7564, 100.5018));
        assert!(a <= u64::from(u32::MAX));
    }

    #[test]
    fn test_custom_station_uses_coordinate_seed() {
        let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
        let id = registry.add_custom_station("Bangkok", 13.7563, 100.5018).unwrap();
        let record = registry.station(&id).unwrap();
        assert_eq!(record.seed(), coordinate_seed(13.7563, 100.5018));
        assert_eq!(record.site().altitude_m, 0.0);
    }

    #[test]
    fn test_unknown_station() {
        let mut registry = StationRegistry::new(RegistrySettings::default()).unwrap();
        assert!(matches!(
            registry.latest_state("ghost"),
            Err(TwinError::UnknownStation(_))
        ));
        assert!(registry.service_membrane("ghost").is_err());
        assert!(registry.compare("ghost", "ghost").is_err());
    }

    #[test]
    fn test_global_view_tracks_latest_tick() {
        let mut registry = StationRegistry::with_default_stations(RegistrySettings::default()).unwrap();
        registry.advance_all(7);
        let view = registry.global_view();
        assert_eq!(view.len(), 3);
        assert!(view.iter().all(|e| e.tick == 7));
        assert!(view.iter().all(|e| (0.0..=100.0).contains(&e.wqi.score)));
    }
}
