use chrono::{DateTime, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::analytics::{ForecastPolicy, WqiPolicy};
use crate::error::Result;
use crate::reasoner::ReasonerConfig;
use crate::registry::{coordinate_seed, RegistrySettings, SimClock, StationRegistry};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TwinConfig {
    #[validate(nested)]
    pub simulation: SimulationConfig,
    pub reasoner: ReasonerConfig,
    pub forecast: ForecastPolicy,
    pub wqi: WqiPolicy,
    /// Stations to register; the presets are used when empty
    #[validate(nested)]
    pub stations: Vec<StationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulationConfig {
    /// Real-time cadence of one tick
    #[validate(range(min = 10, max = 3_600_000))]
    pub tick_interval_ms: u64,
    /// Snapshots kept per station
    #[validate(range(min = 2))]
    pub history_retention: usize,
    /// Alerts kept per station; older ones are evicted but still counted
    #[validate(range(min = 1))]
    pub alert_retention: usize,
    /// Simulated wall-clock time of tick 0
    pub epoch: DateTime<Utc>,
    /// Ticks between global view log lines
    #[validate(range(min = 1))]
    pub global_view_every_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let clock = SimClock::default();
        Self {
            tick_interval_ms: clock.tick_interval_ms,
            history_retention: 1000,
            alert_retention: 1000,
            epoch: clock.epoch,
            global_view_every_ticks: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationConfig {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
    /// Derived from the coordinates when omitted
    pub seed: Option<u64>,
}

impl TwinConfig {
    /// Defaults, then `config/default.toml`, then `HYDRA__`-prefixed
    /// environment variables (`HYDRA__SIMULATION__TICK_INTERVAL_MS=500`).
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config/default.toml")
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(TwinConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("HYDRA__").split("__"));
        Ok(figment.extract()?)
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            retention: self.simulation.history_retention,
            alert_retention: self.simulation.alert_retention,
            clock: SimClock::new(self.simulation.epoch, self.simulation.tick_interval_ms),
            reasoner: self.reasoner.clone(),
            wqi: self.wqi,
            forecast: self.forecast,
        }
    }

    /// Validate and register every configured station, or the presets when
    /// none are configured.
    pub fn build_registry(&self) -> Result<StationRegistry> {
        self.validate()?;

        let settings = self.registry_settings();
        if self.stations.is_empty() {
            return StationRegistry::with_default_stations(settings);
        }

        let mut registry = StationRegistry::new(settings)?;
        for station in &self.stations {
            let seed = station
                .seed
                .unwrap_or_else(|| coordinate_seed(station.latitude, station.longitude));
            registry.add_station(
                &station.id,
                station.latitude,
                station.longitude,
                station.altitude_m,
                seed,
            )?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TwinError;

    #[test]
    fn test_defaults_build_preset_registry() {
        let registry = TwinConfig::default().build_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.retention(), 1000);
    }

    #[test]
    fn test_configured_stations_replace_presets() {
        let config = TwinConfig {
            stations: vec![StationConfig {
                id: "Pai".into(),
                latitude: 19.3583,
                longitude: 98.4406,
                altitude_m: 510.0,
                seed: None,
            }],
            ..Default::default()
        };
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["Pai"]);
        assert_eq!(
            registry.station("Pai").unwrap().seed(),
            coordinate_seed(19.3583, 98.4406)
        );
    }

    #[test]
    fn test_field_validation() {
        let mut config = TwinConfig::default();
        config.simulation.tick_interval_ms = 1;
        assert!(matches!(config.build_registry(), Err(TwinError::Validation(_))));

        let config = TwinConfig {
            stations: vec![StationConfig {
                id: String::new(),
                latitude: 0.0,
                longitude: 0.0,
                altitude_m: 0.0,
                seed: Some(1),
            }],
            ..Default::default()
        };
        assert!(config.build_registry().is_err());
    }

    #[test]
    fn test_cross_field_validation() {
        let mut config = TwinConfig::default();
        config.simulation.history_retention = 20;
        assert!(matches!(
            config.build_registry(),
            Err(TwinError::InvalidRetention { .. })
        ));
    }

    #[test]
    fn test_toml_and_env_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "hydra.toml",
                r#"
                [simulation]
                tick_interval_ms = 250

                [reasoner]
                cooldown_ticks = 12

                [[stations]]
                id = "Mae Sot"
                latitude = 16.7131
                longitude = 98.5747
                seed = 9
                "#,
            )?;
            jail.set_env("HYDRA__FORECAST__WINDOW", "90");

            let config = TwinConfig::load_from("hydra.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.simulation.tick_interval_ms, 250);
            assert_eq!(config.simulation.history_retention, 1000);
            assert_eq!(config.simulation.alert_retention, 1000);
            assert_eq!(config.reasoner.cooldown_ticks, 12);
            assert_eq!(config.reasoner.ph_min, 6.5);
            assert_eq!(config.forecast.window, 90);
            assert_eq!(config.stations[0].seed, Some(9));
            assert_eq!(config.stations[0].altitude_m, 0.0);
            Ok(())
        });
    }
}
