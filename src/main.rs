use anyhow::Result;
use hydra_twin::{config::TwinConfig, telemetry};
use std::time::Duration;
use telemetry::init_tracing;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = TwinConfig::load()?;
    let mut registry = cfg.build_registry()?;

    info!(
        stations = registry.len(),
        tick_interval_ms = cfg.simulation.tick_interval_ms,
        retention = registry.retention(),
        "starting HYDRA station twin"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(cfg.simulation.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = telemetry::shutdown_signal();
    tokio::pin!(shutdown);

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                // Alerts are logged by the reasoner as they fire
                registry.advance_all(1);
                ticks += 1;

                for id in registry.ids() {
                    if let Some(line) = registry.narration(id)?.back() {
                        info!(station = %id, "{}", line);
                    }
                }

                if ticks % cfg.simulation.global_view_every_ticks == 0 {
                    for entry in registry.global_view() {
                        info!(
                            station = %entry.station_id,
                            latitude = entry.site.latitude,
                            longitude = entry.site.longitude,
                            tick = entry.tick,
                            wqi = entry.wqi.score,
                            grade = %entry.wqi.grade,
                            verdict = %entry.verdict,
                            "global view"
                        );
                    }
                }
            }
        }
    }

    for id in registry.ids() {
        let summary = registry.summary(id)?;
        let forecast = registry.forecast(id)?;
        info!(
            station = %id,
            ticks_until_maintenance = ?forecast.ticks_until_threshold(),
            "{}",
            summary
        );
    }

    warn!(ticks, "shutdown complete");
    Ok(())
}
