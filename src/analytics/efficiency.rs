/// Irradiance below which the collector is treated as dark (W/m²)
pub const NIGHT_IRRADIANCE_WM2: f64 = 10.0;

/// Collector area the irradiance reading is normalised to (m²)
pub const COLLECTOR_AREA_M2: f64 = 1.0;

/// Desalination output per unit of solar energy input, in L/kWh.
///
/// Returns `None` in the dark (irradiance under [`NIGHT_IRRADIANCE_WM2`]) or
/// for non-finite inputs, so callers never see a division blow-up.
pub fn energy_efficiency(desalination_rate_lhr: f64, irradiance_wm2: f64) -> Option<f64> {
    if !irradiance_wm2.is_finite()
        || !desalination_rate_lhr.is_finite()
        || irradiance_wm2 < NIGHT_IRRADIANCE_WM2
    {
        return None;
    }

    let input_kw = irradiance_wm2 * COLLECTOR_AREA_M2 / 1000.0;
    Some(desalination_rate_lhr.max(0.0) / input_kw)
}
