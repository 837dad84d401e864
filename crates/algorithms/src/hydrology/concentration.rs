//! Time of concentration: Kirpich, SCS lag and NRCS sheet flow.

use crate::config::ConcentrationParams;

/// Kirpich (1940) Tc in minutes for a flow length `length_m` and fall `relief_m`.
pub fn kirpich(length_m: f64, relief_m: f64) -> f64 {
    let slope = if length_m > 0.0 { relief_m / length_m } else { 0.001 };
    let slope = slope.max(1e-4);
    0.0195 * length_m.max(0.0).powf(0.77) * slope.powf(-0.385)
}

/// SCS lag method Tc in minutes; `slope_pct` is the mean watershed slope.
pub fn scs_lag(length_m: f64, cn: f64, slope_pct: f64) -> f64 {
    let length_ft = length_m.max(0.0) * 3.28084;
    let retention_in = 1000.0 / cn - 10.0;
    let y = slope_pct.max(0.1);
    let lag_h = length_ft.powf(0.8) * (retention_in + 1.0).powf(0.7) / (1900.0 * y.sqrt());
    lag_h / 0.6 * 60.0
}

/// NRCS sheet-flow travel time in minutes.
///
/// `p2_mm` is the 2-year 24-hour rainfall; the flow length is capped at
/// `max_length_m` and the slope (m/m) floored at 0.001.
pub fn overland_flow(length_m: f64, manning_n: f64, slope: f64, p2_mm: f64, max_length_m: f64) -> f64 {
    let p2_in = p2_mm * 0.0394;
    let l = length_m.min(max_length_m).max(0.0);
    let s = slope.max(0.001);
    0.007 * (manning_n * l).powf(0.8) / (p2_in.sqrt() * s.powf(0.4)) * 60.0
}

/// Tc estimates for one subbasin (minutes unless noted).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationTime {
    pub length_km: f64,
    pub relief_m: f64,
    pub slope_pct: f64,
    pub kirpich_min: f64,
    pub scs_lag_min: f64,
    /// Sheet-flow time, reported only
    pub overland_min: f64,
    /// Mean of Kirpich and SCS lag
    pub tc_min: f64,
}

impl ConcentrationTime {
    pub fn tc_hours(&self) -> f64 {
        self.tc_min / 60.0
    }
}

/// Compute every Tc estimate; missing relief or slope fall back to the
/// configured defaults. `None` when the basin has no length, since every
/// estimate would then be zero.
pub fn time_of_concentration(
    basin_length_km: f64,
    relief_m: Option<f64>,
    slope_deg: Option<f64>,
    cn: f64,
    p2_mm: f64,
    params: &ConcentrationParams,
) -> Option<ConcentrationTime> {
    if !(basin_length_km > 0.0) {
        return None;
    }
    let length_m = basin_length_km * 1000.0;
    let relief = relief_m.unwrap_or(params.default_relief_m);
    let slope_deg = slope_deg.unwrap_or(params.default_slope_deg);
    let slope_frac = slope_deg.to_radians().tan();
    let slope_pct = slope_frac * 100.0;

    let kirpich_min = kirpich(length_m, relief);
    let scs_lag_min = scs_lag(length_m, cn, slope_pct);
    let tc_min = (kirpich_min + scs_lag_min) / 2.0;
    if !(tc_min > 0.0 && tc_min.is_finite()) {
        return None;
    }
    Some(ConcentrationTime {
        length_km: basin_length_km,
        relief_m: relief,
        slope_pct,
        kirpich_min,
        scs_lag_min,
        overland_min: overland_flow(
            length_m,
            params.overland_manning_n,
            slope_frac,
            p2_mm,
            params.overland_max_length_m,
        ),
        tc_min,
    })
}
