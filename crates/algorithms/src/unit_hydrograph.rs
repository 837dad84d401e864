//! Snyder synthetic unit hydrograph
//!
//! Lag, duration and peak follow Snyder (1938); the shape of the curve is
//! the SCS dimensionless hydrograph stretched to the Snyder time to peak.
//! Peaks are per millimetre of direct runoff, so a flood hydrograph is the
//! unit curve scaled by a storm's runoff depth.

use crate::config::SnyderParams;
use crate::hydrology::StormRunoff;

/// SCS dimensionless unit hydrograph as (t/tp, Q/Qp) pairs.
pub const SCS_DIMENSIONLESS: [(f64, f64); 30] = [
    (0.0, 0.000),
    (0.1, 0.030),
    (0.2, 0.100),
    (0.3, 0.190),
    (0.4, 0.310),
    (0.5, 0.470),
    (0.6, 0.660),
    (0.7, 0.820),
    (0.8, 0.930),
    (0.9, 0.990),
    (1.0, 1.000),
    (1.1, 0.990),
    (1.2, 0.930),
    (1.3, 0.860),
    (1.4, 0.780),
    (1.5, 0.680),
    (1.6, 0.560),
    (1.7, 0.460),
    (1.8, 0.390),
    (1.9, 0.330),
    (2.0, 0.280),
    (2.2, 0.207),
    (2.4, 0.147),
    (2.6, 0.107),
    (2.8, 0.077),
    (3.0, 0.055),
    (3.5, 0.025),
    (4.0, 0.011),
    (4.5, 0.005),
    (5.0, 0.000),
];

/// Q/Qp at t/tp, linear between table points and 0 outside the table.
pub fn dimensionless_ordinate(t_ratio: f64) -> f64 {
    let first = SCS_DIMENSIONLESS[0].0;
    let last = SCS_DIMENSIONLESS[SCS_DIMENSIONLESS.len() - 1].0;
    if !(first..=last).contains(&t_ratio) {
        return 0.0;
    }
    SCS_DIMENSIONLESS
        .windows(2)
        .find(|w| t_ratio <= w[1].0)
        .map_or(0.0, |w| {
            let ((t0, q0), (t1, q1)) = (w[0], w[1]);
            q0 + (q1 - q0) * (t_ratio - t0) / (t1 - t0)
        })
}

/// Snyder unit hydrograph of one basin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnyderHydrograph {
    pub length_km: f64,
    /// Distance from the outlet to the point opposite the centroid (km)
    pub lca_km: f64,
    pub area_km2: f64,
    /// Basin lag tL (h)
    pub lag_h: f64,
    /// Standard storm duration tr (h)
    pub duration_h: f64,
    /// Time to peak tp (h)
    pub peak_time_h: f64,
    /// Peak discharge per mm of runoff (m³/s)
    pub peak_m3s: f64,
    /// Peak per unit area (m³/s/km² per mm)
    pub unit_peak: f64,
    /// Width at 50 % of the peak (h)
    pub w50_h: f64,
    /// Width at 75 % of the peak (h)
    pub w75_h: f64,
    /// Base time tb (h)
    pub base_time_h: f64,
}

/// Snyder parameters for a main-stream length and basin area.
///
/// `None` when either is not positive.
pub fn snyder(length_km: f64, area_km2: f64, params: &SnyderParams) -> Option<SnyderHydrograph> {
    if !(length_km > 0.0 && area_km2 > 0.0) {
        return None;
    }
    let lca_km = params.lca_fraction * length_km;
    let lag_h = params.ct * (length_km * lca_km).powf(0.3);
    let duration_h = lag_h / params.duration_divisor;
    let peak_time_h = lag_h + duration_h / 2.0;
    let peak_m3s = 2.75 * params.cp * area_km2 / lag_h;
    let unit_peak = peak_m3s / area_km2;

    Some(SnyderHydrograph {
        length_km,
        lca_km,
        area_km2,
        lag_h,
        duration_h,
        peak_time_h,
        peak_m3s,
        unit_peak,
        w50_h: 2.14 / unit_peak.powf(1.08),
        w75_h: 1.22 / unit_peak.powf(1.08),
        base_time_h: (params.base_time_factor * peak_time_h).max(2.0 * peak_time_h),
    })
}

impl SnyderHydrograph {
    /// Discharge at `t_h` hours for `runoff_mm` of direct runoff.
    pub fn discharge(&self, t_h: f64, runoff_mm: f64) -> f64 {
        dimensionless_ordinate(t_h / self.peak_time_h) * self.peak_m3s * runoff_mm
    }

    /// Evenly spaced (t, Q) pairs from 0 to `series_extent·tb`.
    pub fn series(&self, runoff_mm: f64, params: &SnyderParams) -> Vec<(f64, f64)> {
        let end = self.base_time_h * params.series_extent;
        crate::vector::linspace(0.0, end, params.series_points)
            .into_iter()
            .map(|t| (t, self.discharge(t, runoff_mm)))
            .collect()
    }
}

/// Flood peak of one design storm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodPeak {
    pub return_period: f64,
    pub runoff_mm: f64,
    pub peak_m3s: f64,
}

/// Unit peak scaled by each storm's runoff depth.
pub fn flood_peaks(uh: &SnyderHydrograph, storms: &[StormRunoff]) -> Vec<FloodPeak> {
    storms
        .iter()
        .map(|s| FloodPeak {
            return_period: s.return_period,
            runoff_mm: s.runoff_mm,
            peak_m3s: uh.peak_m3s * s.runoff_mm,
        })
        .collect()
}
