//! Rational method peak discharge.

use super::runoff::StormRunoff;

/// Rainfall intensity (mm/h) over a duration of `tc_hours`, scaled from the
/// 24-hour depth with the two-thirds power rule. `None` unless the duration
/// is positive and finite.
pub fn rainfall_intensity(p24_mm: f64, tc_hours: f64) -> Option<f64> {
    if !(tc_hours > 0.0 && tc_hours.is_finite()) {
        return None;
    }
    Some((p24_mm / 24.0) * (24.0 / tc_hours).powf(2.0 / 3.0))
}

/// `Qp = C·i·A/3.6` in m³/s for `A` in km² and `i` in mm/h.
pub fn rational_peak(coefficient: f64, intensity_mm_h: f64, area_km2: f64) -> f64 {
    coefficient * intensity_mm_h * area_km2 / 3.6
}

/// Peak discharge of one design storm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDischarge {
    pub return_period: f64,
    pub intensity_mm_h: Option<f64>,
    pub coefficient: f64,
    /// m³/s
    pub peak_m3s: Option<f64>,
}

/// Rational peaks for every storm, using each storm's SCS runoff
/// coefficient as C. Without a Tc every storm is kept with missing
/// intensity and peak.
pub fn peak_discharges(storms: &[StormRunoff], tc_hours: Option<f64>, area_km2: f64) -> Vec<PeakDischarge> {
    storms
        .iter()
        .map(|s| {
            let i = tc_hours.and_then(|tc| rainfall_intensity(s.rainfall_mm, tc));
            PeakDischarge {
                return_period: s.return_period,
                intensity_mm_h: i,
                coefficient: s.coefficient,
                peak_m3s: i.map(|i| rational_peak(s.coefficient, i, area_km2)),
            }
        })
        .collect()
}
