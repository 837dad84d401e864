//! Relief aspects from the DEM, slope and TRI cells of one subbasin.

use crate::statistics::{mean, percentiles, ratio, skewness, std_dev};
use crate::vector::linspace;

use super::ArealAspects;

/// Hypsometric curve sampled at 101 elevation percentiles.
#[derive(Debug, Clone, PartialEq)]
pub struct HypsometricCurve {
    /// a/A, from 1 down to 0
    pub relative_area: Vec<f64>,
    /// h/H, from 0 up to 1
    pub relative_elevation: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReliefAspects {
    pub elev_min: f64,
    pub elev_max: f64,
    pub elev_mean: f64,
    /// H (m)
    pub relief_m: f64,
    /// Rh = H / Lb
    pub relief_ratio: Option<f64>,
    /// Rr = H / P (m/km)
    pub relative_relief: Option<f64>,
    /// Rn = H · Dd / 1000
    pub ruggedness_number: Option<f64>,
    /// MRN = H / sqrt(A)
    pub melton_ruggedness: Option<f64>,
    pub hypsometric_integral: Option<f64>,
    pub hypsometric_curve: Option<HypsometricCurve>,
    pub slope_mean: Option<f64>,
    pub slope_std: Option<f64>,
    pub slope_skewness: Option<f64>,
    pub tri_mean: Option<f64>,
}

/// Minimum number of elevations for a hypsometric integral
pub const MIN_HYPSOMETRY_CELLS: usize = 10;

/// Elevation-relief ratio HI = (mean - min) / (max - min) with its curve.
///
/// `None` with fewer than [`MIN_HYPSOMETRY_CELLS`] values or zero range.
pub fn hypsometric_integral(elevations: &[f64]) -> Option<(f64, HypsometricCurve)> {
    if elevations.len() < MIN_HYPSOMETRY_CELLS {
        return None;
    }
    let mn = elevations.iter().copied().fold(f64::INFINITY, f64::min);
    let mx = elevations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = mx - mn;
    if !(range > 0.0) {
        return None;
    }
    let mu = mean(elevations)?;

    let qs = linspace(0.0, 100.0, 101);
    let thresholds = percentiles(elevations, &qs)?;
    let curve = HypsometricCurve {
        relative_area: linspace(0.0, 1.0, 101).into_iter().map(|f| 1.0 - f).collect(),
        relative_elevation: thresholds.into_iter().map(|t| (t - mn) / range).collect(),
    };
    Some(((mu - mn) / range, curve))
}

/// `None` when the basin has no valid elevation.
pub fn relief_aspects(
    elevations: &[f64],
    slopes: &[f64],
    tri: &[f64],
    areal: &ArealAspects,
) -> Option<ReliefAspects> {
    let elev_min = elevations.iter().copied().reduce(f64::min)?;
    let elev_max = elevations.iter().copied().reduce(f64::max)?;
    let elev_mean = mean(elevations)?;
    let h = elev_max - elev_min;

    let (hi, curve) = match hypsometric_integral(elevations) {
        Some((hi, c)) => (Some(hi), Some(c)),
        None => (None, None),
    };

    Some(ReliefAspects {
        elev_min,
        elev_max,
        elev_mean,
        relief_m: h,
        relief_ratio: ratio(h, areal.basin_length_km * 1000.0),
        relative_relief: ratio(h, areal.perimeter_km),
        ruggedness_number: areal.drainage_density.map(|dd| h * dd / 1000.0),
        melton_ruggedness: ratio(h, areal.area_km2.max(0.0).sqrt()),
        hypsometric_integral: hi,
        hypsometric_curve: curve,
        slope_mean: mean(slopes),
        slope_std: std_dev(slopes),
        slope_skewness: skewness(slopes),
        tri_mean: mean(tri),
    })
}
