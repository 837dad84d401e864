//! Areal aspects of a subbasin.
//!
//! Lengths are taken in metres (projected CRS) and reported in km.
//! Basin length uses Hack's approximation `Lb = sqrt(A / 1.128)`.

use std::f64::consts::PI;

use crate::statistics::ratio;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArealAspects {
    pub area_km2: f64,
    pub perimeter_km: f64,
    /// Lb (km)
    pub basin_length_km: f64,
    pub stream_length_km: f64,
    pub stream_count: usize,
    /// Dd (km/km²)
    pub drainage_density: Option<f64>,
    /// Fs (streams/km²)
    pub stream_frequency: Option<f64>,
    /// T (streams/km)
    pub texture_ratio: Option<f64>,
    /// Ff
    pub form_factor: Option<f64>,
    /// Re
    pub elongation_ratio: Option<f64>,
    /// Rc
    pub circularity_ratio: Option<f64>,
    /// Cc
    pub compactness: Option<f64>,
    /// Lg (km)
    pub overland_flow_length: Option<f64>,
    /// C (km²/km)
    pub channel_maintenance: Option<f64>,
    /// If = Dd · Fs
    pub infiltration_number: Option<f64>,
    /// Di = Fs / Dd
    pub drainage_intensity: Option<f64>,
}

/// Hack (1957) basin length in the units of `sqrt(area)`
pub fn basin_length(area: f64) -> f64 {
    (area.max(0.0) / 1.128).sqrt()
}

/// # Arguments
/// * `area_m2`, `perimeter_m` - Polygon area and perimeter
/// * `stream_length_m` - Total length of the segments assigned to the basin
/// * `stream_count` - Number of those segments
pub fn areal_aspects(area_m2: f64, perimeter_m: f64, stream_length_m: f64, stream_count: usize) -> ArealAspects {
    let a = area_m2 / 1e6;
    let p = perimeter_m / 1e3;
    let lb = basin_length(area_m2) / 1e3;
    let l = stream_length_m / 1e3;
    let n = stream_count as f64;

    let dd = ratio(l, a);
    let fs = ratio(n, a);
    let dd_pos = dd.filter(|&d| d > 0.0);

    ArealAspects {
        area_km2: a,
        perimeter_km: p,
        basin_length_km: lb,
        stream_length_km: l,
        stream_count,
        drainage_density: dd,
        stream_frequency: fs,
        texture_ratio: ratio(n, p),
        form_factor: ratio(a, lb * lb),
        elongation_ratio: ratio(2.0, lb).map(|k| k * (a / PI).sqrt()),
        circularity_ratio: ratio(4.0 * PI * a, p * p),
        compactness: ratio(p, 2.0 * (PI * a).sqrt()),
        overland_flow_length: dd_pos.and_then(|d| ratio(1.0, 2.0 * d)),
        channel_maintenance: dd_pos.and_then(|d| ratio(1.0, d)),
        infiltration_number: dd.zip(fs).map(|(d, f)| d * f),
        drainage_intensity: fs.zip(dd_pos).and_then(|(f, d)| ratio(f, d)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_square_basin() {
        // 10 km x 10 km, 50 km of streams, 40 segments
        let a = areal_aspects(1e8, 4e4, 5e4, 40);
        assert_relative_eq!(a.area_km2, 100.0);
        assert_relative_eq!(a.perimeter_km, 40.0);
        assert_relative_eq!(a.basin_length_km, (100.0_f64 / 1.128).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(a.drainage_density.unwrap(), 0.5);
        assert_relative_eq!(a.stream_frequency.unwrap(), 0.4);
        assert_relative_eq!(a.texture_ratio.unwrap(), 1.0);
        assert_relative_eq!(a.form_factor.unwrap(), 1.128, epsilon = 1e-12);
        assert_relative_eq!(a.circularity_ratio.unwrap(), PI / 4.0, epsilon = 1e-12);
        assert_relative_eq!(a.compactness.unwrap(), 40.0 / (2.0 * (100.0 * PI).sqrt()), epsilon = 1e-12);
        assert_relative_eq!(a.overland_flow_length.unwrap(), 1.0);
        assert_relative_eq!(a.channel_maintenance.unwrap(), 2.0);
        assert_relative_eq!(a.infiltration_number.unwrap(), 0.2);
        assert_relative_eq!(a.drainage_intensity.unwrap(), 0.8);
    }

    #[test]
    fn test_elongation_of_hack_length() {
        // Re = (2/Lb) sqrt(A/π) with Lb = sqrt(A/1.128) is a constant
        let a = areal_aspects(2.5e7, 2.2e4, 1e4, 5);
        assert_relative_eq!(a.elongation_ratio.unwrap(), 2.0 * (1.128 / PI).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_ratios_missing() {
        let a = areal_aspects(0.0, 0.0, 0.0, 0);
        assert_eq!(a.drainage_density, None);
        assert_eq!(a.stream_frequency, None);
        assert_eq!(a.texture_ratio, None);
        assert_eq!(a.form_factor, None);
        assert_eq!(a.elongation_ratio, None);
        assert_eq!(a.circularity_ratio, None);
        assert_eq!(a.compactness, None);
        assert_eq!(a.overland_flow_length, None);
    }

    #[test]
    fn test_no_streams_leaves_maintenance_missing() {
        let a = areal_aspects(1e6, 4e3, 0.0, 0);
        assert_eq!(a.drainage_density, Some(0.0));
        assert_eq!(a.overland_flow_length, None);
        assert_eq!(a.channel_maintenance, None);
        assert_eq!(a.drainage_intensity, None);
    }
}
