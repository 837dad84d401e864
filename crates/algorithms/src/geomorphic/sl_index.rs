//! Stream length-gradient (SL) index per segment.
//!
//! The segment is oriented downstream and sampled every cell; the local
//! gradient is the mean of `(z_i - z_{i+k}) / d_i` over the samples, and
//! `SL = gradient * segment length`. Segments are then compared with the
//! others of the same Strahler order through a z-score (the SL anomaly).

use std::collections::HashMap;

use geo::{Coord, LineString};
use hydromorph_core::raster::Raster;
use ndarray::Array2;

use crate::statistics::{mean, sample_std_dev};
use crate::vector::{densify, orient_downstream, sample};

/// Valid (point, elevation) samples along a line, oriented downstream.
pub fn elevation_profile(line: &LineString<f64>, dem: &Raster<f64>) -> Vec<(Coord<f64>, f64)> {
    let oriented = orient_downstream(line, dem);
    densify(&oriented, dem.cell_size())
        .into_iter()
        .filter_map(|c| sample(dem, c).map(|z| (c, z)))
        .collect()
}

/// SL index of one line; `None` with fewer than two valid samples.
///
/// `step` is the sample offset used for gradients, reduced to `n - 1` on
/// short profiles.
pub fn sl_index(line: &LineString<f64>, dem: &Raster<f64>, step: usize) -> Option<f64> {
    let profile = elevation_profile(line, dem);
    let n = profile.len();
    if n < 2 {
        return None;
    }
    let k = step.clamp(1, n - 1);

    let gradients: Vec<f64> = (0..n - k)
        .filter_map(|i| {
            let (p1, z1) = profile[i];
            let (p2, z2) = profile[i + k];
            let dist = (p2.x - p1.x).hypot(p2.y - p1.y);
            (dist > 0.0).then(|| (z1 - z2) / dist)
        })
        .collect();

    let gradient = mean(&gradients)?;
    Some(gradient * crate::vector::length(line))
}

/// z-score of each SL value within its Strahler order (sample std).
///
/// Missing SL values, single-segment orders and zero spread give `None`.
pub fn sl_anomalies(sl: &[Option<f64>], orders: &[u32]) -> Vec<Option<f64>> {
    let mut groups: HashMap<u32, Vec<f64>> = HashMap::new();
    for (v, &o) in sl.iter().zip(orders) {
        if let Some(v) = v {
            groups.entry(o).or_default().push(*v);
        }
    }
    let moments: HashMap<u32, (Option<f64>, Option<f64>)> = groups
        .into_iter()
        .map(|(o, vals)| (o, (mean(&vals), sample_std_dev(&vals))))
        .collect();

    sl.iter()
        .zip(orders)
        .map(|(v, o)| {
            let v = (*v)?;
            let (m, s) = moments.get(o)?;
            let z = (v - (*m)?) / (*s)?;
            z.is_finite().then_some(z)
        })
        .collect()
}

/// Burn per-segment values onto the DEM grid, keeping the maximum per cell.
pub fn burn_segments<'a>(
    template: &Raster<f64>,
    lines: impl IntoIterator<Item = (&'a LineString<f64>, Option<f64>)>,
) -> Raster<f64> {
    let (rows, cols) = template.shape();
    let mut data = Array2::from_elem((rows, cols), f64::NAN);
    let spacing = template.cell_size();

    for (line, value) in lines {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        for c in densify(line, spacing) {
            if let Some((r, col)) = template.cell_at(c.x, c.y) {
                let cell = &mut data[(r, col)];
                if cell.is_nan() || value > *cell {
                    *cell = value;
                }
            }
        }
    }

    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = data;
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use hydromorph_core::GeoTransform;

    /// Elevation falls 1 m per metre eastward
    fn tilted() -> Raster<f64> {
        let mut dem = Raster::new(10, 100);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for r in 0..10 {
            for c in 0..100 {
                dem.set(r, c, 200.0 - c as f64).unwrap();
            }
        }
        dem
    }

    #[test]
    fn test_uniform_gradient() {
        let dem = tilted();
        let line = line_string![(x: 10.5, y: 5.5), (x: 60.5, y: 5.5)];
        let sl = sl_index(&line, &dem, 10).unwrap();
        // gradient 1, length 50
        assert!((sl - 50.0).abs() < 1e-9, "SL = {}", sl);
    }

    #[test]
    fn test_direction_does_not_matter() {
        let dem = tilted();
        let a = line_string![(x: 10.5, y: 5.5), (x: 60.5, y: 5.5)];
        let b = line_string![(x: 60.5, y: 5.5), (x: 10.5, y: 5.5)];
        let sa = sl_index(&a, &dem, 10).unwrap();
        let sb = sl_index(&b, &dem, 10).unwrap();
        assert!((sa - sb).abs() < 1e-9);
        assert!(sa > 0.0);
    }

    #[test]
    fn test_short_profile_uses_smaller_step() {
        let dem = tilted();
        let line = line_string![(x: 10.5, y: 5.5), (x: 13.5, y: 5.5)];
        let sl = sl_index(&line, &dem, 10).unwrap();
        assert!((sl - 3.0).abs() < 1e-9, "SL = {}", sl);
    }

    #[test]
    fn test_outside_dem_is_missing() {
        let dem = tilted();
        let line = line_string![(x: 500.0, y: 5.0), (x: 600.0, y: 5.0)];
        assert!(sl_index(&line, &dem, 10).is_none());
    }

    #[test]
    fn test_anomalies_by_order() {
        let sl = vec![Some(1.0), Some(3.0), Some(10.0), None, Some(7.0)];
        let orders = vec![1, 1, 2, 1, 3];
        let z = sl_anomalies(&sl, &orders);
        let s = 2.0_f64.sqrt();
        assert!((z[0].unwrap() + 1.0 / s).abs() < 1e-12);
        assert!((z[1].unwrap() - 1.0 / s).abs() < 1e-12);
        assert_eq!(z[2], None);
        assert_eq!(z[3], None);
        assert_eq!(z[4], None);
    }

    #[test]
    fn test_burn_keeps_max() {
        let dem = tilted();
        let a = line_string![(x: 0.5, y: 5.5), (x: 20.5, y: 5.5)];
        let b = line_string![(x: 10.5, y: 9.5), (x: 10.5, y: 0.5)];
        let burned = burn_segments(&dem, [(&a, Some(1.0)), (&b, Some(5.0))]);
        assert_eq!(burned.get(4, 10).unwrap(), 5.0);
        assert_eq!(burned.get(4, 2).unwrap(), 1.0);
        assert!(burned.get(0, 50).unwrap().is_nan());
    }
}
