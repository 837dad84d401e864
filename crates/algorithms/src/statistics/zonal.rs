//! Zonal statistics
//!
//! Subbasin polygons are burned into an integer zone raster (zone = basin
//! index + 1, 0 = outside every basin) by testing cell centres, and values
//! are then collected or summarized per zone.

use std::collections::HashMap;

use geo::{BoundingRect, Contains, Coord};
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result, Subbasin};
use ndarray::Array2;

use crate::maybe_rayon::*;

/// Burn subbasins into a zone raster on the grid of `template`.
///
/// A cell belongs to the first subbasin whose polygon contains its centre.
pub fn rasterize_zones(subbasins: &[Subbasin], template: &Raster<f64>) -> Result<Raster<i32>> {
    let (rows, cols) = template.shape();
    let transform = *template.transform();

    // Row/col window of each polygon's envelope
    let windows: Vec<Option<(usize, usize, usize, usize)>> = subbasins
        .iter()
        .map(|sb| {
            let rect = sb.geometry.bounding_rect()?;
            let (c0, r0) = transform.geo_to_pixel(rect.min().x, rect.max().y);
            let (c1, r1) = transform.geo_to_pixel(rect.max().x, rect.min().y);
            let (rmin, rmax) = (r0.min(r1).floor(), r0.max(r1).ceil());
            let (cmin, cmax) = (c0.min(c1).floor(), c0.max(c1).ceil());
            if !(rmin.is_finite() && cmin.is_finite()) || rmax < 0.0 || cmax < 0.0 {
                return None;
            }
            Some((
                rmin.max(0.0) as usize,
                (rmax as usize).min(rows),
                cmin.max(0.0) as usize,
                (cmax as usize).min(cols),
            ))
        })
        .collect();

    let output_data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0i32; cols];
            for (zone, (sb, window)) in subbasins.iter().zip(&windows).enumerate() {
                let Some((r0, r1, c0, c1)) = *window else {
                    continue;
                };
                if row < r0 || row >= r1 {
                    continue;
                }
                for col in c0..c1 {
                    if row_data[col] != 0 {
                        continue;
                    }
                    let (x, y) = transform.pixel_to_geo(col, row);
                    if sb.geometry.contains(&Coord { x, y }) {
                        row_data[col] = zone as i32 + 1;
                    }
                }
            }
            row_data
        })
        .collect();

    let mut zones = template.with_same_meta::<i32>(rows, cols);
    zones.set_nodata(Some(0));
    *zones.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(zones)
}

/// Finite values of `values` grouped by zone; zone 0 is skipped.
pub fn zonal_values(values: &Raster<f64>, zones: &Raster<i32>) -> Result<HashMap<i32, Vec<f64>>> {
    values.ensure_same_grid(zones, "zone raster")?;

    let (rows, cols) = values.shape();
    let mut zone_values: HashMap<i32, Vec<f64>> = HashMap::new();

    for row in 0..rows {
        for col in 0..cols {
            let zone = unsafe { zones.get_unchecked(row, col) };
            let val = unsafe { values.get_unchecked(row, col) };

            if zone == 0 || !val.is_finite() || values.is_nodata(val) {
                continue;
            }

            zone_values.entry(zone).or_default().push(val);
        }
    }

    Ok(zone_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use hydromorph_core::GeoTransform;

    fn grid() -> Raster<f64> {
        let mut r = Raster::new(10, 10);
        r.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for row in 0..10 {
            for col in 0..10 {
                r.set(row, col, (row * 10 + col) as f64).unwrap();
            }
        }
        r
    }

    fn basin(id: &str, x0: f64, x1: f64) -> Subbasin {
        Subbasin {
            id: id.into(),
            geometry: MultiPolygon(vec![polygon![
                (x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 10.0), (x: x0, y: 10.0), (x: x0, y: 0.0)
            ]]),
        }
    }

    #[test]
    fn test_rasterize_two_halves() {
        let dem = grid();
        let zones = rasterize_zones(&[basin("A", 0.0, 5.0), basin("B", 5.0, 10.0)], &dem).unwrap();
        assert_eq!(zones.get(0, 0).unwrap(), 1);
        assert_eq!(zones.get(9, 4).unwrap(), 1);
        assert_eq!(zones.get(0, 5).unwrap(), 2);
        assert_eq!(zones.get(9, 9).unwrap(), 2);
    }

    #[test]
    fn test_cells_outside_are_zero() {
        let dem = grid();
        let zones = rasterize_zones(&[basin("A", 2.0, 4.0)], &dem).unwrap();
        assert_eq!(zones.get(5, 0).unwrap(), 0);
        assert_eq!(zones.get(5, 2).unwrap(), 1);
        assert_eq!(zones.get(5, 3).unwrap(), 1);
        assert_eq!(zones.get(5, 4).unwrap(), 0);
    }

    #[test]
    fn test_zonal_values_per_basin() {
        let dem = grid();
        let zones = rasterize_zones(&[basin("A", 0.0, 5.0), basin("B", 5.0, 10.0)], &dem).unwrap();
        let vals = zonal_values(&dem, &zones).unwrap();
        let a = &vals[&1];
        assert_eq!(a.len(), 50);
        assert_eq!(a.iter().copied().fold(f64::INFINITY, f64::min), 0.0);
        assert_eq!(a.iter().copied().fold(f64::NEG_INFINITY, f64::max), 94.0);
        assert!((a.iter().sum::<f64>() / 50.0 - 47.0).abs() < 1e-10);
        assert_eq!(vals[&2].len(), 50);
    }

    #[test]
    fn test_nan_values_skipped() {
        let mut dem = grid();
        dem.set(0, 0, f64::NAN).unwrap();
        let zones = rasterize_zones(&[basin("A", 0.0, 10.0)], &dem).unwrap();
        let vals = zonal_values(&dem, &zones).unwrap();
        assert_eq!(vals[&1].len(), 99);
    }

    #[test]
    fn test_grid_mismatch() {
        let dem = grid();
        let zones: Raster<i32> = Raster::new(3, 3);
        assert!(zonal_values(&dem, &zones).is_err());
    }
}
