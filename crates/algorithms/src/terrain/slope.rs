//! Slope calculation from DEMs
//!
//! Calculates the rate of change of elevation using the Horn (1981) method,
//! which uses a 3x3 neighborhood to compute partial derivatives.
//!
//! Basins are usually clipped DEMs surrounded by no-data, so a neighbour that
//! falls outside the grid or on no-data takes the centre elevation instead of
//! voiding the cell. Every valid DEM cell therefore gets a slope.

use crate::maybe_rayon::*;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result};
use ndarray::Array2;

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Percent (0-infinity, typically 0-100+)
    Percent,
    /// Radians (0-π/2)
    Radians,
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    /// Output units
    pub units: SlopeUnits,
    /// Z-factor for unit conversion (default 1.0)
    pub z_factor: f64,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
        }
    }
}

/// Calculate slope from a DEM
///
/// Uses Horn's (1981) method with a 3x3 neighborhood:
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
///
/// dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * cellsize)
/// dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * cellsize)
/// slope = atan(sqrt(dz/dx² + dz/dy²))
///
/// # Returns
/// Raster with slope values in the specified units, NaN on no-data
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { width: cols, height: rows });
    }
    let cell_size = dem.cell_size();
    let eight_cell_size = 8.0 * cell_size;
    let z = params.z_factor;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let e = unsafe { dem.get_unchecked(row, col) };
                if dem.is_nodata(e) {
                    continue;
                }

                let at = |dr: isize, dc: isize| -> f64 {
                    let r = row as isize + dr;
                    let c = col as isize + dc;
                    if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                        return e;
                    }
                    let v = unsafe { dem.get_unchecked(r as usize, c as usize) };
                    if dem.is_nodata(v) {
                        e
                    } else {
                        v
                    }
                };

                let (a, b, c) = (at(-1, -1), at(-1, 0), at(-1, 1));
                let (d, f) = (at(0, -1), at(0, 1));
                let (g, h, i) = (at(1, -1), at(1, 0), at(1, 1));

                let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) * z / eight_cell_size;
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) * z / eight_cell_size;

                let slope_rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();

                *out = match params.units {
                    SlopeUnits::Degrees => slope_rad.to_degrees(),
                    SlopeUnits::Percent => slope_rad.tan() * 100.0,
                    SlopeUnits::Radians => slope_rad,
                };
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromorph_core::GeoTransform;

    fn ramp(rows: usize, cols: usize, dzdx: f64) -> Raster<f64> {
        let mut dem = Raster::new(rows, cols);
        dem.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
        for r in 0..rows {
            for c in 0..cols {
                dem.set(r, c, c as f64 * 10.0 * dzdx).unwrap();
            }
        }
        dem
    }

    #[test]
    fn test_slope_flat() {
        let mut dem = Raster::filled(10, 10, 100.0);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        let result = slope(&dem, SlopeParams::default()).unwrap();
        for r in 0..10 {
            for c in 0..10 {
                assert!(result.get(r, c).unwrap().abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_slope_45_degrees_interior() {
        let dem = ramp(8, 8, 1.0);
        let result = slope(&dem, SlopeParams::default()).unwrap();
        let v = result.get(4, 4).unwrap();
        assert!((v - 45.0).abs() < 1e-9, "Expected 45°, got {}", v);
    }

    #[test]
    fn test_edges_are_valid() {
        let dem = ramp(6, 6, 1.0);
        let result = slope(&dem, SlopeParams::default()).unwrap();
        for r in 0..6 {
            for c in 0..6 {
                assert!(result.get(r, c).unwrap().is_finite(), "({}, {}) should be finite", r, c);
            }
        }
        // Left column sees its own value on the west side: half the gradient
        let v = result.get(3, 0).unwrap();
        assert!((v - 0.5_f64.atan().to_degrees()).abs() < 1e-9, "got {}", v);
    }

    #[test]
    fn test_nodata_stays_nan() {
        let mut dem = ramp(5, 5, 0.5);
        dem.set(2, 2, f64::NAN).unwrap();
        let result = slope(&dem, SlopeParams::default()).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert!(result.get(2, 3).unwrap().is_finite());
    }

    #[test]
    fn test_percent_units() {
        let dem = ramp(5, 5, 0.1);
        let params = SlopeParams {
            units: SlopeUnits::Percent,
            ..Default::default()
        };
        let v = slope(&dem, params).unwrap().get(2, 2).unwrap();
        assert!((v - 10.0).abs() < 1e-9, "Expected 10%, got {}", v);
    }
}
