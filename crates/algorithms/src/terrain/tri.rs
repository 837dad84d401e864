//! Terrain Ruggedness Index (TRI)
//!
//! Riley et al. (1999):
//!   TRI = sqrt( sum( (z_neighbor - z_center)² ) )
//!
//! over the eight neighbours of a 3x3 window. Out-of-grid neighbours are
//! mirrored from the edge row/column (which for a 3x3 window is the edge cell
//! itself); no-data neighbours contribute nothing.
//!
//! Reference: Riley, S.J., DeGloria, S.D., Elliot, R. (1999)

use crate::maybe_rayon::*;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result};
use ndarray::Array2;

/// Calculate Terrain Ruggedness Index
///
/// # Returns
/// Raster with TRI values (same units as input elevation), NaN on no-data
pub fn tri(dem: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let center = unsafe { dem.get_unchecked(row, col) };
                if dem.is_nodata(center) {
                    continue;
                }

                let mut sum_sq = 0.0;
                for dr in -1isize..=1 {
                    for dc in -1isize..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let nr = (row as isize + dr).clamp(0, rows as isize - 1) as usize;
                        let nc = (col as isize + dc).clamp(0, cols as isize - 1) as usize;
                        let nv = unsafe { dem.get_unchecked(nr, nc) };
                        if !dem.is_nodata(nv) {
                            let diff = nv - center;
                            sum_sq += diff * diff;
                        }
                    }
                }

                *out = sum_sq.sqrt();
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), output_data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromorph_core::GeoTransform;

    #[test]
    fn test_tri_flat_surface() {
        let mut dem = Raster::filled(10, 10, 100.0);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        let result = tri(&dem).unwrap();
        let val = result.get(5, 5).unwrap();
        assert!(val.abs() < 1e-10, "Expected TRI=0 for flat surface, got {}", val);
    }

    #[test]
    fn test_tri_checkerboard() {
        let mut dem = Raster::new(10, 10);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for r in 0..10 {
            for c in 0..10 {
                dem.set(r, c, if (r + c) % 2 == 0 { 100.0 } else { 0.0 }).unwrap();
            }
        }

        let result = tri(&dem).unwrap();
        let val = result.get(5, 5).unwrap();
        // 4 orthogonal neighbours differ by 100, diagonals by 0
        let expected = 40000.0_f64.sqrt();
        assert!((val - expected).abs() < 1e-6, "Expected TRI≈{:.2}, got {}", expected, val);
    }

    #[test]
    fn test_tri_corner_uses_mirrored_edge() {
        let mut dem = Raster::filled(3, 3, 0.0);
        dem.set(0, 1, 10.0).unwrap();
        let result = tri(&dem).unwrap();
        // Corner (0,0): neighbours (-1,0)->(0,0), (-1,1)->(0,1), (0,1), (1,1) ...
        // (0,1) appears as (-1,1) mirrored and as (0,1) itself: 2 * 100
        let val = result.get(0, 0).unwrap();
        assert!((val - 200.0_f64.sqrt()).abs() < 1e-9, "got {}", val);
    }

    #[test]
    fn test_tri_nodata_center() {
        let mut dem = Raster::filled(5, 5, 1.0);
        dem.set(2, 2, f64::NAN).unwrap();
        let result = tri(&dem).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert!(result.get(2, 1).unwrap().is_finite());
    }
}
