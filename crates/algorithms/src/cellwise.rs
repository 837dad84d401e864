//! Per-pixel combination of co-registered rasters.
//!
//! Every derived raster that is a pure function of a few input cells (CN,
//! RUSLE factors, recharge and trench suitability) goes through
//! [`map_cells`]: inputs are checked to share one grid, each input's no-data
//! is read as NaN, and rows are processed in parallel.

use crate::maybe_rayon::*;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result};
use ndarray::Array2;

/// Apply `f` to the stacked values of `inputs` at every cell.
///
/// `f` receives one value per input, in order, with no-data as NaN. The
/// output has the grid of `inputs[0]` and NaN no-data.
pub fn map_cells<const N: usize, F>(inputs: [&Raster<f64>; N], f: F) -> Result<Raster<f64>>
where
    F: Fn([f64; N]) -> f64 + Sync + Send,
{
    let Some(first) = inputs.first() else {
        return Err(Error::Algorithm("map_cells needs at least one raster".into()));
    };
    for other in &inputs[1..] {
        first.ensure_same_grid(*other, "input raster")?;
    }
    let (rows, cols) = first.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let values = inputs.map(|r| {
                    let v = unsafe { r.get_unchecked(row, col) };
                    if r.is_nodata(v) {
                        f64::NAN
                    } else {
                        v
                    }
                });
                *out = f(values);
            }
            row_data
        })
        .collect();

    let mut output = first.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Finite (min, max) of a raster, `None` when it has no valid cell.
pub fn value_range(raster: &Raster<f64>) -> Option<(f64, f64)> {
    raster
        .valid_values()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromorph_core::GeoTransform;

    #[test]
    fn test_map_two_rasters() {
        let a = Raster::filled(3, 4, 2.0);
        let mut b = Raster::filled(3, 4, 5.0);
        b.set_nodata(Some(-9999.0));
        b.set(1, 1, -9999.0).unwrap();
        let out = map_cells([&a, &b], |[x, y]| x * y).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 10.0);
        assert!(out.get(1, 1).unwrap().is_nan());
        assert_eq!(out.shape(), (3, 4));
    }

    #[test]
    fn test_grid_mismatch() {
        let a = Raster::filled(3, 4, 1.0);
        let b = Raster::filled(4, 4, 1.0);
        assert!(map_cells([&a, &b], |[x, y]| x + y).is_err());

        let mut c = Raster::filled(3, 4, 1.0);
        c.set_transform(GeoTransform::new(100.0, 0.0, 1.0, -1.0));
        assert!(map_cells([&a, &c], |[x, y]| x + y).is_err());
    }

    #[test]
    fn test_value_range() {
        let mut r = Raster::from_vec(vec![3.0, f64::NAN, -1.0, 8.0], 2, 2).unwrap();
        assert_eq!(value_range(&r), Some((-1.0, 8.0)));
        r.data_mut().fill(f64::NAN);
        assert_eq!(value_range(&r), None);
    }
}
