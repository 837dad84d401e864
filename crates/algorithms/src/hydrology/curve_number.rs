//! Curve number raster from a slope proxy.

use hydromorph_core::raster::Raster;
use hydromorph_core::Result;

use crate::cellwise::map_cells;
use crate::config::SlopeFactor;

/// CN per cell from slope (degrees) through `table`.
///
/// Missing slope counts as flat; cells outside the DEM stay NaN.
pub fn curve_number(dem: &Raster<f64>, slope_deg: &Raster<f64>, table: &(impl SlopeFactor + Sync)) -> Result<Raster<f64>> {
    map_cells([dem, slope_deg], |[z, s]| {
        if z.is_nan() {
            return f64::NAN;
        }
        table.value(if s.is_nan() { 0.0 } else { s })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunoffParams;

    #[test]
    fn test_slope_proxy() {
        let dem = Raster::from_vec(vec![100.0, 101.0, f64::NAN, 103.0, 104.0, 105.0], 2, 3).unwrap();
        let slope = Raster::from_vec(vec![1.0, 5.0, 10.0, 25.0, f64::NAN, 19.99], 2, 3).unwrap();
        let cn = curve_number(&dem, &slope, &RunoffParams::default().curve_number).unwrap();
        assert_eq!(cn.get(0, 0).unwrap(), 85.0);
        assert_eq!(cn.get(0, 1).unwrap(), 79.0);
        assert!(cn.get(0, 2).unwrap().is_nan());
        assert_eq!(cn.get(1, 0).unwrap(), 70.0);
        assert_eq!(cn.get(1, 1).unwrap(), 85.0);
        assert_eq!(cn.get(1, 2).unwrap(), 75.0);
    }

    #[test]
    fn test_custom_strategy() {
        let dem = Raster::filled(2, 2, 10.0);
        let slope = Raster::filled(2, 2, 4.0);
        let cn = curve_number(&dem, &slope, &|s: f64| 60.0 + s).unwrap();
        assert_eq!(cn.get(1, 1).unwrap(), 64.0);
    }
}
