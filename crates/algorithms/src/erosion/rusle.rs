//! RUSLE factor rasters and annual soil loss `A = R·K·LS·C·P`.
//!
//! Without land-use or soil maps, K, C and P are slope-class proxies
//! ([`SlopeFactor`]); R varies around a basin mean with standardized
//! elevation; LS follows Moore & Burch from flow accumulation:
//!
//! ```text
//! LS = (As / 22.13)^m · (sin β / 0.0896)^n,   As = max(FA, 1) · res
//! ```

use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result};

use crate::cellwise::map_cells;
use crate::config::{RusleParams, SlopeFactor};

/// The five factor rasters and the soil loss raster (t/ha/yr).
#[derive(Debug, Clone)]
pub struct RusleFactors {
    pub r: Raster<f64>,
    pub k: Raster<f64>,
    pub ls: Raster<f64>,
    pub c: Raster<f64>,
    pub p: Raster<f64>,
    pub soil_loss: Raster<f64>,
}

/// Rainfall erosivity R, higher on high ground, clamped to `[r_min, r_max]`.
pub fn erosivity(dem: &Raster<f64>, params: &RusleParams) -> Result<Raster<f64>> {
    let stats = dem.statistics();
    let (Some(mean), Some(std)) = (stats.mean, stats.std_dev) else {
        return Err(Error::Algorithm("DEM has no valid cells".into()));
    };
    map_cells([dem], |[z]| {
        if z.is_nan() {
            return f64::NAN;
        }
        let r = params.r_base * (1.0 + params.r_elevation_coeff * (z - mean) / (std + 1e-6));
        r.clamp(params.r_min, params.r_max)
    })
}

/// Slope-class factor raster (K, C or P); missing slope counts as flat.
pub fn slope_class_factor(
    dem: &Raster<f64>,
    slope_deg: &Raster<f64>,
    factor: &(impl SlopeFactor + Sync),
) -> Result<Raster<f64>> {
    map_cells([dem, slope_deg], |[z, s]| {
        if z.is_nan() {
            f64::NAN
        } else {
            factor.value(if s.is_nan() { 0.0 } else { s })
        }
    })
}

/// Topographic factor LS, clamped to `[0, ls_max]`.
pub fn ls_factor(
    dem: &Raster<f64>,
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    params: &RusleParams,
) -> Result<Raster<f64>> {
    let res = dem.cell_size();
    map_cells([dem, flow_acc, slope_deg], |[z, fa, s]| {
        if z.is_nan() {
            return f64::NAN;
        }
        let cells = if fa.is_nan() { 0.0 } else { fa.max(1.0) };
        let specific_area = cells * res;
        let beta = (if s.is_nan() { params.min_slope_deg } else { s })
            .max(params.min_slope_deg)
            .to_radians();
        let ls = (specific_area / 22.13).powf(params.ls_length_exponent)
            * (beta.sin() / 0.0896).powf(params.ls_slope_exponent);
        ls.clamp(0.0, params.ls_max)
    })
}

/// `A = R·K·LS·C·P`, clamped to `[0, cap]` only when a cap is given.
pub fn soil_loss(
    r: &Raster<f64>,
    k: &Raster<f64>,
    ls: &Raster<f64>,
    c: &Raster<f64>,
    p: &Raster<f64>,
    cap: Option<f64>,
) -> Result<Raster<f64>> {
    map_cells([r, k, ls, c, p], |[r, k, ls, c, p]| {
        let a = r * k * ls * c * p;
        match cap {
            Some(max) if a.is_finite() => a.clamp(0.0, max),
            _ => a,
        }
    })
}

/// Build every factor raster and the soil loss raster.
pub fn rusle(
    dem: &Raster<f64>,
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    params: &RusleParams,
) -> Result<RusleFactors> {
    let r = erosivity(dem, params)?;
    let k = slope_class_factor(dem, slope_deg, &params.k_factor)?;
    let ls = ls_factor(dem, flow_acc, slope_deg, params)?;
    let c = slope_class_factor(dem, slope_deg, &params.c_factor)?;
    let p = slope_class_factor(dem, slope_deg, &params.p_factor)?;
    let soil_loss = soil_loss(&r, &k, &ls, &c, &p, params.max_soil_loss)?;
    Ok(RusleFactors { r, k, ls, c, p, soil_loss })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(rows: usize, cols: usize) -> Raster<f64> {
        let data = (0..rows * cols).map(|i| 100.0 + i as f64).collect();
        Raster::from_vec(data, rows, cols).unwrap()
    }

    #[test]
    fn test_erosivity_centred_and_clamped() {
        let dem = Raster::from_vec(vec![100.0, 200.0, 300.0, f64::NAN], 2, 2).unwrap();
        let params = RusleParams::default();
        let r = erosivity(&dem, &params).unwrap();
        assert_relative_eq!(r.get(0, 1).unwrap(), 650.0, epsilon = 1e-9);
        assert!(r.get(0, 0).unwrap() < 650.0);
        assert!(r.get(1, 1).unwrap().is_nan());

        let steep = RusleParams {
            r_elevation_coeff: 10.0,
            ..RusleParams::default()
        };
        let r = erosivity(&dem, &steep).unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 400.0);
        assert_eq!(r.get(1, 0).unwrap(), 1000.0);
    }

    #[test]
    fn test_erosivity_needs_valid_cells() {
        let dem = Raster::filled(2, 2, f64::NAN);
        assert!(erosivity(&dem, &RusleParams::default()).is_err());
    }

    #[test]
    fn test_gentle_cell_low_loss() {
        // R 650, K 0.25, C 0.2, P 1 at 0.1 degrees with As = 30
        let dem = Raster::filled(1, 1, 100.0);
        let fa = Raster::filled(1, 1, 1.0);
        let slope = Raster::filled(1, 1, 0.1);
        let params = RusleParams::default();
        let ls = ls_factor(&dem, &fa, &slope, &params).unwrap().get(0, 0).unwrap();
        let expected = (1.0f64 / 22.13).powf(0.6) * (0.1f64.to_radians().sin() / 0.0896).powf(1.3);
        assert_relative_eq!(ls, expected, epsilon = 1e-12);

        let as_30 = (30.0f64 / 22.13).powf(0.6) * (0.1f64.to_radians().sin() / 0.0896).powf(1.3);
        assert!(650.0 * 0.25 * as_30 * 0.2 * 1.0 < 5.0);
    }

    #[test]
    fn test_ls_clamped_and_floored() {
        let dem = Raster::filled(1, 3, 100.0);
        let fa = Raster::from_vec(vec![1e9, f64::NAN, 10.0], 1, 3).unwrap();
        let slope = Raster::from_vec(vec![60.0, 10.0, f64::NAN], 1, 3).unwrap();
        let ls = ls_factor(&dem, &fa, &slope, &RusleParams::default()).unwrap();
        assert_eq!(ls.get(0, 0).unwrap(), 50.0);
        assert_eq!(ls.get(0, 1).unwrap(), 0.0);
        assert!(ls.get(0, 2).unwrap() > 0.0);
    }

    #[test]
    fn test_soil_loss_is_exact_product() {
        let dem = ramp(4, 5);
        let fa = Raster::from_vec((0..20).map(|i| (i * 7) as f64).collect(), 4, 5).unwrap();
        let slope = Raster::from_vec((0..20).map(|i| i as f64 * 2.0).collect(), 4, 5).unwrap();
        let f = rusle(&dem, &fa, &slope, &RusleParams::default()).unwrap();
        for row in 0..4 {
            for col in 0..5 {
                let a = f.soil_loss.get(row, col).unwrap();
                let product = f.r.get(row, col).unwrap()
                    * f.k.get(row, col).unwrap()
                    * f.ls.get(row, col).unwrap()
                    * f.c.get(row, col).unwrap()
                    * f.p.get(row, col).unwrap();
                assert_eq!(a, product);
            }
        }
    }

    #[test]
    fn test_optional_cap() {
        let one = Raster::filled(1, 1, 1.0);
        let big = Raster::filled(1, 1, 1000.0);
        let a = soil_loss(&big, &one, &one, &one, &one, Some(500.0)).unwrap();
        assert_eq!(a.get(0, 0).unwrap(), 500.0);
        let a = soil_loss(&big, &one, &one, &one, &one, None).unwrap();
        assert_eq!(a.get(0, 0).unwrap(), 1000.0);
    }
}
