//! Flow-convergence indices from flow accumulation and slope
//!
//! With `a = flow_acc * cell_size` (specific catchment area, m²/m) and β the
//! local slope:
//!
//! - TWI = ln(a / tan β)
//! - SPI = a · tan β
//! - STI = a · sin β
//!
//! tan β and sin β are floored at the value of `min_slope_deg` so flats stay
//! finite. TWI is undefined (NaN) where flow accumulation is 0.

use crate::maybe_rayon::*;
use hydromorph_core::raster::Raster;
use hydromorph_core::{Error, Result};
use ndarray::Array2;

/// Parameters shared by TWI, SPI and STI
#[derive(Debug, Clone)]
pub struct FlowIndexParams {
    /// Slope floor in degrees
    pub min_slope_deg: f64,
}

impl Default for FlowIndexParams {
    fn default() -> Self {
        Self { min_slope_deg: 0.01 }
    }
}

fn combine<F>(flow_acc: &Raster<f64>, slope_deg: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    flow_acc.ensure_same_grid(slope_deg, "slope raster")?;
    let (rows, cols) = flow_acc.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let acc = unsafe { flow_acc.get_unchecked(row, col) };
                let slp = unsafe { slope_deg.get_unchecked(row, col) };

                if flow_acc.is_nodata(acc) || slope_deg.is_nodata(slp) {
                    continue;
                }
                *out = f(acc, slp);
            }
            row_data
        })
        .collect();

    let mut output = flow_acc.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

/// Compute the Topographic Wetness Index
///
/// # Arguments
/// * `flow_acc` - Flow accumulation (cell counts)
/// * `slope_deg` - Slope in degrees
pub fn twi(flow_acc: &Raster<f64>, slope_deg: &Raster<f64>, params: &FlowIndexParams) -> Result<Raster<f64>> {
    let cell_size = flow_acc.cell_size();
    let min_tan = params.min_slope_deg.to_radians().tan();
    combine(flow_acc, slope_deg, move |acc, slp| {
        if acc <= 0.0 {
            return f64::NAN;
        }
        let tan_b = slp.to_radians().tan().max(min_tan);
        (acc * cell_size / tan_b).ln()
    })
}

/// Compute the Stream Power Index
pub fn spi(flow_acc: &Raster<f64>, slope_deg: &Raster<f64>, params: &FlowIndexParams) -> Result<Raster<f64>> {
    let cell_size = flow_acc.cell_size();
    let min_tan = params.min_slope_deg.to_radians().tan();
    combine(flow_acc, slope_deg, move |acc, slp| {
        acc.max(0.0) * cell_size * slp.to_radians().tan().max(min_tan)
    })
}

/// Compute the Sediment Transport Index (simplified a · sin β form)
pub fn sti(flow_acc: &Raster<f64>, slope_deg: &Raster<f64>, params: &FlowIndexParams) -> Result<Raster<f64>> {
    let cell_size = flow_acc.cell_size();
    let min_sin = params.min_slope_deg.to_radians().sin();
    combine(flow_acc, slope_deg, move |acc, slp| {
        acc.max(0.0) * cell_size * slp.to_radians().sin().max(min_sin)
    })
}
