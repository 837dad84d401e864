//! Soil erosion (RUSLE) and sediment delivery
//!
//! - **rusle**: R, K, LS, C, P factor rasters and soil loss A
//! - **sediment**: per-subbasin loss statistics, severity bands, SDR and yield

mod rusle;
mod sediment;

pub use rusle::{erosivity, ls_factor, rusle, slope_class_factor, soil_loss, RusleFactors};
pub use sediment::{sediment_budget, sediment_delivery_ratio, SedimentBudget, SeverityBands};
