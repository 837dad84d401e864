//! Statistical helpers
//!
//! - **descriptive**: moments, percentiles, ranks and rank correlation
//! - **zonal**: subbasin zone rasters and per-zone value collection

pub mod descriptive;
pub mod zonal;

pub use descriptive::{
    kendall_tau_b, mean, median, min_rank, percentile, percentiles, ratio, sample_std_dev, skewness,
    std_dev, Summary,
};
pub use zonal::{rasterize_zones, zonal_values};
