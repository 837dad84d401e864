//! # hydromorph core
//!
//! Shared data types and I/O for the hydromorph watershed toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced grid
//! - `GeoTransform`: affine pixel/world mapping
//! - Typed vector layers for subbasins, stream segments and pour points
//! - GeoTIFF, GeoJSON and tabular (CSV) I/O

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{PourPoint, StreamSegment, Subbasin};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{PourPoint, StreamSegment, Subbasin};
}
