//! Terrain analysis algorithms
//!
//! Rasters derived from the DEM and flow accumulation:
//! - Slope: Horn gradient, valid up to the basin edge
//! - TRI: Terrain Ruggedness Index
//! - TWI / SPI / STI: flow-convergence indices

mod indices;
mod slope;
mod tri;

pub use indices::{spi, sti, twi, FlowIndexParams};
pub use slope::{slope, SlopeParams, SlopeUnits};
pub use tri::tri;
