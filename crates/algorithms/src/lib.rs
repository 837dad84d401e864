//! # Hydromorph Algorithms
//!
//! Watershed calculators built on `hydromorph-core` rasters and layers.
//!
//! ## Available Algorithm Categories
//!
//! - **cellwise**: Per-pixel combination of co-registered rasters
//! - **terrain**: Slope, TRI, TWI/SPI/STI rasters
//! - **morphometry**: Linear, areal and relief aspects per subbasin
//! - **geomorphic**: SL index, sinuosity, tectonic indices (AF, T, Vf, Smf, IAT)
//! - **hydrology**: Gumbel rainfall, SCS-CN runoff, time of concentration, peak discharge
//! - **erosion**: RUSLE factor rasters, soil loss, sediment delivery
//! - **conservation**: Check-dam suitability, water harvesting and recharge
//! - **unit_hydrograph**: Snyder synthetic unit hydrograph
//! - **channel**: Bankfull hydraulic geometry and stability
//! - **prioritization**: Compound-parameter and entropy-weight ranking
//! - **pipeline**: Runs everything for one basin and collects a [`pipeline::BasinReport`]

pub mod cellwise;
pub mod channel;
pub mod config;
pub mod conservation;
pub mod erosion;
pub mod geomorphic;
pub mod hydrology;
pub(crate) mod maybe_rayon;
pub mod morphometry;
pub mod pipeline;
pub mod prioritization;
pub mod report;
pub mod statistics;
pub mod terrain;
pub mod unit_hydrograph;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, SlopeClassTable, SlopeFactor};
    pub use crate::pipeline::{analyze, BasinInputs, BasinReport};
    pub use crate::terrain::{slope, SlopeParams, SlopeUnits};
    pub use hydromorph_core::prelude::*;
}
