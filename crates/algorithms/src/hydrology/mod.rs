//! Hydrological response of subbasins
//!
//! - **rainfall**: Gumbel EV-I design storms
//! - **curve_number**: slope-proxy CN raster
//! - **runoff**: SCS-CN direct runoff, coefficient and volume
//! - **concentration**: Kirpich, SCS lag and sheet-flow Tc
//! - **peak**: Rational method peak discharge
//! - **outlets**: pour-point snapping onto the channel

mod concentration;
mod curve_number;
mod outlets;
mod peak;
mod rainfall;
mod runoff;

pub use concentration::{kirpich, overland_flow, scs_lag, time_of_concentration, ConcentrationTime};
pub use curve_number::curve_number;
pub use outlets::{basin_outlets, snap_pour_point, SnappedPoint};
pub use peak::{peak_discharges, rainfall_intensity, rational_peak, PeakDischarge};
pub use rainfall::{daily_for, design_rainfall, DesignRainfall, GumbelFit};
pub use runoff::{basin_runoff, potential_retention, runoff_coefficient, scs_runoff, BasinRunoff, StormRunoff};
