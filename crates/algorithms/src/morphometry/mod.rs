//! Morphometric parameters per subbasin
//!
//! - **linear**: Strahler order counts, lengths, Rb, RL
//! - **areal**: Dd, Fs, T, Ff, Re, Rc, Cc, Lg, C, If, Di
//! - **relief**: H, Rh, Rr, Rn, MRN, hypsometry, slope and TRI statistics
//! - **classes**: shape, circularity and hypsometric interpretation

mod areal;
mod classes;
mod linear;
mod relief;

pub use areal::{areal_aspects, basin_length, ArealAspects};
pub use classes::{CircularityClass, HypsometricStage, ShapeClass};
pub use linear::{linear_aspects, LinearAspects, OrderAggregate};
pub use relief::{hypsometric_integral, relief_aspects, HypsometricCurve, ReliefAspects, MIN_HYPSOMETRY_CELLS};
