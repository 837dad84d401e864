//! Vector helpers
//!
//! - Area / perimeter / centroid of subbasin polygons
//! - Interpolation and raster sampling along stream lines
//! - Stream-to-subbasin assignment

mod assignment;
mod measurements;
mod sampling;

pub use assignment::{assign_segments, Assignment};
pub use measurements::{area, bounds, centroid, length, line_centroid, main_exterior, perimeter};
pub use sampling::{densify, interpolate, interpolate_normalized, linspace, mean_at, orient_downstream, sample};
