//! Geomorphic and tectonic indices
//!
//! - **sl_index**: stream length-gradient index and per-order anomalies
//! - **sinuosity**: channel sinuosity SI
//! - **segments**: per-segment SL, SI, SPI, STI and subbasin aggregates
//! - **tectonic**: AF, T, Vf, Smf and the composite IAT

mod segments;
mod sinuosity;
mod sl_index;
mod tectonic;

pub use segments::{segment_flow_indices, segment_indices, ChannelSummary, SegmentIndices};
pub use sinuosity::{sinuosity, SinuosityClass};
pub use sl_index::{burn_segments, elevation_profile, sl_anomalies, sl_index};
pub use tectonic::{
    af_score, asymmetry_factor, mountain_front_sinuosity, smf_score, t_score, tectonic_indices,
    transverse_symmetry, valley_floor_ratio, vf_score, ActivityClass, Asymmetry, AsymmetryClass,
    FrontClass, TectonicIndices, TransverseClass, TransverseSymmetry, ValleyClass,
};
