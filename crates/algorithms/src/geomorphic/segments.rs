//! Per-segment geomorphic indices and their subbasin aggregates.

use geo::LineString;
use hydromorph_core::raster::Raster;
use hydromorph_core::StreamSegment;

use crate::config::IndexParams;
use crate::statistics::{mean, Summary};
use crate::vector::{densify, sample};

use super::sinuosity::{sinuosity, SinuosityClass};
use super::sl_index::{sl_anomalies, sl_index};

/// Indices of one stream segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentIndices {
    pub id: usize,
    pub order: u32,
    /// Index of the subbasin the segment belongs to
    pub basin: Option<usize>,
    pub length_m: f64,
    pub sl: Option<f64>,
    /// z-score of SL within the segment's order
    pub sl_anomaly: Option<f64>,
    pub sinuosity: Option<f64>,
    pub spi: Option<f64>,
    pub sti: Option<f64>,
}

/// Mean flow accumulation and slope along `line`, sampled every cell.
///
/// Only points where both rasters are valid count.
fn flow_means(line: &LineString<f64>, flow_acc: &Raster<f64>, slope_deg: &Raster<f64>) -> Option<(f64, f64)> {
    let (fa, sl): (Vec<f64>, Vec<f64>) = densify(line, flow_acc.cell_size())
        .into_iter()
        .filter_map(|c| Some((sample(flow_acc, c)?, sample(slope_deg, c)?)))
        .unzip();
    Some((mean(&fa)?, mean(&sl)?))
}

/// Segment SPI and STI from mean accumulation and mean slope along the line.
///
/// `SPI = FA·res²·tan β`, `STI = FA·res·sin β`, with both trigonometric
/// terms floored at `min_gradient`.
pub fn segment_flow_indices(
    line: &LineString<f64>,
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    min_gradient: f64,
) -> Option<(f64, f64)> {
    let (fa, slope) = flow_means(line, flow_acc, slope_deg)?;
    let res = flow_acc.cell_size();
    let beta = slope.to_radians();
    let spi = fa * res * res * beta.tan().max(min_gradient);
    let sti = fa * res * beta.sin().max(min_gradient);
    Some((spi, sti))
}

/// Compute SL, SL anomaly, sinuosity, SPI and STI for every segment.
pub fn segment_indices(
    segments: &[StreamSegment],
    basin_of: &[Option<usize>],
    dem: &Raster<f64>,
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    params: &IndexParams,
) -> Vec<SegmentIndices> {
    let res = dem.cell_size();
    let sl: Vec<Option<f64>> = segments
        .iter()
        .map(|s| sl_index(&s.geometry, dem, params.sl_gradient_step))
        .collect();
    let orders: Vec<u32> = segments.iter().map(|s| s.order).collect();
    let anomalies = sl_anomalies(&sl, &orders);

    segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let flow = segment_flow_indices(&s.geometry, flow_acc, slope_deg, params.segment_min_gradient);
            SegmentIndices {
                id: s.id,
                order: s.order,
                basin: basin_of.get(i).copied().flatten(),
                length_m: s.length(),
                sl: sl[i],
                sl_anomaly: anomalies[i],
                sinuosity: sinuosity(s, res),
                spi: flow.map(|f| f.0),
                sti: flow.map(|f| f.1),
            }
        })
        .collect()
}

/// Channel indices of one subbasin, aggregated over its segments.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub sinuosity: Summary,
    pub sinuosity_class: SinuosityClass,
    pub spi: Summary,
    pub sti: Summary,
    pub sl_anomaly: Summary,
}

impl ChannelSummary {
    pub fn of<'a>(segments: impl IntoIterator<Item = &'a SegmentIndices>) -> Self {
        let segs: Vec<&SegmentIndices> = segments.into_iter().collect();
        let pick = |f: fn(&SegmentIndices) -> Option<f64>| Summary::of(segs.iter().filter_map(|s| f(s)));
        let si = pick(|s| s.sinuosity);
        Self {
            sinuosity_class: SinuosityClass::from_sinuosity(si.mean),
            sinuosity: si,
            spi: pick(|s| s.spi),
            sti: pick(|s| s.sti),
            sl_anomaly: pick(|s| s.sl_anomaly),
        }
    }
}
