//! Check-dam suitability index (CDSI) per stream segment.
//!
//! Five factor scores on a 0-10 scale are combined with [`CdsiWeights`]:
//! stream order, upstream catchment area, channel slope, upstream soil loss
//! and the valley floor ratio of the segment's subbasin.

use std::fmt;

use geo::Coord;
use hydromorph_core::raster::Raster;
use hydromorph_core::StreamSegment;

use crate::config::{CdsiWeights, ConservationParams};
use crate::statistics::mean;
use crate::vector::{interpolate_normalized, linspace, mean_at, sample};

/// Slope assumed for segments with no valid slope sample (degrees)
const DEFAULT_SEGMENT_SLOPE_DEG: f64 = 5.0;

/// Headwater channels score highest: 10, 7.5, 5, 2.5, 0...
pub fn order_score(order: u32) -> f64 {
    (10.0 - (f64::from(order) - 1.0) * 2.5).clamp(0.0, 10.0)
}

/// Upstream catchment area score; `None` scores 4.
pub fn area_score(area_km2: Option<f64>) -> f64 {
    match area_km2 {
        Some(a) if (0.1..=0.5).contains(&a) => 6.0,
        Some(a) if a > 0.5 && a <= 5.0 => 10.0,
        Some(a) if a > 5.0 && a <= 15.0 => 7.0,
        Some(a) if a > 15.0 => 3.0,
        _ => 4.0,
    }
}

/// Channel slope score, best between 1 and 5 %.
pub fn slope_score(slope_pct: f64) -> f64 {
    match slope_pct {
        s if s < 0.5 => 3.0,
        s if s < 1.0 => 6.0,
        s if s < 5.0 => 10.0,
        s if s < 10.0 => 7.0,
        s if s < 20.0 => 4.0,
        _ => 2.0,
    }
}

/// Valley floor ratio score, best for narrow valleys; `None` scores 5.
pub fn valley_score(vf: Option<f64>) -> f64 {
    match vf {
        None => 5.0,
        Some(v) if v < 0.3 => 6.0,
        Some(v) if v < 1.5 => 10.0,
        Some(v) if v < 3.0 => 7.0,
        Some(v) if v < 6.0 => 4.0,
        Some(_) => 2.0,
    }
}

/// Upstream soil loss relative to the basin's p95; unknown loss counts as
/// half the p95.
pub fn erosion_score(upstream_loss: Option<f64>, loss_p95: f64) -> f64 {
    let a = upstream_loss.unwrap_or(loss_p95 / 2.0);
    (a / (loss_p95 + 1e-6) * 10.0).clamp(0.0, 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitabilityClass {
    VerySuitable,
    Suitable,
    ModeratelySuitable,
    PoorlySuitable,
}

impl SuitabilityClass {
    pub fn from_cdsi(cdsi: f64) -> Self {
        match cdsi {
            v if v >= 7.5 => Self::VerySuitable,
            v if v >= 5.5 => Self::Suitable,
            v if v >= 3.5 => Self::ModeratelySuitable,
            _ => Self::PoorlySuitable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VerySuitable => "Very Suitable",
            Self::Suitable => "Suitable",
            Self::ModeratelySuitable => "Moderately Suitable",
            Self::PoorlySuitable => "Poorly Suitable",
        }
    }

    /// Very Suitable and Suitable reaches are candidate dam sites.
    pub fn is_candidate(&self) -> bool {
        matches!(self, Self::VerySuitable | Self::Suitable)
    }
}

impl fmt::Display for SuitabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScores {
    pub order: f64,
    pub area: f64,
    pub slope: f64,
    pub erosion: f64,
    pub valley: f64,
}

impl FactorScores {
    /// Weighted sum clamped to [0, 10].
    pub fn weighted(&self, w: &CdsiWeights) -> f64 {
        (w.order * self.order + w.area * self.area + w.slope * self.slope + w.erosion * self.erosion + w.valley * self.valley)
            .clamp(0.0, 10.0)
    }
}

/// Check-dam assessment of one stream segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckDamSite {
    pub segment_id: usize,
    pub order: u32,
    pub basin: Option<usize>,
    pub length_m: f64,
    pub upstream_area_km2: Option<f64>,
    pub slope_deg: Option<f64>,
    pub slope_pct: f64,
    /// Mean positive soil loss around the segment start (t/ha/yr)
    pub upstream_loss: Option<f64>,
    pub scores: FactorScores,
    pub cdsi: f64,
    pub class: SuitabilityClass,
}

/// Mean of the positive raster cells whose centres lie within `radius` of `center`.
pub fn mean_positive_within(raster: &Raster<f64>, center: Coord<f64>, radius: f64) -> Option<f64> {
    let (rows, cols) = raster.shape();
    let res = raster.cell_size();
    if rows == 0 || cols == 0 || !(res > 0.0) {
        return None;
    }
    let (c, r) = raster.geo_to_pixel(center.x, center.y);
    let span = (radius / res).ceil() + 1.0;
    let clamp_idx = |v: f64, n: usize| v.max(0.0).min((n - 1) as f64) as usize;
    let (r0, r1) = (clamp_idx(r - span, rows), clamp_idx(r + span, rows));
    let (c0, c1) = (clamp_idx(c - span, cols), clamp_idx(c + span, cols));

    let mut vals = Vec::new();
    for row in r0..=r1 {
        for col in c0..=c1 {
            let (x, y) = raster.pixel_to_geo(col, row);
            if (x - center.x).hypot(y - center.y) > radius {
                continue;
            }
            let v = unsafe { raster.get_unchecked(row, col) };
            if !raster.is_nodata(v) && v > 0.0 {
                vals.push(v);
            }
        }
    }
    mean(&vals)
}

/// Score every segment.
///
/// `basin_vf[i]` is the valley floor ratio of subbasin `i`; `loss_p95` the
/// 95th percentile of soil loss over the study area.
#[allow(clippy::too_many_arguments)]
pub fn check_dam_suitability(
    segments: &[StreamSegment],
    basin_of: &[Option<usize>],
    basin_vf: &[Option<f64>],
    flow_acc: &Raster<f64>,
    slope_deg: &Raster<f64>,
    soil_loss: &Raster<f64>,
    loss_p95: f64,
    params: &ConservationParams,
) -> Vec<CheckDamSite> {
    let res = flow_acc.cell_size();
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let basin = basin_of.get(i).copied().flatten();
            let upstream_area_km2 = interpolate_normalized(&seg.geometry, 0.5)
                .and_then(|mid| sample(flow_acc, mid))
                .map(|fa| (fa * res * res / 1e6).max(0.0));

            let points: Vec<Coord<f64>> = linspace(0.1, 0.9, 7)
                .into_iter()
                .filter_map(|f| interpolate_normalized(&seg.geometry, f))
                .collect();
            let slope = mean_at(slope_deg, &points);
            let slope_pct = slope.unwrap_or(DEFAULT_SEGMENT_SLOPE_DEG).to_radians().tan() * 100.0;

            let upstream_loss = seg
                .geometry
                .0
                .first()
                .and_then(|&start| mean_positive_within(soil_loss, start, params.erosion_search_radius_m));
            let vf = basin.and_then(|b| basin_vf.get(b).copied().flatten());

            let scores = FactorScores {
                order: order_score(seg.order),
                area: area_score(upstream_area_km2),
                slope: slope_score(slope_pct),
                erosion: erosion_score(upstream_loss, loss_p95),
                valley: valley_score(vf),
            };
            let cdsi = scores.weighted(&params.weights);
            CheckDamSite {
                segment_id: seg.id,
                order: seg.order,
                basin,
                length_m: seg.length(),
                upstream_area_km2,
                slope_deg: slope,
                slope_pct,
                upstream_loss,
                scores,
                cdsi,
                class: SuitabilityClass::from_cdsi(cdsi),
            }
        })
        .collect()
}
