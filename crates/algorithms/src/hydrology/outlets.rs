//! Pour-point snapping and subbasin outlets.

use geo::{Contains, Coord, Distance, Euclidean, Point};
use hydromorph_core::raster::Raster;
use hydromorph_core::{PourPoint, Subbasin};

/// A pour point moved onto the highest-accumulation cell nearby.
#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPoint {
    pub id: String,
    pub original: Point<f64>,
    pub snapped: Point<f64>,
    pub distance_m: f64,
}

/// Move `point` to the centre of the cell with the largest flow
/// accumulation in a square window of half-width `radius_m`.
///
/// Points off the grid, or whose window holds no valid cell, stay put.
pub fn snap_pour_point(point: &PourPoint, flow_acc: &Raster<f64>, radius_m: f64) -> SnappedPoint {
    let original = point.point;
    let snapped = best_cell(original.0, flow_acc, radius_m).map_or(original, Point::from);
    SnappedPoint {
        id: point.id.clone(),
        original,
        snapped,
        distance_m: Euclidean::distance(original, snapped),
    }
}

fn best_cell(c: Coord<f64>, flow_acc: &Raster<f64>, radius_m: f64) -> Option<Coord<f64>> {
    let (row, col) = flow_acc.cell_at(c.x, c.y)?;
    let (rows, cols) = flow_acc.shape();
    let reach = (radius_m / flow_acc.cell_size()).floor().max(0.0) as usize;

    let mut best: Option<(f64, usize, usize)> = None;
    for r in row.saturating_sub(reach)..(row + reach + 1).min(rows) {
        for k in col.saturating_sub(reach)..(col + reach + 1).min(cols) {
            let v = unsafe { flow_acc.get_unchecked(r, k) };
            if flow_acc.is_nodata(v) {
                continue;
            }
            if best.map_or(true, |(b, _, _)| v > b) {
                best = Some((v, r, k));
            }
        }
    }
    best.map(|(_, r, k)| {
        let (x, y) = flow_acc.pixel_to_geo(k, r);
        Coord { x, y }
    })
}

/// Id of the first snapped pour point inside each subbasin.
pub fn basin_outlets(subbasins: &[Subbasin], points: &[SnappedPoint]) -> Vec<Option<String>> {
    subbasins
        .iter()
        .map(|sb| {
            points
                .iter()
                .find(|p| sb.geometry.contains(&p.snapped))
                .map(|p| p.id.clone())
        })
        .collect()
}
