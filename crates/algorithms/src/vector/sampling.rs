//! Point sampling along lines and rasters.

use geo::{Coord, LineString};
use hydromorph_core::raster::Raster;

use super::measurements::length;

/// Point at `distance` along `line`, clamped to its ends.
pub fn interpolate(line: &LineString<f64>, distance: f64) -> Option<Coord<f64>> {
    let first = *line.0.first()?;
    if distance <= 0.0 {
        return Some(first);
    }
    let mut walked = 0.0;
    for seg in line.lines() {
        let len = seg.dx().hypot(seg.dy());
        if walked + len >= distance && len > 0.0 {
            let t = (distance - walked) / len;
            return Some(Coord {
                x: seg.start.x + t * seg.dx(),
                y: seg.start.y + t * seg.dy(),
            });
        }
        walked += len;
    }
    line.0.last().copied()
}

/// Point at `fraction` (0..=1) of the line length.
pub fn interpolate_normalized(line: &LineString<f64>, fraction: f64) -> Option<Coord<f64>> {
    interpolate(line, fraction.clamp(0.0, 1.0) * length(line))
}

/// Points every `spacing` units from the start, always including both ends.
pub fn densify(line: &LineString<f64>, spacing: f64) -> Vec<Coord<f64>> {
    let total = length(line);
    if line.0.is_empty() {
        return Vec::new();
    }
    if spacing <= 0.0 || total <= spacing {
        return vec![line.0[0], line.0[line.0.len() - 1]];
    }
    let n = (total / spacing).floor() as usize;
    let mut out: Vec<Coord<f64>> = (0..=n).filter_map(|i| interpolate(line, i as f64 * spacing)).collect();
    if total - n as f64 * spacing > 1e-9 * total {
        out.push(line.0[line.0.len() - 1]);
    }
    out
}

/// `n` evenly spaced points from `start` to `end` fractions (inclusive).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Finite raster value under a point.
pub fn sample(raster: &Raster<f64>, c: Coord<f64>) -> Option<f64> {
    raster.value_at(c.x, c.y).filter(|v| v.is_finite())
}

/// Mean of the finite samples at `points`.
pub fn mean_at(raster: &Raster<f64>, points: &[Coord<f64>]) -> Option<f64> {
    let vals: Vec<f64> = points.iter().filter_map(|&c| sample(raster, c)).collect();
    crate::statistics::mean(&vals)
}

/// Copy of `line` running from its higher to its lower end on `dem`.
///
/// Lines with an unsampled end keep their digitized direction.
pub fn orient_downstream(line: &LineString<f64>, dem: &Raster<f64>) -> LineString<f64> {
    let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else {
        return line.clone();
    };
    match (sample(dem, first), sample(dem, last)) {
        (Some(zs), Some(ze)) if ze > zs => {
            let mut rev = line.0.clone();
            rev.reverse();
            LineString(rev)
        }
        _ => line.clone(),
    }
}
