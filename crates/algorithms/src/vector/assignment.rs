//! Stream segment to subbasin assignment.
//!
//! A segment belongs to the first subbasin that contains it. Segments that
//! cross a divide go to the first subbasin they intersect. Anything else is
//! reported as unassigned.

use geo::Relate;
use hydromorph_core::{StreamSegment, Subbasin};
use tracing::warn;

/// Segment indices per subbasin, plus the indices left over.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub by_basin: Vec<Vec<usize>>,
    pub unassigned: Vec<usize>,
}

impl Assignment {
    /// Subbasin index of every segment (`None` if unassigned).
    pub fn basin_of(&self, n_segments: usize) -> Vec<Option<usize>> {
        let mut out = vec![None; n_segments];
        for (b, segs) in self.by_basin.iter().enumerate() {
            for &s in segs {
                if s < n_segments {
                    out[s] = Some(b);
                }
            }
        }
        out
    }
}

pub fn assign_segments(subbasins: &[Subbasin], segments: &[StreamSegment]) -> Assignment {
    let mut by_basin = vec![Vec::new(); subbasins.len()];
    let mut unassigned = Vec::new();

    for (i, seg) in segments.iter().enumerate() {
        let mut intersecting = None;
        let mut within = None;
        for (b, sb) in subbasins.iter().enumerate() {
            let m = sb.geometry.relate(&seg.geometry);
            if m.is_contains() {
                within = Some(b);
                break;
            }
            if intersecting.is_none() && m.is_intersects() {
                intersecting = Some(b);
            }
        }
        match within.or(intersecting) {
            Some(b) => by_basin[b].push(i),
            None => unassigned.push(i),
        }
    }

    if !unassigned.is_empty() {
        warn!(
            "{} stream segment(s) fall outside every subbasin and are ignored",
            unassigned.len()
        );
    }

    Assignment { by_basin, unassigned }
}
