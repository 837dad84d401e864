//! Geometric measurements: area, length, perimeter, centroid

use geo::{Area as GeoArea, BoundingRect, Centroid, Coord, Euclidean, Length, LineString, MultiPolygon, Rect};

/// Unsigned planimetric area in CRS units squared.
pub fn area(geom: &MultiPolygon<f64>) -> f64 {
    geom.unsigned_area()
}

/// Euclidean length in CRS units.
pub fn length(line: &LineString<f64>) -> f64 {
    line.length::<Euclidean>()
}

/// Total length of exterior and interior rings.
pub fn perimeter(geom: &MultiPolygon<f64>) -> f64 {
    geom.0
        .iter()
        .map(|p| {
            let ext = p.exterior().length::<Euclidean>();
            let int: f64 = p.interiors().iter().map(|r| r.length::<Euclidean>()).sum();
            ext + int
        })
        .sum()
}

/// Area-weighted centroid, `None` for an empty geometry.
pub fn centroid(geom: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    geom.centroid().map(|p| p.0)
}

pub fn line_centroid(line: &LineString<f64>) -> Option<Coord<f64>> {
    line.centroid().map(|p| p.0)
}

pub fn bounds(geom: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    geom.bounding_rect()
}

/// Exterior ring of the largest polygon part.
pub fn main_exterior(geom: &MultiPolygon<f64>) -> Option<&LineString<f64>> {
    geom.0
        .iter()
        .max_by(|a, b| {
            a.unsigned_area()
                .partial_cmp(&b.unsigned_area())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|p| p.exterior())
}
