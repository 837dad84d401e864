//! Typed watershed layers: subbasin polygons, Strahler-ordered stream
//! segments and outlet pour points.
//!
//! Each constructor validates its source layer and fails on a missing
//! attribute field or an unusable geometry type.

use super::FeatureCollection;
use crate::error::{Error, Result};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Attribute field names read from the input layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerFields {
    /// Integer Strahler order on the stream layer
    pub order_field: String,
    /// Subbasin identifier; `SB1..SBn` in layer order when absent
    pub subbasin_id_field: Option<String>,
    /// Pour-point identifier; `PP1..PPn` in layer order when absent
    pub pour_point_id_field: Option<String>,
}

impl Default for LayerFields {
    fn default() -> Self {
        Self {
            order_field: "grid_code".to_string(),
            subbasin_id_field: None,
            pour_point_id_field: None,
        }
    }
}

/// One subbasin polygon
#[derive(Debug, Clone)]
pub struct Subbasin {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
}

impl Subbasin {
    /// Build subbasins from a polygon layer
    pub fn from_layer(layer: &FeatureCollection, id_field: Option<&str>) -> Result<Vec<Subbasin>> {
        if let Some(field) = id_field {
            layer.require_field(field)?;
        }

        let mut out = Vec::with_capacity(layer.len());
        for (i, feature) in layer.iter().enumerate() {
            let geometry = match &feature.geometry {
                Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
                Some(Geometry::MultiPolygon(mp)) => mp.clone(),
                Some(other) => {
                    return Err(Error::Geometry(format!(
                        "layer '{}' feature {} is {}, expected a polygon",
                        layer.name,
                        i,
                        geometry_kind(other)
                    )))
                }
                None => {
                    debug!("Skipping subbasin feature {} without geometry", i);
                    continue;
                }
            };

            let id = match id_field {
                Some(field) => feature
                    .get_property(field)
                    .and_then(|v| v.as_label())
                    .unwrap_or_else(|| format!("SB{}", i + 1)),
                None => format!("SB{}", out.len() + 1),
            };
            out.push(Subbasin { id, geometry });
        }

        if out.is_empty() {
            return Err(Error::EmptyLayer(layer.name.clone()));
        }
        Ok(out)
    }
}

/// One single-part stream polyline with its Strahler order
#[derive(Debug, Clone)]
pub struct StreamSegment {
    /// Position in the exploded layer
    pub id: usize,
    pub order: u32,
    pub geometry: LineString<f64>,
}

impl StreamSegment {
    /// Build segments from a line layer, exploding multi-part features.
    pub fn from_layer(layer: &FeatureCollection, order_field: &str) -> Result<Vec<StreamSegment>> {
        layer.require_field(order_field)?;

        let mut out = Vec::new();
        for (i, feature) in layer.iter().enumerate() {
            let order = feature
                .get_property(order_field)
                .and_then(|v| v.as_i64())
                .filter(|&o| o >= 1 && o <= u32::MAX as i64)
                .ok_or_else(|| {
                    Error::Vector(format!(
                        "layer '{}' feature {}: '{}' is not a positive integer order",
                        layer.name, i, order_field
                    ))
                })? as u32;

            let parts: Vec<LineString<f64>> = match &feature.geometry {
                Some(Geometry::LineString(ls)) => vec![ls.clone()],
                Some(Geometry::MultiLineString(mls)) => mls.0.clone(),
                Some(Geometry::Line(l)) => vec![LineString::from(vec![l.start, l.end])],
                Some(other) => {
                    return Err(Error::Geometry(format!(
                        "layer '{}' feature {} is {}, expected a line",
                        layer.name,
                        i,
                        geometry_kind(other)
                    )))
                }
                None => Vec::new(),
            };

            for geometry in parts.into_iter().filter(|ls| ls.0.len() >= 2) {
                out.push(StreamSegment {
                    id: out.len(),
                    order,
                    geometry,
                });
            }
        }

        if out.is_empty() {
            return Err(Error::EmptyLayer(layer.name.clone()));
        }
        Ok(out)
    }

    /// Planimetric length in CRS units
    pub fn length(&self) -> f64 {
        self.geometry.lines().map(|l| l.dx().hypot(l.dy())).sum()
    }

    pub fn start(&self) -> Coord<f64> {
        self.geometry.0[0]
    }

    pub fn end(&self) -> Coord<f64> {
        self.geometry.0[self.geometry.0.len() - 1]
    }

    /// Distance between the two endpoints
    pub fn straight_length(&self) -> f64 {
        let (a, b) = (self.start(), self.end());
        (b.x - a.x).hypot(b.y - a.y)
    }
}

/// One outlet point
#[derive(Debug, Clone)]
pub struct PourPoint {
    pub id: String,
    pub point: Point<f64>,
}

impl PourPoint {
    pub fn from_layer(layer: &FeatureCollection, id_field: Option<&str>) -> Result<Vec<PourPoint>> {
        if let Some(field) = id_field {
            layer.require_field(field)?;
        }

        let mut out = Vec::new();
        for (i, feature) in layer.iter().enumerate() {
            let point = match &feature.geometry {
                Some(Geometry::Point(p)) => *p,
                Some(Geometry::MultiPoint(mp)) if !mp.0.is_empty() => mp.0[0],
                Some(other) => {
                    return Err(Error::Geometry(format!(
                        "layer '{}' feature {} is {}, expected a point",
                        layer.name,
                        i,
                        geometry_kind(other)
                    )))
                }
                None => continue,
            };
            let id = id_field
                .and_then(|f| feature.get_property(f))
                .and_then(|v| v.as_label())
                .unwrap_or_else(|| format!("PP{}", out.len() + 1));
            out.push(PourPoint { id, point });
        }

        if out.is_empty() {
            return Err(Error::EmptyLayer(layer.name.clone()));
        }
        Ok(out)
    }
}

fn geometry_kind(g: &Geometry<f64>) -> &'static str {
    match g {
        Geometry::Point(_) => "a point",
        Geometry::Line(_) => "a line",
        Geometry::LineString(_) => "a linestring",
        Geometry::Polygon(_) => "a polygon",
        Geometry::MultiPoint(_) => "a multipoint",
        Geometry::MultiLineString(_) => "a multilinestring",
        Geometry::MultiPolygon(_) => "a multipolygon",
        Geometry::GeometryCollection(_) => "a geometry collection",
        Geometry::Rect(_) => "a rectangle",
        Geometry::Triangle(_) => "a triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{AttributeValue, Feature};
    use geo_types::{line_string, polygon, MultiLineString};

    #[test]
    fn test_segments_explode_multipart() {
        let mut layer = FeatureCollection::new("streams");
        let mls = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)],
            line_string![(x: 3.0, y: 4.0), (x: 3.0, y: 10.0)],
        ]);
        layer.push(
            Feature::new(Geometry::MultiLineString(mls))
                .with_property("grid_code", AttributeValue::Float(2.0)),
        );

        let segs = StreamSegment::from_layer(&layer, "grid_code").unwrap();
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|s| s.order == 2));
        assert_eq!(segs[0].length(), 5.0);
        assert_eq!(segs[1].id, 1);
    }

    #[test]
    fn test_segments_missing_order_field_is_fatal() {
        let mut layer = FeatureCollection::new("streams");
        layer.push(
            Feature::new(Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]))
                .with_property("ORDER", AttributeValue::Int(1)),
        );
        assert!(matches!(
            StreamSegment::from_layer(&layer, "grid_code"),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_subbasin_default_ids() {
        let mut layer = FeatureCollection::new("subbasins");
        for k in 0..3 {
            let x = k as f64 * 10.0;
            layer.push(Feature::new(Geometry::Polygon(polygon![
                (x: x, y: 0.0), (x: x + 10.0, y: 0.0), (x: x + 10.0, y: 10.0), (x: x, y: 10.0)
            ])));
        }
        let basins = Subbasin::from_layer(&layer, None).unwrap();
        let ids: Vec<_> = basins.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["SB1", "SB2", "SB3"]);
    }

    #[test]
    fn test_subbasin_rejects_lines() {
        let mut layer = FeatureCollection::new("subbasins");
        layer.push(Feature::new(Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 1.0)
        ])));
        assert!(matches!(Subbasin::from_layer(&layer, None), Err(Error::Geometry(_))));
    }
}
