//! GeoJSON vector layers via the `geojson` crate

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geojson::feature::Id;
use geojson::{GeoJson, JsonValue};
use std::fs;
use std::path::Path;

/// Read a GeoJSON file as a named layer.
///
/// The layer name is the file stem, so missing-field errors point at the file.
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_geojson_str(&text, name)
}

/// Parse GeoJSON text (FeatureCollection, Feature or bare Geometry)
pub fn read_geojson_str(text: &str, name: impl Into<String>) -> Result<FeatureCollection> {
    let name = name.into();
    let parsed: GeoJson = text
        .parse()
        .map_err(|e| Error::Vector(format!("{}: {}", name, e)))?;

    let features = match parsed {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let mut layer = FeatureCollection::new(name);
    for f in features {
        layer.push(convert_feature(f, &layer.name)?);
    }
    Ok(layer)
}

fn convert_feature(f: geojson::Feature, layer: &str) -> Result<Feature> {
    let geometry = f
        .geometry
        .map(geo_types::Geometry::<f64>::try_from)
        .transpose()
        .map_err(|e| Error::Vector(format!("{}: {}", layer, e)))?;

    let properties = f
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, attribute_from_json(v)))
        .collect();

    let id = f.id.map(|id| match id {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    });

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

fn attribute_from_json(v: JsonValue) -> AttributeValue {
    match v {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Geometry;

    const STREAMS: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "id": 7,
         "properties": {"grid_code": 1, "name": "upper"},
         "geometry": {"type": "LineString", "coordinates": [[0, 0], [30, 40]]}},
        {"type": "Feature",
         "properties": {"grid_code": 2.0},
         "geometry": {"type": "MultiLineString",
                      "coordinates": [[[30, 40], [30, 100]], [[30, 100], [90, 100]]]}}
      ]
    }"#;

    #[test]
    fn test_read_feature_collection() {
        let layer = read_geojson_str(STREAMS, "streams").unwrap();
        assert_eq!(layer.name, "streams");
        assert_eq!(layer.len(), 2);

        let first = &layer.features[0];
        assert_eq!(first.id.as_deref(), Some("7"));
        assert_eq!(first.get_property("grid_code"), Some(&AttributeValue::Int(1)));
        assert!(matches!(first.geometry, Some(Geometry::LineString(_))));

        let second = &layer.features[1];
        assert_eq!(second.get_property("grid_code").and_then(|v| v.as_i64()), Some(2));
        assert!(matches!(second.geometry, Some(Geometry::MultiLineString(_))));
    }

    #[test]
    fn test_invalid_json_is_vector_error() {
        assert!(matches!(
            read_geojson_str("{\"type\": \"Nope\"}", "broken"),
            Err(Error::Vector(_))
        ));
    }
}
