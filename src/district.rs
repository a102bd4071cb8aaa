//! District polygons decoded from the resources GeoJSON payload.

use geo::{Geometry, MultiPolygon};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::DecodeError;

/// Property holding the district name in the resources payload.
pub const NAME_PROPERTY: &str = "dist_name";

const GEOGRAPHIC_CRS_NAMES: &[&str] = &[
    "EPSG:4326",
    "urn:ogc:def:crs:EPSG::4326",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:OGC::CRS84",
    "CRS84",
];

#[derive(Debug, Clone)]
pub struct DistrictFeature {
    pub name: Option<String>,
    /// Longitude/latitude coordinates.
    pub geometry: MultiPolygon<f64>,
    /// Raw properties as delivered, resource attributes included.
    pub properties: Map<String, Value>,
    pub camp_exists: bool,
    pub area_sqkm: Option<f64>,
}

impl DistrictFeature {
    pub fn new(name: Option<String>, geometry: MultiPolygon<f64>, properties: Map<String, Value>) -> Self {
        Self {
            name,
            geometry,
            properties,
            camp_exists: false,
            area_sqkm: None,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DistrictLayer {
    pub features: Vec<DistrictFeature>,
    pub skipped: usize,
}

/// Decode a GeoJSON FeatureCollection. Features without polygonal geometry
/// are skipped; a wrong top-level shape or a non-geographic CRS is an error.
pub fn decode_districts(payload: &Value) -> Result<DistrictLayer, DecodeError> {
    check_crs(payload)?;
    let features = payload
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::Malformed("expected a FeatureCollection with 'features'".into()))?;

    let mut layer = DistrictLayer::default();
    for (index, feature) in features.iter().enumerate() {
        match decode_feature(feature) {
            Some(district) => layer.features.push(district),
            None => {
                warn!(index, "skipping district feature without polygon geometry");
                layer.skipped += 1;
            }
        }
    }
    Ok(layer)
}

fn decode_feature(feature: &Value) -> Option<DistrictFeature> {
    let properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let geometry: geojson::Geometry = serde_json::from_value(feature.get("geometry")?.clone()).ok()?;
    let geometry = match Geometry::<f64>::try_from(geometry).ok()? {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(multi) => multi,
        _ => return None,
    };
    let name = properties
        .get(NAME_PROPERTY)
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(DistrictFeature::new(name, geometry, properties))
}

/// Payloads without a `crs` member are taken to be EPSG:4326.
fn check_crs(payload: &Value) -> Result<(), DecodeError> {
    let Some(crs) = payload.get("crs") else {
        return Ok(());
    };
    let name = crs
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed("crs member has no properties.name".into()))?;
    if GEOGRAPHIC_CRS_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(DecodeError::UnsupportedCrs(name.to_string()))
    }
}
