//! Builds the map document the Leaflet page draws from.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::Serialize;
use serde_json::Value;

use crate::attribute::{ResourceAttribute, ATTRIBUTE_TABLE};
use crate::bounds::BoundingBox;
use crate::colormap::{style_for, ColorScale, Legend, PolygonStyle};
use crate::district::DistrictFeature;
use crate::records::{MonsterTable, SurvivorTable};

/// A source that could not contribute to the map, or contributed partially.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceWarning {
    pub source: String,
    pub message: String,
}

impl SourceWarning {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub location: [f64; 2],
    pub popup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerCluster {
    pub name: String,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeOption {
    pub key: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapDocument {
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub bounds: [[f64; 2]; 2],
    pub attribute: ResourceAttribute,
    pub attributes: Vec<AttributeOption>,
    pub districts: FeatureCollection,
    pub survivor_clusters: Vec<MarkerCluster>,
    pub monsters: Vec<Marker>,
    pub legend: Option<Legend>,
    pub layer_control: bool,
    pub warnings: Vec<SourceWarning>,
}

impl MapDocument {
    pub fn survivor_marker_count(&self) -> usize {
        self.survivor_clusters.iter().map(|c| c.markers.len()).sum()
    }

    pub fn district_style(&self, name: &str) -> Option<PolygonStyle> {
        self.districts
            .features
            .iter()
            .find(|feature| {
                atlas_value(feature, "name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n == name)
            })
            .and_then(|feature| atlas_value(feature, "style"))
            .and_then(|style| serde_json::from_value(style.clone()).ok())
    }
}

pub struct MapInputs<'a> {
    pub districts: &'a [DistrictFeature],
    pub survivors: Option<&'a SurvivorTable>,
    pub monsters: Option<&'a MonsterTable>,
    pub attribute: ResourceAttribute,
    pub scale: Option<&'a ColorScale>,
    pub bounds: BoundingBox,
    pub zoom: u8,
    pub fill_opacity: f64,
    pub warnings: Vec<SourceWarning>,
}

pub fn compose_map(inputs: MapInputs<'_>) -> MapDocument {
    let features = inputs
        .districts
        .iter()
        .map(|district| {
            let style = style_for(district, inputs.attribute, inputs.scale, inputs.fill_opacity);
            district_feature(district, &style)
        })
        .collect();

    MapDocument {
        title: "District Map with Survivors and Monsters".to_string(),
        center: inputs.bounds.center(),
        zoom: inputs.zoom,
        bounds: inputs.bounds.as_leaflet(),
        attribute: inputs.attribute,
        attributes: ATTRIBUTE_TABLE
            .iter()
            .map(|descriptor| AttributeOption {
                key: descriptor.key,
                label: descriptor.label,
                selected: descriptor.attribute == inputs.attribute,
            })
            .collect(),
        districts: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        survivor_clusters: survivor_clusters(inputs.districts, inputs.survivors),
        monsters: monster_markers(inputs.monsters),
        legend: inputs.scale.map(Legend::from_scale),
        layer_control: true,
        warnings: inputs.warnings,
    }
}

/// Feature member holding the computed name, camp flag, area and style.
/// Upstream properties are passed through untouched.
pub const ATLAS_MEMBER: &str = "atlas";

fn district_feature(district: &DistrictFeature, style: &PolygonStyle) -> Feature {
    let mut atlas = JsonObject::new();
    atlas.insert(
        "name".to_string(),
        district.name.clone().map(Value::String).unwrap_or(Value::Null),
    );
    atlas.insert("camp_exists".to_string(), Value::Bool(district.camp_exists));
    atlas.insert(
        "area_sqkm".to_string(),
        district.area_sqkm.map(Value::from).unwrap_or(Value::Null),
    );
    atlas.insert(
        "style".to_string(),
        serde_json::to_value(style).unwrap_or(Value::Null),
    );
    let mut members = JsonObject::new();
    members.insert(ATLAS_MEMBER.to_string(), Value::Object(atlas));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&district.geometry))),
        id: None,
        properties: Some(district.properties.clone()),
        foreign_members: Some(members),
    }
}

/// Computed value `key` of a composed district feature.
pub fn atlas_value<'a>(feature: &'a Feature, key: &str) -> Option<&'a Value> {
    feature
        .foreign_members
        .as_ref()?
        .get(ATLAS_MEMBER)?
        .get(key)
}

/// One cluster per district that has a camp, in district order.
fn survivor_clusters(districts: &[DistrictFeature], survivors: Option<&SurvivorTable>) -> Vec<MarkerCluster> {
    let Some(survivors) = survivors else {
        return Vec::new();
    };
    let mut seen = std::collections::BTreeSet::new();
    districts
        .iter()
        .filter(|district| district.camp_exists)
        .filter_map(|district| district.name.as_deref())
        .filter(|name| seen.insert(*name))
        .map(|name| MarkerCluster {
            name: name.to_string(),
            markers: survivors
                .in_district(name)
                .map(|survivor| Marker {
                    location: [survivor.lat, survivor.lon],
                    popup: format!(
                        "Survivor ID: {}<br>District: {}",
                        escape_html(&survivor.survivor_id),
                        escape_html(&survivor.district)
                    ),
                })
                .collect(),
        })
        .collect()
}

fn monster_markers(monsters: Option<&MonsterTable>) -> Vec<Marker> {
    monsters
        .map(|table| {
            table
                .rows
                .iter()
                .map(|monster| Marker {
                    location: [monster.lat, monster.lon],
                    popup: escape_html(&monster.monster_id),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
