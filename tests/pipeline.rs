mod common;

use common::{fixture_config, full_source, FixtureSource, MONSTERS, RESOURCES, SURVIVORS};
use district_atlas::{
    attribute::CoercionPolicy,
    colormap::Rgb,
    compose::atlas_value,
    error::AtlasError,
    Atlas, ResourceAttribute,
};
use serde_json::{json, Value};

fn district_property<'a>(doc: &'a district_atlas::compose::MapDocument, name: &str, key: &str) -> &'a Value {
    let feature = doc
        .districts
        .features
        .iter()
        .find(|f| atlas_value(f, "name") == Some(&json!(name)))
        .expect("district present");
    atlas_value(feature, key).expect("value present")
}

#[tokio::test]
async fn resources_failure_halts_rendering() {
    let source = FixtureSource::new()
        .with(SURVIVORS, common::survivors())
        .with(MONSTERS, common::monsters());
    let atlas = Atlas::new(fixture_config(), source);

    let err = atlas.render(ResourceAttribute::Water).await.unwrap_err();
    assert!(matches!(err, AtlasError::ResourcesUnavailable(_)), "got {err}");
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn survivors_failure_degrades_to_no_camps() {
    let source = FixtureSource::new()
        .with(RESOURCES, common::resources())
        .with(MONSTERS, common::monsters());
    let atlas = Atlas::new(fixture_config(), source);

    let doc = atlas.render(ResourceAttribute::Water).await.unwrap().document;

    assert_eq!(doc.districts.features.len(), 3);
    for feature in &doc.districts.features {
        assert_eq!(atlas_value(feature, "camp_exists"), Some(&json!(false)));
    }
    assert!(doc.survivor_clusters.is_empty());
    assert_eq!(doc.monsters.len(), 2);
    assert!(doc.warnings.iter().any(|w| w.source == "survivors"));
}

#[tokio::test]
async fn monsters_failure_still_renders_camps() {
    let source = FixtureSource::new()
        .with(RESOURCES, common::resources())
        .with(SURVIVORS, common::survivors());
    let atlas = Atlas::new(fixture_config(), source);

    let doc = atlas.render(ResourceAttribute::Ammo).await.unwrap().document;

    assert!(doc.monsters.is_empty());
    assert_eq!(doc.survivor_clusters.len(), 2);
    assert_eq!(doc.warnings.len(), 1);
    assert_eq!(doc.warnings[0].source, "monsters");
}

#[tokio::test]
async fn camp_district_gets_black_border_and_scaled_fill() {
    let atlas = Atlas::new(fixture_config(), full_source());
    let doc = atlas.render(ResourceAttribute::Ammo).await.unwrap().document;

    // Gamma's bad temperature drops it from the ammo domain, leaving 10..30
    // with Alpha at the top.
    let alpha = doc.district_style("Alpha").unwrap();
    assert_eq!(alpha.color, "black");
    assert_eq!(alpha.weight, 2);
    assert_eq!(alpha.fill_color, "#5a2c6c");

    let beta = doc.district_style("Beta").unwrap();
    assert_eq!((beta.color.as_str(), beta.weight), ("gray", 1));
    assert_eq!(beta.fill_color, "#d7c7e3");

    let alpha_cluster = doc.survivor_clusters.iter().find(|c| c.name == "Alpha").unwrap();
    assert_eq!(alpha_cluster.markers.len(), 3);
    assert_eq!(alpha_cluster.markers[0].popup, "Survivor ID: s-1<br>District: Alpha");
}

#[tokio::test]
async fn switching_attribute_recomputes_the_domain() {
    let source = full_source();
    let atlas = Atlas::new(fixture_config(), source.clone());

    let water = atlas.render(ResourceAttribute::Water).await.unwrap().document;
    let ammo = atlas.render(ResourceAttribute::Ammo).await.unwrap().document;

    let water_legend = water.legend.as_ref().unwrap();
    let ammo_legend = ammo.legend.as_ref().unwrap();
    assert_eq!((water_legend.min, water_legend.max), (20.0, 80.0));
    assert_eq!((ammo_legend.min, ammo_legend.max), (10.0, 30.0));
    assert_eq!(ammo.attribute, ResourceAttribute::Ammo);

    // Second render is served from the cache.
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn default_policy_drops_the_row_from_every_domain() {
    let atlas = Atlas::new(fixture_config(), full_source());

    // Gamma's bad temperature removes its ammo value (50) from the domain,
    // but it is still drawn with a color from the scale.
    let doc = atlas.render(ResourceAttribute::Ammo).await.unwrap().document;
    let legend = doc.legend.as_ref().unwrap();
    assert_eq!((legend.min, legend.max), (10.0, 30.0));
    assert_eq!(doc.district_style("Gamma").unwrap().fill_color, "#5a2c6c");

    let temp = atlas.render(ResourceAttribute::Temp).await.unwrap().document;
    assert_eq!(temp.district_style("Gamma").unwrap().fill_color, "gray");
}

#[tokio::test]
async fn per_attribute_policy_only_grays_the_failing_attribute() {
    let mut config = fixture_config();
    config.color.coercion = CoercionPolicy::PerAttribute;
    let atlas = Atlas::new(config, full_source());

    let temp = atlas.render(ResourceAttribute::Temp).await.unwrap().document;
    assert_eq!(temp.district_style("Gamma").unwrap().fill_color, "gray");
    let legend = temp.legend.as_ref().unwrap();
    assert_eq!((legend.min, legend.max), (15.0, 25.0));

    // Ammo spans 10..50 and Alpha holds 30, the midpoint.
    let ammo = atlas.render(ResourceAttribute::Ammo).await.unwrap().document;
    assert_eq!(ammo.legend.as_ref().unwrap().max, 50.0);
    let expected = Rgb::new(0xd7, 0xc7, 0xe3).lerp(Rgb::new(0x5a, 0x2c, 0x6c), 0.5);
    assert_eq!(ammo.district_style("Alpha").unwrap().fill_color, expected.to_string());
    assert_ne!(ammo.district_style("Gamma").unwrap().fill_color, "gray");
}

#[tokio::test]
async fn areas_are_square_kilometres() {
    let atlas = Atlas::new(fixture_config(), full_source());
    let doc = atlas.render(ResourceAttribute::Water).await.unwrap().document;

    // A 0.5 x 0.5 degree cell near 40N is roughly 2,370 km2.
    let area = district_property(&doc, "Alpha", "area_sqkm").as_f64().unwrap();
    assert!((2_300.0..2_450.0).contains(&area), "area = {area}");
}

#[tokio::test]
async fn bounds_cover_districts_survivors_and_monsters() {
    let atlas = Atlas::new(fixture_config(), full_source());
    let doc = atlas.render(ResourceAttribute::Water).await.unwrap().document;

    let [[south, west], [north, east]] = doc.bounds;
    assert_eq!(south, 39.5);
    assert_eq!(west, -101.0);
    assert_eq!(north, 41.5);
    assert!((east - (-98.5)).abs() < 1e-9, "east = {east}");
    assert!((doc.center[0] - 40.5).abs() < 1e-9);
    assert_eq!(doc.zoom, 8);
}

#[tokio::test]
async fn malformed_survivor_payload_is_a_warning() {
    let source = full_source().with(SURVIVORS, json!({"survivors": "nope"}));
    let atlas = Atlas::new(fixture_config(), source);

    let doc = atlas.render(ResourceAttribute::Water).await.unwrap().document;
    assert!(doc.survivor_clusters.is_empty());
    assert!(doc
        .warnings
        .iter()
        .any(|w| w.source == "survivors" && w.message.contains("malformed")));
}

#[tokio::test]
async fn skipped_districts_are_reported() {
    let mut resources = common::resources();
    resources["features"].as_array_mut().unwrap().push(json!({
        "type": "Feature",
        "properties": {"dist_name": "Outpost"},
        "geometry": {"type": "Point", "coordinates": [-99.0, 40.0]}
    }));
    let source = full_source().with(RESOURCES, resources);
    let atlas = Atlas::new(fixture_config(), source);

    let doc = atlas.render(ResourceAttribute::Water).await.unwrap().document;
    assert_eq!(doc.districts.features.len(), 3);
    assert!(doc
        .warnings
        .iter()
        .any(|w| w.source == "resources" && w.message.starts_with("1 district feature")));
}

#[tokio::test]
async fn empty_district_collection_is_fatal() {
    let source = full_source().with(RESOURCES, json!({"type": "FeatureCollection", "features": []}));
    let atlas = Atlas::new(fixture_config(), source);

    assert!(matches!(
        atlas.render(ResourceAttribute::Water).await,
        Err(AtlasError::NoDistricts)
    ));
}

#[tokio::test]
async fn stages_are_reported_in_pipeline_order() {
    let atlas = Atlas::new(fixture_config(), full_source());
    let output = atlas.render(ResourceAttribute::Medkits).await.unwrap();

    let names: Vec<&str> = output.stages.iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            "fetch_resources",
            "fetch_survivors",
            "enrich",
            "area",
            "color",
            "bounds",
            "fetch_monsters",
            "compose"
        ]
    );
}
