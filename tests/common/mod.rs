#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use district_atlas::client::JsonSource;
use district_atlas::config::AtlasConfig;
use district_atlas::error::FetchError;
use serde_json::{json, Value};

pub const RESOURCES: &str = "http://fixture.test/resources";
pub const SURVIVORS: &str = "http://fixture.test/survivors";
pub const MONSTERS: &str = "http://fixture.test/monsters";

/// In-memory endpoints. URLs without a payload answer HTTP 500.
#[derive(Clone, Default)]
pub struct FixtureSource {
    payloads: HashMap<String, Value>,
    calls: Arc<AtomicUsize>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, payload: Value) -> Self {
        self.payloads.insert(url.to_string(), payload);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl JsonSource for FixtureSource {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 500,
            })
    }
}

pub fn fixture_config() -> AtlasConfig {
    let mut config = AtlasConfig::default();
    config.endpoints.resources = RESOURCES.to_string();
    config.endpoints.survivors = SURVIVORS.to_string();
    config.endpoints.monsters = MONSTERS.to_string();
    config
}

fn square(name: &str, lon: f64, lat: f64, properties: Value) -> Value {
    let mut props = properties;
    props["dist_name"] = json!(name);
    json!({
        "type": "Feature",
        "properties": props,
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon, lat], [lon + 0.5, lat], [lon + 0.5, lat + 0.5], [lon, lat + 0.5], [lon, lat]
            ]]
        }
    })
}

/// Three districts side by side; Gamma has a non-numeric temperature.
pub fn resources() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            square("Alpha", -100.0, 40.0, json!({"water": 20, "temp": 15, "ammo": 30, "medkits": 4, "food_rations": 12})),
            square("Beta", -99.5, 40.0, json!({"water": 80, "temp": 25, "ammo": 10, "medkits": 9, "food_rations": 40})),
            square("Gamma", -99.0, 40.0, json!({"water": 50, "temp": "hot", "ammo": 50, "medkits": 1, "food_rations": 25})),
        ]
    })
}

pub fn survivors() -> Value {
    json!([
        {"survivor_id": "s-1", "district": "Alpha", "lat": 40.1, "lon": -99.9},
        {"survivor_id": "s-2", "district": "Alpha", "lat": 40.2, "lon": -99.8},
        {"survivor_id": "s-3", "district": "Alpha", "lat": 40.3, "lon": -99.7},
        {"survivor_id": "s-4", "district": "Gamma", "lat": 41.5, "lon": -98.8},
    ])
}

pub fn monsters() -> Value {
    json!({"monsters": [
        {"monster_id": "m-1", "lat": 39.5, "lon": -101.0},
        {"monster_id": "m-2", "lat": 40.4, "lon": -99.2},
    ]})
}

pub fn full_source() -> FixtureSource {
    FixtureSource::new()
        .with(RESOURCES, resources())
        .with(SURVIVORS, survivors())
        .with(MONSTERS, monsters())
}
