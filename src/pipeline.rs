//! Fetch → join → render, one sequential pass per request.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::attribute::ResourceAttribute;
use crate::bounds::{geometry_bounds, overall_bounds, point_bounds};
use crate::cache::FetchCache;
use crate::client::{ApiClient, JsonSource};
use crate::colormap::ColorScale;
use crate::compose::{compose_map, MapDocument, MapInputs, SourceWarning};
use crate::config::AtlasConfig;
use crate::district::{decode_districts, DistrictFeature, DistrictLayer};
use crate::enrich::mark_camps;
use crate::error::{AtlasError, FetchError};
use crate::geometry::{measure_areas, EqualAreaProjection};
use crate::records::{decode_monsters, decode_survivors, MonsterTable, SurvivorTable};

#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    pub name: &'static str,
    pub duration_ms: f64,
}

#[derive(Debug)]
pub struct RenderOutput {
    pub document: MapDocument,
    pub stages: Vec<StageReport>,
}

struct StageClock {
    started: Instant,
    reports: Vec<StageReport>,
}

impl StageClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            reports: Vec::new(),
        }
    }

    fn lap(&mut self, name: &'static str) {
        let elapsed = self.started.elapsed();
        debug!(stage = name, duration_ms = elapsed.as_secs_f64() * 1_000.0, "stage finished");
        self.reports.push(StageReport {
            name,
            duration_ms: elapsed.as_secs_f64() * 1_000.0,
        });
        self.started = Instant::now();
    }
}

pub struct Atlas<S = ApiClient> {
    config: AtlasConfig,
    source: S,
    cache: FetchCache,
    projection: Box<dyn EqualAreaProjection>,
}

impl Atlas<ApiClient> {
    pub fn from_config(config: AtlasConfig) -> Result<Self, reqwest::Error> {
        let client = ApiClient::new(config.http.timeout())?;
        Ok(Self::new(config, client))
    }
}

impl<S: JsonSource> Atlas<S> {
    pub fn new(config: AtlasConfig, source: S) -> Self {
        let cache = FetchCache::new(config.cache.ttl());
        let projection = config.geometry.projection.build();
        Self {
            config,
            source,
            cache,
            projection,
        }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    async fn fetch(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        if let Some(hit) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(hit);
        }
        let value = self.source.fetch_json(url).await?;
        Ok(self.cache.insert(url, value))
    }

    /// Fetch and decode the district layer. Any failure here is fatal: with
    /// no districts there is nothing to draw.
    pub async fn load_districts(&self) -> Result<Vec<DistrictFeature>, AtlasError> {
        Ok(self.district_layer().await?.features)
    }

    async fn district_layer(&self) -> Result<DistrictLayer, AtlasError> {
        let url = &self.config.endpoints.resources;
        let payload = self.fetch(url).await.map_err(AtlasError::ResourcesUnavailable)?;
        let layer = decode_districts(&payload).map_err(AtlasError::ResourcesMalformed)?;
        if layer.features.is_empty() {
            return Err(AtlasError::NoDistricts);
        }
        if layer.skipped > 0 {
            warn!(skipped = layer.skipped, "district features without polygon geometry were skipped");
        }
        Ok(layer)
    }

    async fn load_survivors(&self, warnings: &mut Vec<SourceWarning>) -> Option<SurvivorTable> {
        let url = &self.config.endpoints.survivors;
        let payload = self.optional_payload("survivors", url, warnings).await?;
        match decode_survivors(&payload) {
            Ok(table) => {
                note_skipped("survivors", table.skipped, warnings);
                Some(table)
            }
            Err(err) => {
                warn!(url = url.as_str(), "survivor payload rejected: {err}");
                warnings.push(SourceWarning::new("survivors", err.to_string()));
                None
            }
        }
    }

    async fn load_monsters(&self, warnings: &mut Vec<SourceWarning>) -> Option<MonsterTable> {
        let url = &self.config.endpoints.monsters;
        let payload = self.optional_payload("monsters", url, warnings).await?;
        match decode_monsters(&payload) {
            Ok(table) => {
                note_skipped("monsters", table.skipped, warnings);
                Some(table)
            }
            Err(err) => {
                warn!(url = url.as_str(), "monster payload rejected: {err}");
                warnings.push(SourceWarning::new("monsters", err.to_string()));
                None
            }
        }
    }

    async fn optional_payload(
        &self,
        source: &str,
        url: &str,
        warnings: &mut Vec<SourceWarning>,
    ) -> Option<Arc<Value>> {
        match self.fetch(url).await {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(source, "source unavailable: {err}");
                warnings.push(SourceWarning::new(source, format!("Error fetching data: {err}")));
                None
            }
        }
    }

    /// Run the whole pipeline for one attribute selection.
    pub async fn render(&self, attribute: ResourceAttribute) -> Result<RenderOutput, AtlasError> {
        let mut clock = StageClock::new();
        let mut warnings = Vec::new();

        let layer = self.district_layer().await?;
        if layer.skipped > 0 {
            warnings.push(SourceWarning::new(
                "resources",
                format!("{} district feature(s) without polygon geometry were skipped", layer.skipped),
            ));
        }
        let districts = layer.features;
        clock.lap("fetch_resources");

        let survivors = self.load_survivors(&mut warnings).await;
        clock.lap("fetch_survivors");

        let districts = mark_camps(districts, survivors.as_ref());
        clock.lap("enrich");

        let districts = measure_areas(districts, self.projection.as_ref());
        clock.lap("area");

        let scale = ColorScale::for_attribute(attribute, &districts, self.config.color.coercion);
        if scale.is_none() {
            warnings.push(SourceWarning::new(
                "resources",
                format!("no district has a numeric '{attribute}' value"),
            ));
        }
        clock.lap("color");

        let district_box = geometry_bounds(&districts);
        let survivor_box = survivors.as_ref().and_then(|t| point_bounds(&t.rows));
        clock.lap("bounds");

        let monsters = self.load_monsters(&mut warnings).await;
        clock.lap("fetch_monsters");

        let monster_box = monsters.as_ref().and_then(|t| point_bounds(&t.rows));
        let bounds = overall_bounds(district_box, survivor_box, monster_box).ok_or(AtlasError::NoDistricts)?;

        let document = compose_map(MapInputs {
            districts: &districts,
            survivors: survivors.as_ref(),
            monsters: monsters.as_ref(),
            attribute,
            scale: scale.as_ref(),
            bounds,
            zoom: self.config.map.zoom,
            fill_opacity: self.config.map.fill_opacity,
            warnings,
        });
        clock.lap("compose");

        info!(
            %attribute,
            districts = districts.len(),
            clusters = document.survivor_clusters.len(),
            monsters = document.monsters.len(),
            warnings = document.warnings.len(),
            "map rendered"
        );
        Ok(RenderOutput {
            document,
            stages: clock.reports,
        })
    }
}

fn note_skipped(source: &str, skipped: usize, warnings: &mut Vec<SourceWarning>) {
    if skipped > 0 {
        warnings.push(SourceWarning::new(
            source,
            format!("{skipped} record(s) with missing or invalid fields were skipped"),
        ));
    }
}
