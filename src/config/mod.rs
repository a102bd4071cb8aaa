//! Configuration for the atlas: endpoints, HTTP, cache, map, and server settings

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::attribute::CoercionPolicy;
use crate::error::ConfigError;
use crate::geometry::ProjectionKind;

/// Main configuration, every section falls back to its defaults when omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasConfig {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub color: ColorConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_resources_url")]
    pub resources: String,
    #[serde(default = "default_survivors_url")]
    pub survivors: String,
    #[serde(default = "default_monsters_url")]
    pub monsters: String,
}

fn default_resources_url() -> String {
    "https://api.mlsakiit.com/resources".to_string()
}

fn default_survivors_url() -> String {
    "https://api.mlsakiit.com/survivors".to_string()
}

fn default_monsters_url() -> String {
    "https://api.mlsakiit.com/monsters".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            resources: default_resources_url(),
            survivors: default_survivors_url(),
            monsters: default_monsters_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cached payloads live for the whole session unless `ttl_secs` is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
}

fn default_zoom() -> u8 {
    8
}

fn default_fill_opacity() -> f64 {
    0.7
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            fill_opacity: default_fill_opacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default)]
    pub projection: ProjectionKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default)]
    pub coercion: CoercionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AtlasConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AtlasConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("resources", &self.endpoints.resources),
            ("survivors", &self.endpoints.survivors),
            ("monsters", &self.endpoints.monsters),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{name} endpoint must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.map.zoom > 22 {
            return Err(ConfigError::Validation(format!(
                "map zoom {} is outside 0..=22",
                self.map.zoom
            )));
        }

        if !(0.0..=1.0).contains(&self.map.fill_opacity) {
            return Err(ConfigError::Validation(format!(
                "fill opacity {} is outside [0, 1]",
                self.map.fill_opacity
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
