use thiserror::Error;

/// Failure while talking to one of the remote endpoints.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned a body that is not JSON: {message}")]
    Body { url: String, message: String },
}

/// A payload arrived but does not have the shape the endpoint promises.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("unsupported coordinate reference system '{0}'")]
    UnsupportedCrs(String),
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("district resources are unavailable: {0}")]
    ResourcesUnavailable(#[source] FetchError),
    #[error("district resources could not be decoded: {0}")]
    ResourcesMalformed(#[source] DecodeError),
    #[error("district resources contain no renderable districts")]
    NoDistricts,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}
