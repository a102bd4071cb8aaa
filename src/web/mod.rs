pub(crate) mod assets;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    attribute::{ResourceAttribute, ATTRIBUTE_TABLE},
    cache::CacheEntryInfo,
    client::JsonSource,
    pipeline::Atlas,
};

pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize)]
struct MapQuery {
    attribute: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct AttributeInfo {
    key: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct CacheCleared {
    cleared: usize,
}

pub fn router<S: JsonSource + 'static>(atlas: Arc<Atlas<S>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/attributes", get(attributes))
        .route("/api/map", get(map_document::<S>))
        .route("/api/cache", get(cache_entries::<S>).delete(clear_cache::<S>))
        .with_state(atlas)
}

/// Serve the map UI. District resources are loaded once before binding so an
/// unavailable resources endpoint stops startup.
pub async fn run<S: JsonSource + 'static>(atlas: Atlas<S>, config: WebServerConfig) -> Result<()> {
    let districts = atlas
        .load_districts()
        .await
        .context("cannot start without district data")?;
    info!(districts = districts.len(), "district resources loaded");

    let router = router(Arc::new(atlas));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let listener = TcpListener::bind(addr).await?;
    info!("district map live at http://{addr} (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web UI");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn attributes() -> Json<Vec<AttributeInfo>> {
    Json(
        ATTRIBUTE_TABLE
            .iter()
            .map(|descriptor| AttributeInfo {
                key: descriptor.key,
                label: descriptor.label,
            })
            .collect(),
    )
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

async fn map_document<S: JsonSource + 'static>(
    State(atlas): State<Arc<Atlas<S>>>,
    Query(query): Query<MapQuery>,
) -> Response {
    let attribute = match query.attribute.as_deref() {
        Some(name) => match name.parse::<ResourceAttribute>() {
            Ok(attribute) => attribute,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        },
        None => ResourceAttribute::default(),
    };

    match atlas.render(attribute).await {
        Ok(output) => Json(output.document).into_response(),
        Err(err) => {
            error!("render failed: {err}");
            error_response(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

async fn cache_entries<S: JsonSource + 'static>(
    State(atlas): State<Arc<Atlas<S>>>,
) -> Json<Vec<CacheEntryInfo>> {
    Json(atlas.cache().entries())
}

async fn clear_cache<S: JsonSource + 'static>(
    State(atlas): State<Arc<Atlas<S>>>,
) -> Json<CacheCleared> {
    let cleared = atlas.cache().clear();
    info!(cleared, "fetch cache cleared");
    Json(CacheCleared { cleared })
}
