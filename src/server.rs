// src/server.rs
//! Static file server plus the two manifest endpoints and the metadata proxy
//! the gallery can route its fetches through.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info};

use crate::config::{AppConfig, ManifestSource};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_root: PathBuf,
    pub images_manifest: ManifestSource,
    pub metadata_manifest: ManifestSource,
}

impl ServerConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], cfg.server_port)),
            static_root: cfg.static_root.clone(),
            images_manifest: cfg.images_manifest.clone(),
            metadata_manifest: cfg.metadata_manifest.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct ServerState {
    client: reqwest::Client,
    images_manifest: ManifestSource,
    metadata_manifest: ManifestSource,
}

type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(cfg: &ServerConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .user_agent("apegal/proxy")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            images_manifest: cfg.images_manifest.clone(),
            metadata_manifest: cfg.metadata_manifest.clone(),
        })
    }
}

pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(ServerState::new(&config)?);
    let router = build_router(state, config.static_root.clone());
    let listener = TcpListener::bind(config.addr).await?;
    info!(
        "Midnight Apes Gallery server running at http://localhost:{}",
        config.addr.port()
    );
    info!("Serving files from: {}", config.static_root.display());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router(state: SharedState, static_root: PathBuf) -> Router {
    Router::new()
        .route("/api/images", get(api_images))
        .route("/api/metadata", get(api_metadata))
        .route("/api/proxy", get(api_proxy))
        .with_state(state)
        .fallback_service(ServeDir::new(static_root))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn read_manifest_text(
    client: &reqwest::Client,
    source: &ManifestSource,
) -> Result<String, String> {
    match source {
        ManifestSource::Local(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("{}: {e}", path.display())),
        ManifestSource::Remote(url) => {
            let resp = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| format!("{url}: {e}"))?;
            resp.text().await.map_err(|e| format!("{url}: {e}"))
        }
    }
}

async fn api_images(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    match read_manifest_text(&state.client, &state.images_manifest).await {
        Ok(data) => Ok(Json(json!({ "data": data }))),
        Err(e) => {
            error!("Error reading images CSV: {e}");
            Err(ApiError::internal("Failed to read images data"))
        }
    }
}

async fn api_metadata(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    match read_manifest_text(&state.client, &state.metadata_manifest).await {
        Ok(data) => Ok(Json(json!({ "data": data }))),
        Err(e) => {
            error!("Error reading metadata CSV: {e}");
            Err(ApiError::internal("Failed to read metadata data"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    url: Option<String>,
}

/// Fetch `url` and relay its JSON body. The upstream status is not checked:
/// whatever parses as JSON is passed through. Any target is allowed.
async fn api_proxy(
    State(state): State<SharedState>,
    Query(params): Query<ProxyParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return Err(ApiError::bad_request("URL parameter is required"));
    };

    let fetched = match state.client.get(&url).send().await {
        Ok(resp) => resp.json::<Value>().await,
        Err(e) => Err(e),
    };

    fetched.map(Json).map_err(|e| {
        error!("Proxy error for {url}: {e}");
        ApiError::internal("Failed to fetch data")
    })
}
