//! # flowdex-server
//!
//! HTTP API for Flowdex catalogs. Provides:
//!
//! - Listing, filtering and paging of workflows per catalog
//! - Category lists, per-category counts and summary stats
//! - File downloads and on-demand catalog refresh
//! - Health and Prometheus metrics endpoints

pub mod metrics;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use flowdex_catalog::{CatalogRegistry, CatalogService, CatalogSnapshot, ListParams, ListQuery};
use flowdex_config::schema::ServerConfig;
use flowdex_core::FlowdexError;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared server state.
pub struct AppState {
    pub registry: CatalogRegistry,
    /// Prometheus-compatible metrics.
    pub metrics: metrics::Metrics,
}

/// Error returned by every fallible handler; rendered as `{"error": msg}`.
#[derive(Debug)]
pub struct ApiError(pub FlowdexError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            FlowdexError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            FlowdexError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FlowdexError> for ApiError {
    fn from(e: FlowdexError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let message = match &self.0 {
            FlowdexError::InvalidQuery(m) | FlowdexError::NotFound(m) => m.clone(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

impl AppState {
    fn fail(&self, e: impl Into<ApiError>) -> ApiError {
        self.metrics.inc_http_errors();
        e.into()
    }

    /// Resolve a catalog and make sure its snapshot exists. The first scan
    /// runs on the blocking pool.
    async fn catalog(&self, name: &str) -> ApiResult<Arc<CatalogService>> {
        let service = Arc::clone(self.registry.require(name).map_err(|e| self.fail(e))?);
        if !service.is_loaded() {
            let svc = Arc::clone(&service);
            let snapshot = run_blocking(move || Ok(svc.snapshot()))
                .await
                .map_err(|e| self.fail(e))?;
            self.metrics.record_scan(snapshot.skipped.len());
        }
        Ok(service)
    }
}

async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> flowdex_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError),
        Err(e) => Err(ApiError(FlowdexError::Other(anyhow::anyhow!(
            "blocking task failed: {}",
            e
        )))),
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    catalogs: Vec<String>,
}

#[derive(Serialize)]
struct CatalogSummary {
    name: String,
    kind: &'static str,
    total: usize,
    skipped: usize,
    generation: u64,
    built_at: String,
}

#[derive(Serialize)]
struct ListResponse {
    workflows: Vec<flowdex_core::CatalogItem>,
    total: usize,
    page: usize,
    per_page: usize,
    pages: usize,
}

#[derive(Serialize)]
struct RefreshResponse {
    message: String,
    total: usize,
    skipped: Vec<flowdex_core::SkippedFile>,
}

/// Build the Axum router.
pub fn build_router(config: ServerConfig, registry: CatalogRegistry) -> Router {
    let state = Arc::new(AppState {
        registry,
        metrics: metrics::Metrics::new(),
    });

    let api_routes = Router::new()
        .route("/api/v1/catalogs", get(catalogs_handler))
        .route("/api/v1/{catalog}/workflows", get(list_handler))
        .route("/api/v1/{catalog}/workflows/{id}", get(detail_handler))
        .route("/api/v1/{catalog}/categories", get(categories_handler))
        .route(
            "/api/v1/{catalog}/category-counts",
            get(category_counts_handler),
        )
        .route("/api/v1/{catalog}/stats", get(stats_handler))
        .route(
            "/api/v1/{catalog}/download/{filename}",
            get(download_handler),
        )
        .route(
            "/api/v1/{catalog}/refresh",
            get(refresh_handler).post(refresh_handler),
        );

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    state.metrics.inc_http_requests();
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        catalogs: state.registry.names().into_iter().map(String::from).collect(),
    })
}

/// Prometheus-compatible metrics endpoint.
async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> (
    StatusCode,
    [(axum::http::header::HeaderName, &'static str); 1],
    String,
) {
    let body = state.metrics.render_prometheus();
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

fn summary(service: &CatalogService, snapshot: &CatalogSnapshot) -> CatalogSummary {
    CatalogSummary {
        name: service.name().to_string(),
        kind: service.kind(),
        total: snapshot.items.len(),
        skipped: snapshot.skipped.len(),
        generation: snapshot.generation,
        built_at: snapshot.built_at.to_rfc3339(),
    }
}

async fn catalogs_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    state.metrics.inc_http_requests();
    let mut catalogs = Vec::new();
    for name in state.registry.names() {
        let service = state.catalog(name).await?;
        catalogs.push(summary(&service, &service.snapshot()));
    }
    Ok(Json(serde_json::json!({ "catalogs": catalogs })))
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    state.metrics.inc_http_requests();
    let query = ListQuery::from_params(&params).map_err(|e| state.fail(e))?;
    let service = state.catalog(&catalog).await?;
    let page = service.list(&query);
    Ok(Json(ListResponse {
        workflows: page.items,
        total: page.total,
        page: page.page,
        per_page: page.page_size,
        pages: page.page_count,
    }))
}

async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Path((catalog, id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    state.metrics.inc_http_requests();
    let service = state.catalog(&catalog).await?;
    let detail = run_blocking(move || service.get(&id))
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(detail))
}

async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.metrics.inc_http_requests();
    let service = state.catalog(&catalog).await?;
    Ok(Json(serde_json::json!({ "categories": service.categories() })))
}

async fn category_counts_handler(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.metrics.inc_http_requests();
    let service = state.catalog(&catalog).await?;
    let counts: serde_json::Map<String, serde_json::Value> = service
        .category_counts()
        .into_iter()
        .map(|(id, n)| (id, n.into()))
        .collect();
    Ok(Json(serde_json::json!({ "counts": counts })))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.metrics.inc_http_requests();
    let service = state.catalog(&catalog).await?;
    Ok(Json(service.stats()))
}

/// Serve one file as an attachment.
async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path((catalog, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    state.metrics.inc_http_requests();
    let service = state.catalog(&catalog).await?;
    let path = service.locate(&filename).map_err(|e| state.fail(e))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| state.fail(FlowdexError::Io(e)))?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.as_ref())
        .map_err(|e| state.fail(FlowdexError::Other(e.into())))?;
    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .map_err(|e| state.fail(FlowdexError::Other(e.into())))?;

    state.metrics.inc_downloads();
    info!(catalog = %catalog, filename = %filename, bytes = bytes.len(), "serving download");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
) -> ApiResult<Json<RefreshResponse>> {
    state.metrics.inc_http_requests();
    let service = Arc::clone(state.registry.require(&catalog).map_err(|e| state.fail(e))?);
    let snapshot = run_blocking(move || Ok(service.refresh()))
        .await
        .map_err(|e| state.fail(e))?;

    state.metrics.inc_refreshes();
    state.metrics.record_scan(snapshot.skipped.len());

    Ok(Json(RefreshResponse {
        message: format!("catalog '{}' refreshed", catalog),
        total: snapshot.items.len(),
        skipped: snapshot.skipped.clone(),
    }))
}

/// `Content-Disposition` value with an ASCII fallback name and the UTF-8
/// name percent-encoded per RFC 5987.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded)
}

/// Start the HTTP server.
pub async fn start_server(config: ServerConfig, registry: CatalogRegistry) -> flowdex_core::Result<()> {
    let listen = config.listen.clone();
    let catalogs = registry.names().join(", ");
    let router = build_router(config, registry);

    info!(listen = %listen, catalogs = %catalogs, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| FlowdexError::Other(anyhow::anyhow!("failed to bind {}: {}", listen, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| FlowdexError::Other(anyhow::anyhow!("server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_ascii() {
        assert_eq!(
            content_disposition("Workflow-X1_a-draft-2.zip"),
            "attachment; filename=\"Workflow-X1_a-draft-2.zip\"; filename*=UTF-8''Workflow-X1_a-draft-2.zip"
        );
    }

    #[test]
    fn content_disposition_unicode() {
        let value = content_disposition("翻译.yml");
        assert!(value.starts_with("attachment; filename=\"__.yml\""));
        assert!(value.ends_with("filename*=UTF-8''%E7%BF%BB%E8%AF%91.yml"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            ApiError(FlowdexError::InvalidQuery("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(FlowdexError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(FlowdexError::Mapping("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
