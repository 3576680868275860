//! HTTP surface for the dashboard and scrapers.
//!
//! Endpoints:
//! - `GET /stats`: totals over the last 24 hours
//! - `GET /stats_history`: per-bucket series for one resolution
//! - `POST /stats_reset`: clear every time series
//! - `GET /metrics`: cumulative totals in text exposition format

pub mod error;

pub use error::ApiError;

use crate::core::config::ServerConfig;
use crate::core::{Result, StatsError};
use crate::metrics::Statistics;
use crate::query::{self, HistoryRequest};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const JSON_CONTENT_TYPE: &str = "application/json";
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// API server state.
#[derive(Clone)]
struct ApiState {
    stats: Arc<Statistics>,
}

/// Raw `/stats_history` parameters, validated by [`HistoryRequest::parse`].
#[derive(Debug, Default, Deserialize)]
struct HistoryParams {
    time_unit: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

/// Build the router without binding a socket.
pub fn create_router(stats: Arc<Statistics>, config: &ServerConfig) -> Router {
    let state = ApiState { stats };

    let mut app = Router::new()
        .route("/stats", get(stats_handler))
        .route("/stats_history", get(history_handler))
        .route("/stats_reset", post(reset_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(ServiceBuilder::new().layer(CorsLayer::permissive()));
    }

    app
}

/// Serve the stats API until `shutdown` resolves.
pub async fn start_server<F>(stats: Arc<Statistics>, config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(stats, &config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        StatsError::Io(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            format!("Failed to bind to {}: {}", addr, e),
        ))
    })?;
    tracing::info!("Starting stats API on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            StatsError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("API server error: {}", e),
            ))
        })?;

    tracing::info!("Stats API stopped");
    Ok(())
}

/// GET /stats - Totals over the last day
async fn stats_handler(State(state): State<ApiState>) -> std::result::Result<Response, ApiError> {
    json_response(&query::summary(&state.stats))
}

/// GET /stats_history - Series for one resolution
async fn history_handler(
    State(state): State<ApiState>,
    Query(params): Query<HistoryParams>,
) -> std::result::Result<Response, ApiError> {
    let request = HistoryRequest::parse(
        params.time_unit.as_deref(),
        params.start_time.as_deref(),
        params.end_time.as_deref(),
    )?;

    let report = query::history(
        &state.stats,
        request.resolution,
        request.start_time,
        request.end_time,
        Utc::now(),
    )?;
    json_response(&report)
}

/// POST /stats_reset - Clear all time series
async fn reset_handler(State(state): State<ApiState>) -> impl IntoResponse {
    state.stats.reset(Utc::now());
    "OK\n"
}

/// GET /metrics - Cumulative totals for scrapers
async fn metrics_handler(State(state): State<ApiState>) -> std::result::Result<Response, ApiError> {
    let body = state.stats.export_text()?;
    Ok(([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response())
}

fn json_response<T: Serialize>(value: &T) -> std::result::Result<Response, ApiError> {
    let body = serde_json::to_vec(value).map_err(StatsError::from)?;
    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}
