//! Common test utilities and fixtures.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use dnstally_lib::api::create_router;
use dnstally_lib::core::config::{ExporterConfig, ServerConfig};
use dnstally_lib::metrics::Statistics;
use std::sync::Arc;
use tower::ServiceExt;

/// Fresh engine with default exporter naming.
pub fn statistics() -> Arc<Statistics> {
    Arc::new(Statistics::new(&ExporterConfig::default()).unwrap())
}

/// Router over `stats` with default server settings.
pub fn router(stats: &Arc<Statistics>) -> Router {
    create_router(Arc::clone(stats), &ServerConfig::default())
}

/// Send one request and collect status and body text.
pub async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, "GET", uri).await
}

/// Query-string safe RFC 3339 rendering (`Z` suffix, no `+`).
pub fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `/stats_history` URI for the given unit and window.
pub fn history_uri(unit: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "/stats_history?time_unit={}&start_time={}&end_time={}",
        unit,
        timestamp(start),
        timestamp(end)
    )
}
