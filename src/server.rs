//! HTTP API for the drill dashboard.
//!
//! This module provides an HTTP server that:
//! - Serves the most recent samples from the feed
//! - Serves the current feature window, channel summary and predictions
//! - Accepts manually entered samples via POST /samples
//!
//! # Architecture
//!
//! ```text
//! Dashboard ──→ GET /samples, /window, /summary, /predictions ──→ drill-sensor
//!           ──→ POST /samples ──→ [Sample Feed] ──→ monitor ──→ predictors
//! ```

use crate::core::features::FeatureWindow;
use crate::core::summary::WindowSummary;
use crate::core::windowing::{FeedError, SharedFeed};
use crate::monitor::{PredictionReport, SharedReport};
use crate::sensor::types::{PartialSample, Sample};
use crate::stats::SharedRunLog;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Samples per feature window
    pub window_size: usize,
    /// Drill identifier reported by /health
    pub drill_id: String,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, window_size: usize, drill_id: impl Into<String>) -> Self {
        Self {
            port,
            window_size: window_size.max(1),
            drill_id: drill_id.into(),
        }
    }
}

/// Shared server state
pub struct ServerState {
    feed: SharedFeed,
    report: SharedReport,
    log: SharedRunLog,
    window_size: usize,
    drill_id: String,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: &ServerConfig,
        feed: SharedFeed,
        report: SharedReport,
        log: SharedRunLog,
    ) -> Self {
        Self {
            feed,
            report,
            log,
            window_size: config.window_size,
            drill_id: config.drill_id.clone(),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub drill_id: String,
    pub samples_retained: usize,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Query for GET /samples
#[derive(Debug, Deserialize)]
pub struct SamplesQuery {
    pub limit: Option<usize>,
}

/// Response for GET /window
#[derive(Debug, Serialize)]
pub struct WindowResponse {
    /// Whether the window has the full length the predictors expect
    pub ready: bool,
    pub required: usize,
    pub full_sequence: Vec<[f64; crate::core::features::FEATURE_COUNT]>,
    pub temperature_excluded: Vec<f64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        drill_id: state.drill_id.clone(),
        samples_retained: state.feed.len(),
    })
}

/// GET /samples?limit=N
///
/// Newest first, at most the feed capacity.
async fn list_samples(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SamplesQuery>,
) -> Json<Vec<Sample>> {
    let limit = query.limit.unwrap_or(state.feed.capacity());
    Json(state.feed.latest(limit))
}

/// POST /samples
///
/// Accepts a manually entered reading; missing channels are stored as zero.
/// Negative or non-finite channels are rejected with 400.
async fn add_sample(
    State(state): State<Arc<ServerState>>,
    Json(partial): Json<PartialSample>,
) -> Result<(StatusCode, Json<Sample>), ApiError> {
    if let Some(channel) = partial.invalid_channel() {
        tracing::warn!(channel, "Rejected manual sample");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("{channel} must be a finite, non-negative number"),
            "INVALID_SAMPLE",
        ));
    }

    let mut sample = Sample::from(partial);
    sample.recorded_at = None;

    match state.feed.append(sample) {
        Ok(stored) => {
            tracing::info!(rpm = stored.rpm, "Manual sample added");
            Ok((StatusCode::CREATED, Json(stored)))
        }
        Err(e) => {
            state.log.record_append_failure();
            tracing::error!("Failed to append manual sample: {}", e);
            let code = match e {
                FeedError::Closed => "FEED_CLOSED",
                FeedError::Poisoned => "FEED_ERROR",
            };
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string(), code))
        }
    }
}

/// GET /window
async fn current_window(State(state): State<Arc<ServerState>>) -> Json<WindowResponse> {
    let samples = state.feed.window(state.window_size);
    let window = FeatureWindow::from_samples(&samples);

    Json(WindowResponse {
        ready: window.len() == state.window_size,
        required: state.window_size,
        full_sequence: window.full_sequence(),
        temperature_excluded: window.temperature_excluded(),
    })
}

/// GET /summary
async fn summary(State(state): State<Arc<ServerState>>) -> Result<Json<WindowSummary>, ApiError> {
    let samples = state.feed.window(state.window_size);
    WindowSummary::from_samples(&samples)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No samples recorded yet", "NO_SAMPLES"))
}

/// GET /predictions
async fn predictions(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<PredictionReport>, ApiError> {
    let report = state
        .report
        .read()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "STATE_ERROR"))?
        .clone();

    report.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "No window has been evaluated yet",
            "NO_PREDICTIONS",
        )
    })
}

/// Whether an origin is a local dashboard: `localhost` or `127.0.0.1` over
/// http or https, on any port.
pub fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    let port_ok = match port {
        Some(port) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    };

    port_ok && matches!(host, "localhost" | "127.0.0.1")
}

/// Build the API router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/samples", get(list_samples).post(add_sample))
        .route("/window", get(current_window))
        .route("/summary", get(summary))
        .route("/predictions", get(predictions))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|origin, _| is_local_origin(origin)))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    feed: SharedFeed,
    report: SharedReport,
    log: SharedRunLog,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config, feed, report, log));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Drill dashboard API listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins_on_any_port() {
        for origin in [
            "http://localhost",
            "http://localhost:3000",
            "http://127.0.0.1:8080",
            "https://localhost:5173",
        ] {
            assert!(is_local_origin(&HeaderValue::from_static(origin)), "{origin}");
        }
    }

    #[test]
    fn test_foreign_origins_rejected() {
        for origin in [
            "http://example.com",
            "http://localhost.example.com",
            "http://localhost:",
            "http://localhost:80/path",
            "http://127.0.0.1:abc",
            "null",
            "file://localhost",
        ] {
            assert!(!is_local_origin(&HeaderValue::from_static(origin)), "{origin}");
        }
    }
}
