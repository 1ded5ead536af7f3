//! Read-only HTTP surface: health, latest Top-K per sentiment, and metrics.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::TopK;
use crate::metrics::Metrics;
use crate::sentiment::Sentiment;
use crate::sink::LatestSink;

#[derive(Clone)]
pub struct AppState {
    pub latest: Arc<LatestSink>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/top", get(top_all))
        .route("/top/{sentiment}", get(top_one))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `create_router` plus `/metrics` when a recorder is installed.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let app = create_router(state);
    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

async fn top_all(State(state): State<AppState>) -> Json<BTreeMap<Sentiment, TopK>> {
    Json(state.latest.snapshot())
}

async fn top_one(
    State(state): State<AppState>,
    Path(sentiment): Path<String>,
) -> Result<Json<TopK>, (StatusCode, String)> {
    let s: Sentiment = sentiment
        .parse()
        .map_err(|e: anyhow::Error| (StatusCode::BAD_REQUEST, e.to_string()))?;
    state
        .latest
        .get(s)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("no window published for {s} yet")))
}

/// Bind and serve until the task is aborted.
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {addr}: {e}"))?;
    tracing::info!(target: "api", %addr, "http surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}
