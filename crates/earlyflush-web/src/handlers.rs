//! Page and JSON handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::debug;

use earlyflush_core::{QuestOverrides, SlowOperation};

use crate::AppState;
use crate::blocking;

// ── Pages ──────────────────────────────────────────────────────

/// GET /streaming
pub async fn streaming_page<O>(
    State(state): State<AppState<O>>,
    Query(overrides): Query<QuestOverrides>,
) -> Response
where
    O: SlowOperation + Clone + 'static,
{
    let config = state.effective_config(&overrides);
    debug!(?config, overridden = !overrides.is_empty(), "streaming page");
    state.binder.bind(config)
}

/// GET /blocking
pub async fn blocking_page<O>(
    State(state): State<AppState<O>>,
    Query(overrides): Query<QuestOverrides>,
) -> Response
where
    O: SlowOperation + Clone + 'static,
{
    let config = state.effective_config(&overrides);
    debug!(?config, overridden = !overrides.is_empty(), "blocking page");
    blocking::render(config, state.binder.operation()).await
}

// ── Debug ──────────────────────────────────────────────────────

/// GET /debug/config
pub async fn debug_config<O>(State(state): State<AppState<O>>) -> impl IntoResponse
where
    O: SlowOperation + Clone + 'static,
{
    Json(state.config)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
