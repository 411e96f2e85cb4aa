//! earlyflush-web — HTTP surface for the early-head demo.
//!
//! Provides axum route handlers that serve the same quest page two ways:
//! streamed (head first, body after the delay) and buffered (nothing until
//! the whole page is ready).
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page with both variants side by side |
//! | GET | `/streaming` | Head chunk immediately, body after the delay |
//! | GET | `/blocking` | Whole page after the delay |
//! | GET | `/debug/config` | Process-wide quest config as JSON |
//! | GET | `/health` | Liveness |
//! | GET | `/assets/quest.css`, `/assets/quest.js` | Static assets |
//!
//! Page routes accept `dungeon_delay_ms` and `armor_download_ms` query
//! parameters that override the process config for that request only.
//! Blank values are ignored and values above a minute are capped.

pub mod assets;
pub mod binder;
pub mod blocking;
pub mod handlers;
pub mod pages;

use axum::Router;
use axum::http::header::{self, HeaderName};
use axum::routing::get;
use tokio_util::task::TaskTracker;

use earlyflush_core::chunks::{SCRIPT_URL, STYLESHEET_URL};
use earlyflush_core::{QuestConfig, QuestOverrides, Sleep, SlowOperation};

pub use binder::ResponseBinder;

/// Headers every HTML response carries.
pub const HTML_HEADERS: [(HeaderName, &str); 3] = [
    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::CACHE_CONTROL, "no-store"),
];

/// Shared state for page handlers.
#[derive(Clone)]
pub struct AppState<O = Sleep> {
    pub config: QuestConfig,
    pub binder: ResponseBinder<O>,
}

impl<O> AppState<O> {
    /// The process config with this request's overrides applied, each
    /// capped at [`MAX_OVERRIDE_MS`](earlyflush_core::MAX_OVERRIDE_MS).
    pub fn effective_config(&self, overrides: &QuestOverrides) -> QuestConfig {
        self.config.with_overrides(&overrides.clamped())
    }
}

/// Build the router with the production sleep operation.
pub fn build_router(config: QuestConfig, tracker: TaskTracker) -> Router {
    build_router_with(config, ResponseBinder::new(tracker))
}

/// Build the router around a caller-supplied binder.
pub fn build_router_with<O>(config: QuestConfig, binder: ResponseBinder<O>) -> Router
where
    O: SlowOperation + Clone + 'static,
{
    let state = AppState { config, binder };

    Router::new()
        .route("/", get(pages::landing::<O>))
        .route("/streaming", get(handlers::streaming_page::<O>))
        .route("/blocking", get(handlers::blocking_page::<O>))
        .route("/debug/config", get(handlers::debug_config::<O>))
        .route("/health", get(handlers::health))
        .route(STYLESHEET_URL, get(assets::stylesheet))
        .route(SCRIPT_URL, get(assets::script))
        .with_state(state)
}
