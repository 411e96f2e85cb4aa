//! Static assets referenced by the head chunk.
//!
//! Embedded at compile time; the pipeline only ever refers to them by URL.

use axum::http::header;
use axum::response::IntoResponse;

const STYLESHEET: &str = include_str!("../assets/quest.css");
const SCRIPT: &str = include_str!("../assets/quest.js");

const ASSET_CACHE_CONTROL: &str = "public, max-age=3600";

/// GET /assets/quest.css
pub async fn stylesheet() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, ASSET_CACHE_CONTROL),
        ],
        STYLESHEET,
    )
}

/// GET /assets/quest.js
pub async fn script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, ASSET_CACHE_CONTROL),
        ],
        SCRIPT,
    )
}
