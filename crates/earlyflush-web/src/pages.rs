//! Landing page.
//!
//! Embeds `/streaming` and `/blocking` in two frames so both load at the
//! same moment with the same effective config.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use earlyflush_core::chunks::{SCRIPT_URL, STYLESHEET_URL};
use earlyflush_core::{QuestConfig, QuestOverrides, SlowOperation};

use crate::{AppState, HTML_HEADERS};

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate<'a> {
    stylesheet: &'a str,
    script: &'a str,
    config: QuestConfig,
    query: String,
}

fn quest_query(config: &QuestConfig) -> String {
    format!(
        "?dungeon_delay_ms={}&armor_download_ms={}",
        config.dungeon_delay_ms, config.armor_download_ms
    )
}

fn render<T: Template>(tmpl: T) -> Response {
    match tmpl.render() {
        Ok(html) => (StatusCode::OK, HTML_HEADERS, html).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            HTML_HEADERS,
            format!("<pre>Template error: {e}</pre>"),
        )
            .into_response(),
    }
}

/// GET /
pub async fn landing<O>(
    State(state): State<AppState<O>>,
    Query(overrides): Query<QuestOverrides>,
) -> Response
where
    O: SlowOperation + Clone + 'static,
{
    let config = state.effective_config(&overrides);
    render(LandingTemplate {
        stylesheet: STYLESHEET_URL,
        script: SCRIPT_URL,
        config,
        query: quest_query(&config),
    })
}
