//! Buffered rendering, the contrast case.
//!
//! Waits out the whole delay before building any response, then sends the
//! page as one body with a known length. Because nothing has been sent
//! when the slow operation fails, this path can still answer with a 500.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::time::Instant;
use tracing::{info, warn};

use earlyflush_core::chunks::{self, PageMode, QuestStats};
use earlyflush_core::{QuestConfig, SlowOperation, StreamError, whole_millis};

use crate::HTML_HEADERS;

pub async fn render<O: SlowOperation>(config: QuestConfig, operation: &O) -> Response {
    let started = Instant::now();
    let page = match operation.perform(config.dungeon_delay()).await {
        Ok(()) => {
            let stats = QuestStats::new(&config, started.elapsed());
            chunks::full_page(&config, &stats, PageMode::Blocking)
        }
        Err(e) => Err(e),
    };

    match page {
        Ok(page) => {
            info!(waited_ms = whole_millis(started.elapsed()), "blocking page rendered");
            html_response(StatusCode::OK, page)
        }
        Err(e) => {
            warn!(error = %e, "blocking page failed");
            html_response(StatusCode::INTERNAL_SERVER_ERROR, error_page(&config, &e))
        }
    }
}

fn error_page(config: &QuestConfig, error: &StreamError) -> Bytes {
    let tail = chunks::error_chunk(&error.to_string());
    let mut page = match chunks::head_chunk(config, PageMode::Blocking) {
        Ok(head) => head.to_vec(),
        Err(_) => b"<!DOCTYPE html>\n<html lang=\"en\">\n<body>\n<main>\n".to_vec(),
    };
    page.extend_from_slice(&tail);
    Bytes::from(page)
}

fn html_response(status: StatusCode, page: Bytes) -> Response {
    (
        status,
        HTML_HEADERS,
        [(header::CONTENT_LENGTH, page.len().to_string())],
        page,
    )
        .into_response()
}
