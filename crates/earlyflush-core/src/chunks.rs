//! HTML chunk rendering.
//!
//! A page is delivered as a head chunk followed by either a body chunk or
//! an error chunk. The head chunk leaves `<html>`, `<body>` and `<main>`
//! open; both tail chunks close all three, so the browser always ends up
//! with a complete document.

use std::fmt;
use std::time::Duration;

use askama::Template;
use bytes::Bytes;

use crate::config::QuestConfig;
use crate::error::StreamError;

pub const STYLESHEET_URL: &str = "/assets/quest.css";
pub const SCRIPT_URL: &str = "/assets/quest.js";

/// Used when the error chunk itself cannot be rendered.
pub const FALLBACK_ERROR_CHUNK: &str = "<section class=\"quest-error\" role=\"alert\">\
<h2>The quest failed</h2><p>An unknown error occurred.</p></section>\
</main>\n</body>\n</html>\n";

/// Which delivery strategy a page was rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Streaming,
    Blocking,
}

impl PageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Blocking => "blocking",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Streaming => "Early head (streamed)",
            Self::Blocking => "Full page (buffered)",
        }
    }
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing figures reported in the body chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestStats {
    pub dungeon_delay_ms: u64,
    pub armor_download_ms: u64,
    pub waited_ms: u64,
}

impl QuestStats {
    pub fn new(config: &QuestConfig, waited: Duration) -> Self {
        Self {
            dungeon_delay_ms: config.dungeon_delay_ms,
            armor_download_ms: config.armor_download_ms,
            waited_ms: whole_millis(waited),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Template)]
#[template(path = "head_chunk.html")]
struct HeadChunk<'a> {
    title: &'a str,
    mode: &'a str,
    stylesheet: &'a str,
    script: &'a str,
    dungeon_delay_ms: u64,
    armor_download_ms: u64,
}

#[derive(Template)]
#[template(path = "body_chunk.html")]
struct BodyChunk<'a> {
    mode: &'a str,
    stats: QuestStats,
}

#[derive(Template)]
#[template(path = "error_chunk.html")]
struct ErrorChunk<'a> {
    message: &'a str,
}

pub fn head_chunk(config: &QuestConfig, mode: PageMode) -> Result<Bytes, StreamError> {
    let html = HeadChunk {
        title: mode.title(),
        mode: mode.as_str(),
        stylesheet: STYLESHEET_URL,
        script: SCRIPT_URL,
        dungeon_delay_ms: config.dungeon_delay_ms,
        armor_download_ms: config.armor_download_ms,
    }
    .render()?;
    Ok(Bytes::from(html))
}

pub fn body_chunk(stats: &QuestStats, mode: PageMode) -> Result<Bytes, StreamError> {
    let html = BodyChunk {
        mode: mode.as_str(),
        stats: *stats,
    }
    .render()?;
    Ok(Bytes::from(html))
}

/// Render the error chunk, falling back to a static chunk on failure.
pub fn error_chunk(message: &str) -> Bytes {
    match (ErrorChunk { message }).render() {
        Ok(html) => Bytes::from(html),
        Err(e) => {
            tracing::warn!(error = %e, "error chunk render failed, using fallback");
            Bytes::from_static(FALLBACK_ERROR_CHUNK.as_bytes())
        }
    }
}

/// A complete document: head and body rendered back to back.
pub fn full_page(
    config: &QuestConfig,
    stats: &QuestStats,
    mode: PageMode,
) -> Result<Bytes, StreamError> {
    let head = head_chunk(config, mode)?;
    let body = body_chunk(stats, mode)?;
    let mut page = Vec::with_capacity(head.len() + body.len());
    page.extend_from_slice(&head);
    page.extend_from_slice(&body);
    Ok(Bytes::from(page))
}
