//! Binds a chunk channel to an outbound response.
//!
//! [`ResponseBinder::bind`] returns the response as soon as the channel
//! exists; the streamer runs afterwards as a task on the server's
//! [`TaskTracker`]. The tracker is what keeps the task accounted for after
//! the handler has returned, so shutdown can wait for it.
//!
//! The status and headers are fixed before the first chunk is produced.
//! A failure later in the stream cannot change them; it shows up in-band
//! as an error chunk.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info_span};

use earlyflush_core::{PageMode, PhaseStreamer, QuestConfig, Sleep, SlowOperation, channel};

use crate::HTML_HEADERS;

#[derive(Clone)]
pub struct ResponseBinder<O = Sleep> {
    tracker: TaskTracker,
    operation: O,
}

impl ResponseBinder<Sleep> {
    pub fn new(tracker: TaskTracker) -> Self {
        Self::with_operation(tracker, Sleep)
    }
}

impl<O> ResponseBinder<O>
where
    O: SlowOperation + Clone + 'static,
{
    pub fn with_operation(tracker: TaskTracker, operation: O) -> Self {
        Self { tracker, operation }
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// Open a fresh channel, spawn its streamer, and return the response.
    ///
    /// Never waits on the streamer. Each call owns its own channel and
    /// task.
    pub fn bind(&self, config: QuestConfig) -> Response {
        let (reader, mut writer) = channel::open();
        let streamer = PhaseStreamer::new(config, PageMode::Streaming, self.operation.clone());

        let span = info_span!(
            "stream",
            dungeon_delay_ms = config.dungeon_delay_ms,
            armor_download_ms = config.armor_download_ms
        );
        self.tracker.spawn(
            async move {
                let report = streamer.run(&mut writer).await;
                debug!(
                    outcome = report.outcome.label(),
                    bytes = writer.bytes_written(),
                    "stream task finished"
                );
            }
            .instrument(span),
        );

        (StatusCode::OK, HTML_HEADERS, Body::from_stream(reader)).into_response()
    }
}
