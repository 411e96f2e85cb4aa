//! Phased HTML streaming.
//!
//! [`PhaseStreamer::run`] drives one page through a fixed protocol against
//! a [`ChunkSink`]:
//!
//! ```text
//! NotStarted ─ head ─▶ HeadSent ─▶ Delaying ─ ok ──▶ BodySent ──┐
//!     │                               │                          ├─▶ Closed
//!     │                               └─ err ─▶ ErrorSent ───────┤
//!     └─ head write failed ──────────────────────────────────────┘
//! ```
//!
//! The head write, the delay and the body write form one guarded region.
//! A failure after the head has gone out replaces the body chunk with an
//! error chunk. Whatever happens inside the region, the sink is closed
//! exactly once afterwards. Nothing is retried.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::channel::ChunkSink;
use crate::chunks::{self, PageMode, QuestStats};
use crate::config::QuestConfig;
use crate::error::{ChannelError, StreamError};
use crate::operation::SlowOperation;

/// Where a streaming attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    NotStarted,
    HeadSent,
    Delaying,
    BodySent,
    ErrorSent,
    Closed,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::HeadSent => "head_sent",
            Self::Delaying => "delaying",
            Self::BodySent => "body_sent",
            Self::ErrorSent => "error_sent",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Terminal result of one streaming attempt.
#[derive(Debug)]
pub enum StreamOutcome {
    /// Head and body written.
    Completed,
    /// Head written, then the delay or body write failed.
    Failed { error: StreamError },
    /// The head itself could not be written.
    Aborted { error: StreamError },
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Everything the background task knows once a run is over.
#[derive(Debug)]
pub struct StreamReport {
    pub outcome: StreamOutcome,
    /// Phases in the order they were entered, always ending in `Closed`.
    pub trail: Vec<StreamPhase>,
    /// Time spent in the slow operation, if it was reached.
    pub waited: Option<Duration>,
    /// A suppressed failure from the final close.
    pub close_error: Option<ChannelError>,
}

/// Runs the head / delay / body / close protocol for one page.
#[derive(Debug, Clone)]
pub struct PhaseStreamer<O> {
    config: QuestConfig,
    mode: PageMode,
    operation: O,
}

struct Progress {
    trail: Vec<StreamPhase>,
    waited: Option<Duration>,
}

impl Progress {
    fn enter(&mut self, phase: StreamPhase) {
        debug!(%phase, "stream phase");
        self.trail.push(phase);
    }
}

impl<O: SlowOperation> PhaseStreamer<O> {
    pub fn new(config: QuestConfig, mode: PageMode, operation: O) -> Self {
        Self {
            config,
            mode,
            operation,
        }
    }

    /// Stream one page into `sink`, then close it.
    pub async fn run<S: ChunkSink>(&self, sink: &mut S) -> StreamReport {
        let mut progress = Progress {
            trail: vec![StreamPhase::NotStarted],
            waited: None,
        };

        let outcome = match self.guarded(sink, &mut progress).await {
            Ok(()) => StreamOutcome::Completed,
            Err(GuardedError::BeforeHead(error)) => StreamOutcome::Aborted { error },
            Err(GuardedError::AfterHead(error)) => {
                let chunk = chunks::error_chunk(&error.to_string());
                match sink.write(chunk).await {
                    Ok(()) => progress.enter(StreamPhase::ErrorSent),
                    Err(e) => warn!(error = %e, "error chunk not delivered"),
                }
                StreamOutcome::Failed { error }
            }
        };

        let close_error = match sink.close().await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "close failed, suppressing");
                Some(e)
            }
        };
        progress.enter(StreamPhase::Closed);

        match &outcome {
            StreamOutcome::Completed => info!(
                mode = %self.mode,
                waited_ms = progress.waited.map(chunks::whole_millis),
                "stream completed"
            ),
            StreamOutcome::Failed { error } => {
                warn!(mode = %self.mode, error = %error, "stream failed after head")
            }
            StreamOutcome::Aborted { error } => {
                warn!(mode = %self.mode, error = %error, "stream aborted before head")
            }
        }

        StreamReport {
            outcome,
            trail: progress.trail,
            waited: progress.waited,
            close_error,
        }
    }

    async fn guarded<S: ChunkSink>(
        &self,
        sink: &mut S,
        progress: &mut Progress,
    ) -> Result<(), GuardedError> {
        let head = chunks::head_chunk(&self.config, self.mode).map_err(GuardedError::BeforeHead)?;
        sink.write(head)
            .await
            .map_err(|e| GuardedError::BeforeHead(e.into()))?;
        progress.enter(StreamPhase::HeadSent);

        progress.enter(StreamPhase::Delaying);
        let started = Instant::now();
        let performed = self.operation.perform(self.config.dungeon_delay()).await;
        let waited = started.elapsed();
        progress.waited = Some(waited);
        performed.map_err(GuardedError::AfterHead)?;

        let stats = QuestStats::new(&self.config, waited);
        let body = chunks::body_chunk(&stats, self.mode).map_err(GuardedError::AfterHead)?;
        sink.write(body)
            .await
            .map_err(|e| GuardedError::AfterHead(e.into()))?;
        progress.enter(StreamPhase::BodySent);

        Ok(())
    }
}

enum GuardedError {
    BeforeHead(StreamError),
    AfterHead(StreamError),
}
