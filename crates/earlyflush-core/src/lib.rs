//! earlyflush-core — the chunked HTML streaming pipeline.
//!
//! Provides the pieces that let a handler send an HTML `<head>` before the
//! slow part of a page is ready:
//!
//! - [`channel`]: a bounded single-writer byte channel whose readable end
//!   is a `Stream` suitable for an HTTP response body.
//! - [`PhaseStreamer`]: writes the head chunk, waits on a
//!   [`SlowOperation`], writes the body chunk (or an error chunk), and
//!   always closes the channel.
//! - [`QuestConfig`]: the immutable timing configuration threaded through
//!   every request.
//!
//! # Failure Model
//!
//! Once the head chunk is out, the HTTP status is fixed. Failures after
//! that point are reported in-band as an error chunk that still closes the
//! document. A failure writing the head itself ends the stream with no
//! further output.

pub mod channel;
pub mod chunks;
pub mod config;
pub mod error;
mod operation;
mod streamer;

pub use channel::{ChunkSink, ReadableEnd, WritableEnd};
pub use chunks::{PageMode, QuestStats, whole_millis};
pub use config::{MAX_OVERRIDE_MS, QuestConfig, QuestOverrides};
pub use error::{ChannelError, ConfigError, StreamError};
pub use operation::{SlowOperation, Sleep};
pub use streamer::{PhaseStreamer, StreamOutcome, StreamPhase, StreamReport};
