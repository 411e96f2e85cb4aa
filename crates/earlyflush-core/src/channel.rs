//! Single-writer, single-reader byte channel.
//!
//! [`open()`] returns a [`ReadableEnd`] that the HTTP transport drains as a
//! `Stream` and a [`WritableEnd`] that exactly one producer writes to.
//! Chunks arrive in write order, each exactly once. The queue is bounded,
//! so a slow reader parks the writer on `write`; that is the only
//! backpressure the channel applies.
//!
//! Closing releases the sender; the reader sees end-of-stream once every
//! queued chunk has been drained. Dropping the writable end has the same
//! effect, which keeps the stream terminated even if the producer task
//! unwinds.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::ChannelError;

/// Queue depth used by [`open()`].
pub const DEFAULT_CAPACITY: usize = 8;

/// Open a channel with [`DEFAULT_CAPACITY`].
pub fn open() -> (ReadableEnd, WritableEnd) {
    open_with_capacity(DEFAULT_CAPACITY)
}

/// Open a channel holding at most `capacity` undelivered chunks.
pub fn open_with_capacity(capacity: usize) -> (ReadableEnd, WritableEnd) {
    assert!(capacity > 0, "capacity must be > 0");
    let (tx, rx) = mpsc::channel(capacity);
    (
        ReadableEnd { rx },
        WritableEnd {
            tx: Some(tx),
            bytes_written: 0,
        },
    )
}

/// Consumer side, handed to the response body.
#[derive(Debug)]
pub struct ReadableEnd {
    rx: mpsc::Receiver<Bytes>,
}

impl Stream for ReadableEnd {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|chunk| chunk.map(Ok))
    }
}

/// Producer side, owned by the streaming task.
#[derive(Debug)]
pub struct WritableEnd {
    tx: Option<mpsc::Sender<Bytes>>,
    bytes_written: u64,
}

impl WritableEnd {
    /// Enqueue a chunk for the reader.
    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> Result<(), ChannelError> {
        let chunk = chunk.into();
        let tx = self.tx.as_ref().ok_or(ChannelError::Closed)?;
        if chunk.is_empty() {
            return Ok(());
        }

        let len = chunk.len() as u64;
        tx.send(chunk).await.map_err(|_| ChannelError::ReaderGone)?;
        self.bytes_written += len;
        trace!(len, total = self.bytes_written, "chunk enqueued");
        Ok(())
    }

    /// Signal that no more chunks follow.
    ///
    /// Repeated calls are no-ops. Returns `ReaderGone` when the reader had
    /// already been dropped; the sender is released either way.
    pub fn close(&mut self) -> Result<(), ChannelError> {
        let Some(tx) = self.tx.take() else {
            debug!("close on an already closed channel");
            return Ok(());
        };

        if tx.is_closed() {
            return Err(ChannelError::ReaderGone);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Destination for streamed chunks.
///
/// Implemented by [`WritableEnd`]; the streamer only sees this trait, so
/// it does not care what carries the bytes.
pub trait ChunkSink: Send {
    fn write(&mut self, chunk: Bytes) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

impl ChunkSink for WritableEnd {
    fn write(&mut self, chunk: Bytes) -> impl Future<Output = Result<(), ChannelError>> + Send {
        WritableEnd::write(self, chunk)
    }

    fn close(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send {
        std::future::ready(WritableEnd::close(self))
    }
}
