//! Error types for the streaming pipeline and config loading.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a chunk channel's writable end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel already closed")]
    Closed,

    #[error("chunk reader went away")]
    ReaderGone,
}

/// Failures inside the guarded streaming region.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("chunk render failed: {0}")]
    Render(#[from] askama::Error),

    #[error("backend operation failed: {0}")]
    Operation(String),
}

impl StreamError {
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
