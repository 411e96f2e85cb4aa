//! The simulated backend work performed between head and body chunks.

use std::future::Future;
use std::time::Duration;

use crate::error::StreamError;

/// Work the streamer awaits between the head chunk and the body chunk.
pub trait SlowOperation: Send + Sync {
    fn perform(&self, delay: Duration) -> impl Future<Output = Result<(), StreamError>> + Send;
}

/// Sleeps on the tokio timer. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sleep;

impl SlowOperation for Sleep {
    async fn perform(&self, delay: Duration) -> Result<(), StreamError> {
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
