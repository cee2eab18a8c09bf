//! Queue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    /// Error reported by the stream transport while polling.
    #[error("transport error: {message}")]
    Transport { message: String, fatal: bool },

    #[error("publish error: {0}")]
    Publish(String),
}

impl QueueError {
    /// Whether the process can no longer make progress on this connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QueueError::Transport { fatal: true, .. })
    }
}
