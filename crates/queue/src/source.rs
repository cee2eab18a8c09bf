//! Inbound event source trait and message type.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::QueueError;

/// A raw message pulled from the document stream.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    /// Provider-specific position, e.g. `documents/3@1042` for Kafka.
    pub id: String,
    pub key: Option<String>,
    /// Raw payload (JSON).
    pub body: Vec<u8>,
    /// When the message was produced, or when it was received if the
    /// provider carries no timestamp.
    pub timestamp: DateTime<Utc>,
}

impl StreamMessage {
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Trait for inbound stream backends.
///
/// Implementations own the subscription; the ingest loop only polls.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Wait up to `timeout` for the next message.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Transport problems
    /// come back as [`QueueError::Transport`]; check
    /// [`QueueError::is_fatal`] before giving up on the source.
    async fn poll(&self, timeout: Duration) -> Result<Option<StreamMessage>, QueueError>;

    /// Provider name for logs and health output (e.g. "kafka").
    fn provider(&self) -> &str;
}
