use std::sync::Arc;

use async_trait::async_trait;

use crate::error::QueueError;

/// Publishes serialized payloads to a named work queue.
#[async_trait]
pub trait JobPublisher: Send + Sync {
    /// Publish `body` to `queue`. Resolves once the broker has accepted the
    /// message; there is no local retry.
    async fn publish(&self, queue: &str, body: &[u8], priority: Option<u8>) -> Result<(), QueueError>;
}

/// Blanket implementation so `Arc<dyn JobPublisher>` can be used directly.
#[async_trait]
impl<T: JobPublisher + ?Sized> JobPublisher for Arc<T> {
    async fn publish(&self, queue: &str, body: &[u8], priority: Option<u8>) -> Result<(), QueueError> {
        (**self).publish(queue, body, priority).await
    }
}
