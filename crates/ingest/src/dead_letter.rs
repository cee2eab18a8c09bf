//! Dead-letter envelopes for messages the pipeline could not handle.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use docintake_queue::{JobPublisher, StreamMessage};

use crate::error::{DispatchError, PipelineError};

#[derive(Debug, Serialize)]
pub struct DeadLetter<'a> {
    pub message_id: &'a str,
    pub stage: &'static str,
    pub error: String,
    /// Original body, lossily decoded.
    pub payload: Cow<'a, str>,
    pub failed_at: String,
}

impl<'a> DeadLetter<'a> {
    pub fn new(message: &'a StreamMessage, err: &PipelineError) -> Self {
        Self {
            message_id: &message.id,
            stage: err.stage(),
            error: err.to_string(),
            payload: message.body_lossy(),
            failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

pub struct DeadLetterSink {
    publisher: Arc<dyn JobPublisher>,
    queue: String,
}

impl DeadLetterSink {
    pub fn new(publisher: Arc<dyn JobPublisher>, queue: impl Into<String>) -> Self {
        Self {
            publisher,
            queue: queue.into(),
        }
    }

    pub async fn send(&self, message: &StreamMessage, err: &PipelineError) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(&DeadLetter::new(message, err))?;
        self.publisher.publish(&self.queue, &body, None).await?;
        info!(message_id = %message.id, queue = %self.queue, stage = err.stage(), "Message dead-lettered");
        Ok(())
    }
}
