//! OCR job construction and hand-off.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use docintake_core::{DetailContent, Document, OcrJobRequest};
use docintake_queue::JobPublisher;

use crate::error::DispatchError;

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// AMQP priority is a single octet.
pub fn message_priority(priority: i32) -> u8 {
    u8::try_from(priority.clamp(0, i32::from(u8::MAX))).unwrap_or(u8::MAX)
}

/// Job for `doc`. Non-empty `content` becomes the single fragment at index 0.
pub fn build_job(doc: &Document, content: &str, now: DateTime<Utc>) -> OcrJobRequest {
    let detail_content = if content.is_empty() {
        Vec::new()
    } else {
        vec![DetailContent {
            id: Uuid::new_v4().to_string(),
            created_time: rfc3339(now),
            index: 0,
            content: content.to_string(),
        }]
    };

    OcrJobRequest {
        document_id: doc.id,
        priority: doc.priority,
        document_created_time: rfc3339(doc.created_time),
        is_detect_face: doc.is_detect_face,
        file_type: doc.file_type,
        original_lang_code: doc.original_lang_code.clone(),
        translate_lang_code: doc.translate_lang_code.clone(),
        title: doc.title.clone(),
        // null, not "", when the event carried no subject
        subject: doc.subject.clone(),
        detail_content,
    }
}

pub struct JobDispatcher {
    publisher: Arc<dyn JobPublisher>,
    queue: String,
}

impl JobDispatcher {
    pub fn new(publisher: Arc<dyn JobPublisher>, queue: impl Into<String>) -> Self {
        Self {
            publisher,
            queue: queue.into(),
        }
    }

    /// Publish one job for `doc`. No local retry.
    pub async fn dispatch(&self, doc: &Document, content: &str) -> Result<OcrJobRequest, DispatchError> {
        let job = build_job(doc, content, Utc::now());
        let body = serde_json::to_vec(&job)?;
        self.publisher
            .publish(&self.queue, &body, Some(message_priority(job.priority)))
            .await?;

        info!(
            document_id = %doc.id,
            queue = %self.queue,
            fragments = job.detail_content.len(),
            "OCR job dispatched"
        );
        Ok(job)
    }
}
