use thiserror::Error;

use docintake_core::DocumentId;
use docintake_queue::QueueError;
use docintake_storage::StorageError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to store document {integration_id}: {source}")]
    Store {
        integration_id: String,
        source: StorageError,
    },

    /// The row exists in the primary store but the search index write failed.
    #[error("document {document_id} ({integration_id}) stored but not indexed: {source}")]
    IndexDiverged {
        document_id: DocumentId,
        integration_id: String,
        source: StorageError,
    },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to serialize job: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Publish(#[from] QueueError),
}

/// Per-message failure. None of these stop the ingest loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed payload: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("event has no upstream id")]
    MissingIntegrationId,

    #[error("failed to serialize event metadata: {0}")]
    Metadata(#[source] serde_json::Error),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("job dispatch failed for document {document_id}: {source}")]
    Dispatch {
        document_id: DocumentId,
        source: DispatchError,
    },
}

impl PipelineError {
    /// Pipeline stage the failure happened in, for logs and dead letters.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse",
            PipelineError::MissingIntegrationId => "validate",
            PipelineError::Metadata(_) => "assemble",
            PipelineError::Persist(PersistError::Store { .. }) => "store",
            PipelineError::Persist(PersistError::IndexDiverged { .. }) => "index",
            PipelineError::Dispatch { .. } => "dispatch",
        }
    }
}
