//! Conditional insert into the primary store, mirrored to the search index.

use std::sync::Arc;

use tracing::{error, info};

use docintake_core::Document;
use docintake_storage::{DocumentStore, SearchIndex};

use crate::error::PersistError;

#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// Newly stored and indexed.
    Created(Document),
    /// The upstream id was already present; nothing was written.
    AlreadyExisted { integration_id: String },
}

impl PersistOutcome {
    pub fn already_existed(&self) -> bool {
        matches!(self, PersistOutcome::AlreadyExisted { .. })
    }
}

/// The two stores are not transactional. A failed index write after a
/// successful insert surfaces as [`PersistError::IndexDiverged`] and is
/// logged with `reconcile = true`.
pub struct DedupPersister {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchIndex>,
}

impl DedupPersister {
    pub fn new(store: Arc<dyn DocumentStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    pub async fn persist(&self, mut doc: Document) -> Result<PersistOutcome, PersistError> {
        let stored_id = match self.store.insert_if_absent(&doc).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                info!(integration_id = %doc.integration_id, "Document already exists, skipping");
                return Ok(PersistOutcome::AlreadyExisted {
                    integration_id: doc.integration_id,
                });
            }
            Err(source) => {
                return Err(PersistError::Store {
                    integration_id: doc.integration_id,
                    source,
                })
            }
        };
        doc.id = stored_id;

        if let Err(source) = self.index.index(&doc).await {
            error!(
                reconcile = true,
                document_id = %doc.id,
                integration_id = %doc.integration_id,
                error = %source,
                "Document stored but not indexed"
            );
            return Err(PersistError::IndexDiverged {
                document_id: doc.id,
                integration_id: doc.integration_id,
                source,
            });
        }

        info!(
            document_id = %doc.id,
            integration_id = %doc.integration_id,
            "Document stored and indexed"
        );
        Ok(PersistOutcome::Created(doc))
    }
}
