use std::sync::Arc;

use async_trait::async_trait;

use docintake_core::{Document, DocumentId};

use crate::error::StorageError;

/// Primary document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `doc` unless a row with the same integration id exists.
    ///
    /// Must be a single atomic conditional insert. Returns the stored id, or
    /// `None` when the integration id was already present.
    async fn insert_if_absent(&self, doc: &Document) -> Result<Option<DocumentId>, StorageError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn insert_if_absent(&self, doc: &Document) -> Result<Option<DocumentId>, StorageError> {
        (**self).insert_if_absent(doc).await
    }
}
