//! Search index mirror (Elasticsearch / OpenSearch document API).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use docintake_core::config::SearchConfig;
use docintake_core::Document;

use crate::error::StorageError;

/// Trait for search index backends.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Upsert `doc` under its own id.
    async fn index(&self, doc: &Document) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: SearchIndex + ?Sized> SearchIndex for Arc<T> {
    async fn index(&self, doc: &Document) -> Result<(), StorageError> {
        (**self).index(doc).await
    }
}

/// REST client for `PUT /{index}/_doc/{id}`.
///
/// Requests rotate round-robin across the configured nodes; each write is a
/// single attempt against one node.
pub struct HttpSearchIndex {
    client: Client,
    addresses: Vec<String>,
    index: String,
    username: Option<String>,
    password: Option<String>,
    next: AtomicUsize,
}

impl HttpSearchIndex {
    pub fn new(config: &SearchConfig) -> Result<Self, StorageError> {
        if config.addresses.is_empty() {
            return Err(StorageError::NotConfigured("no search index addresses".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            addresses: config.addresses.clone(),
            index: config.index.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            next: AtomicUsize::new(0),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    fn next_address(&self) -> &str {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        &self.addresses[i]
    }

    /// Document URL on the next node in rotation.
    pub fn document_url(&self, id: &impl std::fmt::Display) -> String {
        format!("{}/{}/_doc/{}", self.next_address(), self.index, id)
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn index(&self, doc: &Document) -> Result<(), StorageError> {
        let url = self.document_url(&doc.id);
        debug!(%url, "Indexing document");

        let mut request = self.client.put(&url).json(doc);
        if let Some(ref user) = self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::SearchApi { status, body });
        }
        Ok(())
    }
}
