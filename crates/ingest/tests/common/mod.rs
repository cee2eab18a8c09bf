//! In-memory trait implementations shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use docintake_core::{Config, Document, DocumentId};
use docintake_ingest::{IngestPipeline, PipelineStats};
use docintake_queue::{EventSource, JobPublisher, QueueError, StreamMessage};
use docintake_storage::{DocumentStore, SearchIndex, StorageError};

pub const OCR_QUEUE: &str = "process-ocr-requests-priority";
pub const DEAD_LETTER_QUEUE: &str = "intake-dead-letter";

pub fn config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("BOOTSTRAP_SERVERS", "kafka:9092"),
        ("TOPIC", "documents"),
        ("GROUP_ID", "intake"),
        ("CLIENT_ID", "intake-test"),
        ("DATABASE_URL", "postgres://intake@localhost/icocr"),
        ("ES_ADDRESSES", "http://localhost:9200"),
        ("RABBITMQ_URL", "amqp://localhost:5672/%2f"),
        ("SYSTEM_KEY_ID", "sys-key"),
        ("DEAD_LETTER_QUEUE", DEAD_LETTER_QUEUE),
    ]
    .into_iter()
    .collect();
    Config::from_lookup("", &|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

/// Primary store that honours the unique upstream id. Inserts for an id in
/// `failing` error as if the database were unreachable.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<HashMap<String, Document>>,
    pub failing: HashSet<String>,
}

impl MemoryStore {
    pub fn failing_on(integration_id: &str) -> Self {
        Self {
            failing: HashSet::from([integration_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, integration_id: &str) -> Option<Document> {
        self.rows.lock().unwrap().get(integration_id).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_if_absent(&self, doc: &Document) -> Result<Option<DocumentId>, StorageError> {
        if self.failing.contains(&doc.integration_id) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&doc.integration_id) {
            return Ok(None);
        }
        rows.insert(doc.integration_id.clone(), doc.clone());
        Ok(Some(doc.id))
    }
}

#[derive(Default)]
pub struct MemoryIndex {
    pub docs: Mutex<HashMap<DocumentId, Document>>,
    pub fail: bool,
}

impl MemoryIndex {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index(&self, doc: &Document) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::SearchApi {
                status: 503,
                body: "cluster unavailable".into(),
            });
        }
        self.docs.lock().unwrap().insert(doc.id, doc.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Published {
    pub queue: String,
    pub body: serde_json::Value,
    pub priority: Option<u8>,
}

/// Records published messages; publishing to a queue in `failing` errors.
#[derive(Default)]
pub struct MemoryPublisher {
    pub messages: Mutex<Vec<Published>>,
    pub failing: HashSet<String>,
}

impl MemoryPublisher {
    pub fn failing_on(queue: &str) -> Self {
        Self {
            failing: HashSet::from([queue.to_string()]),
            ..Self::default()
        }
    }

    pub fn on(&self, queue: &str) -> Vec<Published> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.queue == queue)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl JobPublisher for MemoryPublisher {
    async fn publish(&self, queue: &str, body: &[u8], priority: Option<u8>) -> Result<(), QueueError> {
        if self.failing.contains(queue) {
            return Err(QueueError::Publish(format!("{queue}: broker nacked message")));
        }
        self.messages.lock().unwrap().push(Published {
            queue: queue.to_string(),
            body: serde_json::from_slice(body).unwrap(),
            priority,
        });
        Ok(())
    }
}

/// Replays a fixed script of poll results. Once the script is exhausted
/// every poll idles for the timeout and flips the shutdown flag.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Option<StreamMessage>, QueueError>>>,
    shutdown: watch::Sender<bool>,
    pub polls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(
        script: Vec<Result<Option<StreamMessage>, QueueError>>,
    ) -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let source = Self {
            script: Mutex::new(script.into()),
            shutdown: tx,
            polls: AtomicUsize::new(0),
        };
        (source, rx)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn poll(&self, timeout: Duration) -> Result<Option<StreamMessage>, QueueError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                tokio::time::sleep(timeout).await;
                let _ = self.shutdown.send(true);
                Ok(None)
            }
        }
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

pub fn message(offset: u64, body: &str) -> Result<Option<StreamMessage>, QueueError> {
    Ok(Some(StreamMessage {
        id: format!("documents/0@{offset}"),
        key: None,
        body: body.as_bytes().to_vec(),
        timestamp: Utc::now(),
    }))
}

pub fn transport(fatal: bool) -> Result<Option<StreamMessage>, QueueError> {
    Err(QueueError::Transport {
        message: "broker transport failure".into(),
        fatal,
    })
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub index: Arc<MemoryIndex>,
    pub publisher: Arc<MemoryPublisher>,
    pub stats: Arc<PipelineStats>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MemoryIndex::default(), MemoryPublisher::default())
    }

    pub fn with(index: MemoryIndex, publisher: MemoryPublisher) -> Self {
        Self::with_store(MemoryStore::default(), index, publisher)
    }

    pub fn with_store(store: MemoryStore, index: MemoryIndex, publisher: MemoryPublisher) -> Self {
        Self {
            store: Arc::new(store),
            index: Arc::new(index),
            publisher: Arc::new(publisher),
            stats: Arc::new(PipelineStats::new()),
        }
    }

    pub fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::from_config(
            &config(),
            self.store.clone(),
            self.index.clone(),
            self.publisher.clone(),
            self.stats.clone(),
        )
    }
}
