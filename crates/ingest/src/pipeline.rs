//! Per-message processing: parse, assemble, persist, dispatch.

use std::sync::Arc;

use tracing::{error, info, warn};

use docintake_core::{Config, DocumentId, IngestEvent};
use docintake_queue::{JobPublisher, StreamMessage};
use docintake_storage::{DocumentStore, SearchIndex};

use crate::assembler::DocumentAssembler;
use crate::dead_letter::DeadLetterSink;
use crate::dispatcher::JobDispatcher;
use crate::error::PipelineError;
use crate::persister::{DedupPersister, PersistOutcome};
use crate::stats::PipelineStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Dispatched { document_id: DocumentId },
    Duplicate { integration_id: String },
}

pub struct IngestPipeline {
    assembler: DocumentAssembler,
    persister: DedupPersister,
    dispatcher: JobDispatcher,
    dead_letter: Option<DeadLetterSink>,
    stats: Arc<PipelineStats>,
}

impl IngestPipeline {
    pub fn new(
        assembler: DocumentAssembler,
        persister: DedupPersister,
        dispatcher: JobDispatcher,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            assembler,
            persister,
            dispatcher,
            dead_letter: None,
            stats,
        }
    }

    pub fn with_dead_letter(mut self, sink: DeadLetterSink) -> Self {
        self.dead_letter = Some(sink);
        self
    }

    /// Wire the pipeline from configuration. Jobs and dead letters share
    /// one publisher.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SearchIndex>,
        publisher: Arc<dyn JobPublisher>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let pipeline = Self::new(
            DocumentAssembler::new(config.intake.clone()),
            DedupPersister::new(store, index),
            JobDispatcher::new(publisher.clone(), config.amqp.ocr_queue.clone()),
            stats,
        );
        match config.amqp.dead_letter_queue {
            Some(ref queue) => pipeline.with_dead_letter(DeadLetterSink::new(publisher, queue.clone())),
            None => pipeline,
        }
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Store the event as a new document and dispatch its OCR job. A
    /// duplicate upstream id stops after the insert.
    pub async fn process(&self, event: &IngestEvent) -> Result<ProcessOutcome, PipelineError> {
        if event.id.is_empty() {
            return Err(PipelineError::MissingIntegrationId);
        }

        let doc = self.assembler.assemble(event).map_err(PipelineError::Metadata)?;
        let doc = match self.persister.persist(doc).await? {
            PersistOutcome::Created(doc) => doc,
            PersistOutcome::AlreadyExisted { integration_id } => {
                PipelineStats::incr(&self.stats.duplicates);
                return Ok(ProcessOutcome::Duplicate { integration_id });
            }
        };
        PipelineStats::incr(&self.stats.documents_created);

        let content = event.content.normalize();
        self.dispatcher
            .dispatch(&doc, &content)
            .await
            .map_err(|source| PipelineError::Dispatch {
                document_id: doc.id,
                source,
            })?;
        PipelineStats::incr(&self.stats.jobs_dispatched);

        Ok(ProcessOutcome::Dispatched { document_id: doc.id })
    }

    /// Handle one stream message. Failures are logged, counted and
    /// dead-lettered here; the caller only decides whether to keep polling.
    pub async fn handle_message(&self, message: &StreamMessage) -> Result<ProcessOutcome, PipelineError> {
        PipelineStats::incr(&self.stats.messages_received);
        info!(
            message_id = %message.id,
            key = message.key.as_deref().unwrap_or(""),
            produced_at = %message.timestamp,
            bytes = message.body.len(),
            "Received message"
        );

        let result = match IngestEvent::from_slice(&message.body) {
            Ok(event) => self.process(&event).await,
            Err(e) => Err(PipelineError::Parse(e)),
        };

        if let Err(ref err) = result {
            PipelineStats::incr(&self.stats.messages_failed);
            error!(
                message_id = %message.id,
                stage = err.stage(),
                error = %err,
                "Failed to process message"
            );
            self.dead_letter(message, err).await;
        }
        result
    }

    async fn dead_letter(&self, message: &StreamMessage, err: &PipelineError) {
        let Some(ref sink) = self.dead_letter else {
            return;
        };
        match sink.send(message, err).await {
            Ok(()) => PipelineStats::incr(&self.stats.dead_lettered),
            Err(e) => warn!(message_id = %message.id, error = %e, "Failed to dead-letter message"),
        }
    }
}
