mod common;

use std::time::Duration;

use docintake_core::{FileType, IngestEvent, Privacy};
use docintake_ingest::{IngestLoop, PipelineError, ProcessOutcome};

use common::*;

const POLL: Duration = Duration::from_millis(10);

const DOC_EVENT: &str = r#"{
    "id": "ARC-0001",
    "source": "archive",
    "type": "DOC",
    "content": "line1",
    "metadata": { "subject": "Annual report", "language": ["01"], "mode": "02" }
}"#;

#[tokio::test]
async fn new_event_is_stored_indexed_and_dispatched() {
    let h = Harness::new();
    let pipeline = h.pipeline();
    let event = IngestEvent::from_slice(DOC_EVENT.as_bytes()).unwrap();

    let outcome = pipeline.process(&event).await.unwrap();

    let row = h.store.get("ARC-0001").expect("row stored");
    assert_eq!(outcome, ProcessOutcome::Dispatched { document_id: row.id });
    assert_eq!(row.file_type, FileType::Doc);
    assert_eq!(row.privacy, Privacy::Conditional);
    assert_eq!(row.subject.as_deref(), Some("Annual report"));

    let indexed = h.index.docs.lock().unwrap().get(&row.id).cloned();
    assert_eq!(indexed, Some(row.clone()));

    let jobs = h.publisher.on(OCR_QUEUE);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].priority, Some(8));
    let job = &jobs[0].body;
    assert_eq!(job["document_id"], row.id.to_string());
    assert_eq!(job["file_type"], 4);
    assert_eq!(job["original_lang_code"], "vi");
    assert_eq!(job["subject"], "Annual report");
    assert_eq!(job["detail_content"].as_array().unwrap().len(), 1);
    assert_eq!(job["detail_content"][0]["index"], 0);
    assert_eq!(job["detail_content"][0]["content"], "line1");

    let snap = h.stats.snapshot();
    assert_eq!(snap.documents_created, 1);
    assert_eq!(snap.jobs_dispatched, 1);
}

#[tokio::test]
async fn repeated_event_is_absorbed() {
    let h = Harness::new();
    let pipeline = h.pipeline();
    let event = IngestEvent::from_slice(DOC_EVENT.as_bytes()).unwrap();

    pipeline.process(&event).await.unwrap();
    let second = pipeline.process(&event).await.unwrap();

    assert_eq!(
        second,
        ProcessOutcome::Duplicate {
            integration_id: "ARC-0001".into()
        }
    );
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.index.len(), 1);
    assert_eq!(h.publisher.on(OCR_QUEUE).len(), 1);
    assert_eq!(h.stats.snapshot().duplicates, 1);
}

#[tokio::test]
async fn unknown_mode_defaults_to_private() {
    let h = Harness::new();
    let event =
        IngestEvent::from_slice(br#"{"id":"ARC-9","type":"PIC","metadata":{"mode":"99"}}"#).unwrap();
    h.pipeline().process(&event).await.unwrap();

    let row = h.store.get("ARC-9").unwrap();
    assert_eq!(row.privacy, Privacy::Private);
    assert_eq!(row.keywords, vec![String::new()]);
    // no content: job carries no fragments
    let jobs = h.publisher.on(OCR_QUEUE);
    assert!(jobs[0].body["detail_content"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_upstream_id_is_rejected() {
    let h = Harness::new();
    let event = IngestEvent::from_slice(br#"{"type":"DOC","content":"x"}"#).unwrap();
    let err = h.pipeline().process(&event).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingIntegrationId));
    assert_eq!(h.store.len(), 0);
    assert!(h.publisher.on(OCR_QUEUE).is_empty());
}

#[tokio::test]
async fn malformed_payload_is_dead_lettered_and_loop_continues() {
    let h = Harness::new();
    let (source, shutdown) = ScriptedSource::new(vec![
        message(1, "{not json"),
        Ok(None),
        message(2, DOC_EVENT),
    ]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    assert_eq!(h.store.len(), 1);
    assert_eq!(h.publisher.on(OCR_QUEUE).len(), 1);

    let dead = h.publisher.on(DEAD_LETTER_QUEUE);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body["message_id"], "documents/0@1");
    assert_eq!(dead[0].body["stage"], "parse");
    assert_eq!(dead[0].body["payload"], "{not json");
    assert_eq!(dead[0].priority, None);

    let snap = h.stats.snapshot();
    assert_eq!(snap.messages_received, 2);
    assert_eq!(snap.messages_failed, 1);
    assert_eq!(snap.dead_lettered, 1);
    assert_eq!(snap.status, "draining");
}

#[tokio::test]
async fn store_failure_is_dead_lettered_and_loop_continues() {
    let h = Harness::with_store(
        MemoryStore::failing_on("ARC-BAD"),
        MemoryIndex::default(),
        MemoryPublisher::default(),
    );
    let (source, shutdown) = ScriptedSource::new(vec![
        message(3, r#"{"id":"ARC-BAD","type":"DOC","content":"x"}"#),
        message(4, DOC_EVENT),
    ]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    let dead = h.publisher.on(DEAD_LETTER_QUEUE);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body["message_id"], "documents/0@3");
    assert_eq!(dead[0].body["stage"], "store");

    // only the healthy event reached the index and the OCR queue
    assert!(h.store.get("ARC-BAD").is_none());
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.index.len(), 1);
    let jobs = h.publisher.on(OCR_QUEUE);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].body["document_id"], h.store.get("ARC-0001").unwrap().id.to_string());

    let snap = h.stats.snapshot();
    assert_eq!(snap.messages_received, 2);
    assert_eq!(snap.messages_failed, 1);
    assert_eq!(snap.documents_created, 1);
    assert_eq!(snap.dead_lettered, 1);
}

#[tokio::test]
async fn index_failure_is_dead_lettered_without_dispatch() {
    let h = Harness::with(MemoryIndex::failing(), MemoryPublisher::default());
    let (source, shutdown) = ScriptedSource::new(vec![message(5, DOC_EVENT)]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    // row is kept; the divergence is reported, not rolled back
    assert_eq!(h.store.len(), 1);
    assert!(h.publisher.on(OCR_QUEUE).is_empty());
    let dead = h.publisher.on(DEAD_LETTER_QUEUE);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body["stage"], "index");
}

#[tokio::test]
async fn dispatch_failure_is_dead_lettered() {
    let h = Harness::with(MemoryIndex::default(), MemoryPublisher::failing_on(OCR_QUEUE));
    let (source, shutdown) = ScriptedSource::new(vec![message(6, DOC_EVENT)]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    assert_eq!(h.index.len(), 1);
    let dead = h.publisher.on(DEAD_LETTER_QUEUE);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body["stage"], "dispatch");
    assert_eq!(h.stats.snapshot().jobs_dispatched, 0);
}

#[tokio::test]
async fn dead_letter_failure_does_not_stop_the_loop() {
    let h = Harness::with(
        MemoryIndex::default(),
        MemoryPublisher::failing_on(DEAD_LETTER_QUEUE),
    );
    let (source, shutdown) =
        ScriptedSource::new(vec![message(1, "[]"), message(2, DOC_EVENT)]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    assert_eq!(h.store.len(), 1);
    let snap = h.stats.snapshot();
    assert_eq!(snap.messages_failed, 1);
    assert_eq!(snap.dead_lettered, 0);
}

#[tokio::test]
async fn fatal_transport_error_ends_the_loop() {
    let h = Harness::new();
    let (source, shutdown) = ScriptedSource::new(vec![transport(true), message(1, DOC_EVENT)]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    let err = ingest.run(shutdown).await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn transient_transport_error_is_survived() {
    let h = Harness::new();
    let (source, shutdown) = ScriptedSource::new(vec![transport(false), message(1, DOC_EVENT)]);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(shutdown).await.unwrap();

    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn shutdown_flag_stops_before_next_poll() {
    let h = Harness::new();
    let (source, _) = ScriptedSource::new(vec![message(1, DOC_EVENT)]);
    let (tx, rx) = tokio::sync::watch::channel(true);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    ingest.run(rx).await.unwrap();
    drop(tx);

    assert_eq!(h.store.len(), 0);
    assert_eq!(h.stats.snapshot().status, "draining");
}

#[tokio::test]
async fn shutdown_during_idle_poll_drains() {
    let h = Harness::new();
    let (source, _) = ScriptedSource::new(Vec::new());
    let (tx, rx) = tokio::sync::watch::channel(false);
    let ingest = IngestLoop::new(source, h.pipeline(), POLL);

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
    });
    tokio::time::timeout(Duration::from_secs(5), ingest.run(rx))
        .await
        .expect("loop stopped")
        .unwrap();
    stopper.await.unwrap();
}
