//! The ingest loop: poll, process, repeat until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use docintake_queue::{EventSource, QueueError};

use crate::pipeline::IngestPipeline;
use crate::stats::{LoopState, PipelineStats};

/// Pause after a non-fatal transport error before polling again.
const TRANSPORT_BACKOFF: Duration = Duration::from_millis(100);

/// Sequential consumer: one message is fully handled before the next poll.
pub struct IngestLoop<S> {
    source: S,
    pipeline: IngestPipeline,
    poll_timeout: Duration,
}

impl<S: EventSource> IngestLoop<S> {
    pub fn new(source: S, pipeline: IngestPipeline, poll_timeout: Duration) -> Self {
        Self {
            source,
            pipeline,
            poll_timeout,
        }
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        self.pipeline.stats()
    }

    /// Run until `shutdown` flips to `true` (or its sender goes away), or
    /// the source reports a fatal transport error.
    ///
    /// Shutdown is raced only against the poll, so a message already
    /// received is always processed to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), QueueError> {
        let stats = self.stats();
        stats.set_state(LoopState::Polling);
        info!(provider = self.source.provider(), "Ingest loop started");

        while !*shutdown.borrow() {
            let polled = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                polled = self.source.poll(self.poll_timeout) => polled,
            };

            match polled {
                Ok(None) => stats.mark_poll(true),
                Ok(Some(message)) => {
                    stats.mark_poll(true);
                    if let Err(e) = self.pipeline.handle_message(&message).await {
                        debug!(message_id = %message.id, stage = e.stage(), "Message skipped");
                    }
                }
                Err(e) if e.is_fatal() => {
                    stats.mark_poll(false);
                    stats.set_state(LoopState::Draining);
                    error!(error = %e, "Fatal stream error, stopping ingest loop");
                    return Err(e);
                }
                Err(e) => {
                    stats.mark_poll(false);
                    warn!(error = %e, "Stream transport error");
                    tokio::time::sleep(TRANSPORT_BACKOFF).await;
                }
            }
        }

        stats.set_state(LoopState::Draining);
        info!("Shutting down, no further messages will be processed");
        Ok(())
    }
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
pub async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to register signal handlers, falling back to ctrl_c");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl_c, shutdown only via process kill");
        std::future::pending::<()>().await;
    }
}

/// Spawn a task that flips the returned flag on the first OS signal.
pub fn shutdown_on_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        os_signal().await;
        info!("Shutdown signal received");
        let _ = tx.send(true);
    });
    rx
}
