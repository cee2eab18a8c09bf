//! ingest-worker: consumes intake events from the document stream.
//!
//! Pipeline flow: stream → PostgreSQL (dedup insert) → search index → OCR queue
//!
//! Per-message failures are logged and dead-lettered; the worker exits only on
//! a shutdown signal or a fatal stream error.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use docintake_core::config::{load_dotenv, Config};
use docintake_ingest::worker::shutdown_on_signal;
use docintake_ingest::{health, IngestLoop, IngestPipeline, PipelineStats};
use docintake_queue::{AmqpPublisher, KafkaSource};
use docintake_storage::{HttpSearchIndex, PgDocumentStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Document intake worker.
#[derive(Parser, Debug)]
#[command(name = "ingest-worker", version, about)]
struct Cli {
    /// Address for the health endpoint (overrides HEALTH_ADDR).
    #[arg(long)]
    health_addr: Option<String>,

    /// Do not serve the health endpoint.
    #[arg(long)]
    no_health: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = Config::from_env().context("invalid configuration")?;
    config.log_summary();

    let store = PgDocumentStore::connect(&config.postgres)
        .await
        .context("failed to connect to PostgreSQL")?;
    let index = HttpSearchIndex::new(&config.search).context("failed to build search client")?;
    info!(index = %index.index_name(), nodes = config.search.addresses.len(), "Search index client ready");
    let publisher = AmqpPublisher::connect(&config.amqp)
        .await
        .context("failed to connect to RabbitMQ")?;

    let stream = config.stream.clone();
    let source = tokio::task::spawn_blocking(move || KafkaSource::connect(&stream))
        .await?
        .context("failed to connect to the document stream")?;

    let stats = Arc::new(PipelineStats::new());
    let pipeline = IngestPipeline::from_config(
        &config,
        Arc::new(store),
        Arc::new(index),
        Arc::new(publisher),
        stats.clone(),
    );

    let shutdown = shutdown_on_signal();

    if !cli.no_health {
        let addr = cli.health_addr.unwrap_or_else(|| config.health.addr.clone());
        let health_stats = stats.clone();
        let health_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(&addr, health_stats, health_shutdown).await {
                error!(addr = %addr, error = %e, "Health endpoint failed");
            }
        });
    }

    let ingest = IngestLoop::new(
        source,
        pipeline,
        Duration::from_millis(config.stream.poll_timeout_ms),
    );
    info!("ingest-worker starting");
    ingest.run(shutdown).await.context("ingest loop stopped")?;

    let snapshot = stats.snapshot();
    info!(
        received = snapshot.messages_received,
        created = snapshot.documents_created,
        duplicates = snapshot.duplicates,
        failed = snapshot.messages_failed,
        "ingest-worker exited cleanly"
    );
    Ok(())
}
