//! `GET /healthz` for liveness probes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;
use tracing::info;

use crate::stats::{LoopState, PipelineStats, StatsSnapshot};

pub fn router(stats: Arc<PipelineStats>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .with_state(stats)
}

/// 200 while polling (including `degraded`), 503 once draining.
async fn healthz(State(stats): State<Arc<PipelineStats>>) -> (StatusCode, Json<StatsSnapshot>) {
    let snapshot = stats.snapshot();
    let code = match snapshot.state {
        LoopState::Polling => StatusCode::OK,
        LoopState::Draining => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(snapshot))
}

/// Serve until `shutdown` flips to `true`.
pub async fn serve(
    addr: &str,
    stats: Arc<PipelineStats>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Health endpoint listening");
    axum::serve(listener, router(stats))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}
