//! HTTP presentation of the published snapshot.
//!
//! Routes:
//! - `GET /` ranked Markdown page of the current snapshot
//! - `GET /top_stories.json` the current snapshot as JSON
//! - `GET /health` liveness check
//!
//! Until the first refresh succeeds, snapshot routes answer
//! `503 Service Unavailable`. After that they always serve the last
//! published snapshot, also while later refreshes are failing.

use crate::models::Snapshot;
use crate::outputs::markdown::snapshot_to_markdown;
use crate::store::SnapshotStore;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    store: Arc<SnapshotStore>,
}

pub fn router(store: Arc<SnapshotStore>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/top_stories.json", get(top_stories_json))
        .route("/health", get(|| async { "ok" }))
        .with_state(AppState { store })
}

/// Serve `router(store)` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, store: Arc<SnapshotStore>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

fn not_ready() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "No snapshot has been published yet; try again shortly.\n",
    )
        .into_response()
}

async fn home(State(state): State<AppState>) -> Response {
    let t0 = Instant::now();
    let Some(snapshot) = state.store.current().await else {
        return not_ready();
    };
    let page = snapshot_to_markdown(&snapshot);
    info!(
        stories = snapshot.len(),
        took_us = t0.elapsed().as_micros() as u64,
        "Rendered home page"
    );
    (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        page,
    )
        .into_response()
}

async fn top_stories_json(State(state): State<AppState>) -> Response {
    match state.store.current().await {
        Some(snapshot) => {
            debug!(stories = snapshot.len(), "Serving JSON snapshot");
            Json::<Arc<Snapshot>>(snapshot).into_response()
        }
        None => not_ready(),
    }
}
