//! HTTP トリガー。`GET /?date=YYYY-MM-DD` または `GET /?day=yesterday` で 1 日分を処理する。

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context as _, Result};
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use tracing::info;

use crate::digest::Digest;
use crate::error::DigestError;
use crate::notion::PageStore;
use crate::summary::TextGenerator;
use crate::time::DaySelector;

pub fn router<S, G>(digest: Arc<Digest<S, G>>) -> Router
where
    S: PageStore + 'static,
    G: TextGenerator + 'static,
{
    Router::new()
        .route("/", get(trigger::<S, G>))
        .route("/healthz", get(health))
        .with_state(digest)
}

async fn trigger<S, G>(
    State(digest): State<Arc<Digest<S, G>>>,
    Query(selector): Query<DaySelector>,
) -> Result<String, DigestError>
where
    S: PageStore + 'static,
    G: TextGenerator + 'static,
{
    let outcome = digest.run(&selector, Utc::now()).await?;
    let message = outcome.message();
    info!(page_id = %outcome.page.id, url = %outcome.page.url, entries = outcome.entries, "{message}");
    Ok(message)
}

async fn health() -> &'static str {
    "ok"
}

/// HTTP サーバーを起動し、Ctrl-C または SIGTERM で停止する。
pub async fn serve<S, G>(digest: Digest<S, G>, listen: SocketAddr) -> Result<()>
where
    S: PageStore + 'static,
    G: TextGenerator + 'static,
{
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!(%listen, "Listening for summary requests");

    axum::serve(listener, router(Arc::new(digest)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
}
