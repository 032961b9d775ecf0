//! HTTP surface over the query service and the ingestion pipeline.

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use state::AppState;

pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await.context("Server error")?;
    Ok(())
}
