//! Embedding generation: the candle MiniLM encoder, a deterministic hashing
//! embedder for tests, and the lazy wrapper used by long-running services.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edurag_core::config::{expand_path, EmbeddingSettings};
use edurag_core::traits::Embedder;

pub mod device;
mod hash;
mod lazy;
mod minilm;
pub mod pool;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use lazy::LazyEmbedder;
pub use minilm::MiniLmEmbedder;
pub use pool::masked_mean_l2;

/// Build the process embedder from settings.
///
/// `use_fake` (or `APP_USE_FAKE_EMBEDDINGS=1`) selects [`HashEmbedder`];
/// otherwise the MiniLM model is wrapped in a [`LazyEmbedder`] and loaded on
/// first use.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Arc<dyn Embedder> {
    if settings.use_fake || fake_requested() {
        tracing::info!(dim = settings.dim, "using hash embedder");
        return Arc::new(HashEmbedder::new(settings.dim));
    }
    let configured = settings.model_dir.clone();
    let max_len = settings.max_len;
    Arc::new(LazyEmbedder::new(settings.dim, max_len, move || {
        let dir = resolve_model_dir(configured.as_deref())?;
        Ok(Box::new(MiniLmEmbedder::load(&dir, max_len)?) as Box<dyn Embedder>)
    }))
}

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("embedding.model_dir {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { tracing::info!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); }
    }
    let default = Path::new("models/all-MiniLM-L6-v2");
    if default.exists() { return Ok(default.to_path_buf()); }
    Err(anyhow!("Could not locate the all-MiniLM-L6-v2 model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
