use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use edurag_answer::{GeminiGenerator, QueryService};
use edurag_core::config::Settings;
use edurag_ingest::Ingestor;
use edurag_vector::IndexStore;

/// Services shared by every handler.
pub struct AppState {
    pub query: Arc<QueryService>,
    pub ingestor: Arc<Ingestor>,
    pub corpus_dir: PathBuf,
    reindexing: AtomicBool,
}

impl AppState {
    pub fn new(query: Arc<QueryService>, ingestor: Arc<Ingestor>, corpus_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self { query, ingestor, corpus_dir, reindexing: AtomicBool::new(false) })
    }

    /// Wire the store, embedder, generator and ingestor from settings.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Arc<Self>> {
        let index_dir = settings.data.index_path();
        let store = Arc::new(
            IndexStore::open(&index_dir, settings.embedding.dim)
                .await
                .with_context(|| format!("Failed to open index store at {}", index_dir.display()))?,
        );
        let embedder = edurag_embed::embedder_from_settings(&settings.embedding);
        let generator = Arc::new(GeminiGenerator::from_settings(&settings.generation).context("Failed to build Gemini client")?);
        let query = Arc::new(QueryService::new(Arc::clone(&store), Arc::clone(&embedder), generator, settings.retrieval.top_k));
        let ingestor = Arc::new(Ingestor::new(store, embedder, settings));
        Ok(Self::new(query, ingestor, settings.data.corpus_path()))
    }

    /// Claim the reindex slot; `None` when a reindex is already running.
    /// The slot is released when the guard drops, including on panic.
    pub fn try_start_reindex(self: &Arc<Self>) -> Option<ReindexGuard> {
        self.reindexing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReindexGuard { state: Arc::clone(self) })
    }

    pub fn is_reindexing(&self) -> bool {
        self.reindexing.load(Ordering::Acquire)
    }
}

pub struct ReindexGuard {
    state: Arc<AppState>,
}

impl Drop for ReindexGuard {
    fn drop(&mut self) {
        self.state.reindexing.store(false, Ordering::Release);
    }
}
