use std::sync::Arc;
use tracing::{debug, info};

use edurag_core::traits::Embedder;
use edurag_core::types::{validate_subject, Answer, RetrievedChunk};
use edurag_vector::IndexStore;

use crate::error::AnswerError;
use crate::generator::Generator;

pub struct QueryService {
    store: Arc<IndexStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl QueryService {
    pub fn new(store: Arc<IndexStore>, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>, top_k: usize) -> Self {
        Self { store, embedder, generator, top_k: top_k.max(1) }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn subjects(&self) -> Result<Vec<String>, AnswerError> {
        Ok(self.store.subjects()?)
    }

    /// Nearest chunks of `subject` for `question`, closest first.
    pub async fn retrieve(&self, subject: &str, question: &str, k: usize) -> Result<Vec<RetrievedChunk>, AnswerError> {
        let (subject, question) = (subject.trim(), question.trim());
        if subject.is_empty() || question.is_empty() {
            return Err(AnswerError::InvalidRequest("Subject and query are required".into()));
        }
        // A name that cannot be a table cannot have data either.
        if validate_subject(subject).is_err() || !self.store.contains(subject)? {
            return Err(AnswerError::NotFound(subject.to_string()));
        }

        let embedder = Arc::clone(&self.embedder);
        let text = question.to_string();
        let mut vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&[text]))
            .await
            .map_err(|e| AnswerError::Embedding(anyhow::anyhow!("embedding task aborted: {e}")))??;
        let query = vectors.pop().ok_or_else(|| AnswerError::Embedding(anyhow::anyhow!("embedder returned no vector")))?;

        let hits = self.store.search(subject, &query, k).await?;
        debug!(subject, k, hits = hits.len(), "retrieved context");
        Ok(hits)
    }

    pub async fn answer(&self, subject: &str, question: &str) -> Result<Answer, AnswerError> {
        let hits = self.retrieve(subject, question, self.top_k).await?;
        let context = hits.iter().map(|h| h.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.source) {
                sources.push(hit.source.clone());
            }
        }

        let answer = self.generator.generate(question.trim(), &context).await?;
        info!(subject = subject.trim(), chunks = hits.len(), "question answered");
        Ok(Answer { answer, context, sources })
    }
}
