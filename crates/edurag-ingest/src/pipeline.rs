//! Subject ingestion: extract every document, chunk, embed in batches and
//! swap the subject's index to the result.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use edurag_core::chunking::{Chunker, ChunkingConfig};
use edurag_core::config::Settings;
use edurag_core::traits::Embedder;
use edurag_core::types::{validate_subject, Chunk};
use edurag_vector::{IndexStore, StoreError};

use crate::discovery::{discover_documents, discover_subjects, relative_source};
use crate::error::{IngestError, Result};
use crate::extract::{Extractors, OcrEngine, PdfExtractor};
use crate::hashing::corpus_hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum IngestOutcome {
    /// A new version was written.
    Rebuilt,
    /// The corpus hash matched the current version.
    Unchanged,
    /// Nothing indexable was found; the index was left as it was.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub subject: String,
    pub outcome: IngestOutcome,
    pub documents: usize,
    pub chunks: usize,
    pub failed: Vec<FailedDocument>,
}

impl IngestReport {
    fn new(subject: &str, outcome: IngestOutcome) -> Self {
        Self { subject: subject.to_string(), outcome, documents: 0, chunks: 0, failed: Vec::new() }
    }
}

pub struct Ingestor {
    store: Arc<IndexStore>,
    embedder: Arc<dyn Embedder>,
    extractors: Extractors,
    chunker: Chunker,
    batch_size: usize,
    progress: bool,
}

impl Ingestor {
    pub fn new(store: Arc<IndexStore>, embedder: Arc<dyn Embedder>, settings: &Settings) -> Self {
        let ingest = &settings.ingest;
        let pdf = PdfExtractor::new(OcrEngine::detect(&ingest.ocr_language), ingest.ocr_probe_pages, ingest.ocr_min_chars);
        Self {
            store,
            embedder,
            extractors: Extractors::new(pdf),
            chunker: Chunker::new(ChunkingConfig { max_chars: ingest.chunk_chars }),
            batch_size: settings.embedding.batch_size.max(1),
            progress: false,
        }
    }

    /// Draw an indicatif bar while embedding (CLI use).
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Ingest every subject directory under `corpus`. One subject failing
    /// does not stop the others.
    pub async fn ingest_all(&self, corpus: &Path, force: bool) -> Result<Vec<IngestReport>> {
        if !corpus.is_dir() {
            return Err(IngestError::MissingCorpus(corpus.to_path_buf()));
        }
        let subjects = discover_subjects(corpus)?;
        info!(corpus = %corpus.display(), subjects = subjects.len(), "ingesting corpus");

        let mut reports = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let report = match self.ingest_subject(&subject, &corpus.join(&subject), force).await {
                Ok(report) => report,
                Err(e) => {
                    error!(subject = %subject, error = %e, "subject ingestion failed");
                    IngestReport::new(&subject, IngestOutcome::Failed(e.to_string()))
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }

    pub async fn ingest_subject(&self, subject: &str, dir: &Path, force: bool) -> Result<IngestReport> {
        validate_subject(subject)?;
        if !dir.is_dir() {
            return Err(IngestError::MissingCorpus(dir.to_path_buf()));
        }

        let hash = corpus_hash(dir)?;
        if !force && self.store.corpus_hash(subject)?.as_deref() == Some(hash.as_str()) {
            match self.store.count(subject).await {
                Ok(chunks) => {
                    info!(subject, chunks, "corpus unchanged, skipping");
                    let mut report = IngestReport::new(subject, IngestOutcome::Unchanged);
                    report.chunks = chunks;
                    return Ok(report);
                }
                Err(StoreError::Corrupt { reason, .. }) => {
                    warn!(subject, %reason, "current version unreadable, rebuilding");
                    self.store.evict(subject).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let documents = discover_documents(dir);
        let mut report = IngestReport::new(subject, IngestOutcome::Empty);
        report.documents = documents.len();

        let mut chunks = Vec::new();
        for (path, kind) in &documents {
            let source = relative_source(dir, path);
            let extractor = self.extractors.for_kind(*kind);
            let text = match extractor.extract(path).await {
                Ok(text) if text.trim().is_empty() => Err(IngestError::EmptyDocument(path.clone())),
                other => other,
            };
            match text {
                Ok(text) => {
                    let pieces = self.chunker.chunk(&text);
                    info!(subject, source = %source, extractor = extractor.name(), chunks = pieces.len(), "document extracted");
                    chunks.extend(pieces.into_iter().map(|t| Chunk::new(t, source.clone())));
                }
                Err(e) => {
                    warn!(subject, source = %source, error = %e, "skipping document");
                    report.failed.push(FailedDocument { source, reason: e.to_string() });
                }
            }
        }

        if chunks.is_empty() {
            warn!(subject, "no text extracted, index left untouched");
            return Ok(report);
        }

        let vectors = self.embed_chunks(subject, &chunks).await?;
        report.chunks = self.store.replace(subject, Some(&hash), &vectors, &chunks).await?;
        report.outcome = IngestOutcome::Rebuilt;
        info!(subject, chunks = report.chunks, failed = report.failed.len(), "subject indexed");
        Ok(report)
    }

    async fn embed_chunks(&self, subject: &str, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let bar = if self.progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}") {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(subject.to_string());

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedder = Arc::clone(&self.embedder);
            let embedded = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
                .await
                .map_err(|e| IngestError::Embedding(anyhow::anyhow!("embedding task aborted: {e}")))??;
            vectors.extend(embedded);
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();
        Ok(vectors)
    }
}
