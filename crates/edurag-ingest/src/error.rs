use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("corpus directory {0} does not exist")]
    MissingCorpus(PathBuf),

    #[error("failed to extract {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("no text extracted from {0}")]
    EmptyDocument(PathBuf),

    #[error("embedding failed: {0}")]
    Embedding(#[from] anyhow::Error),

    #[error(transparent)]
    Subject(#[from] edurag_core::error::Error),

    #[error(transparent)]
    Store(#[from] edurag_vector::StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn extraction(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Extraction { path: path.to_path_buf(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
