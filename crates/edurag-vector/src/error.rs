use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Subject(#[from] edurag_core::error::Error),

    /// The subject's persisted index cannot be used. Other subjects are unaffected.
    #[error("index for subject '{subject}' is corrupt: {reason}")]
    Corrupt { subject: String, reason: String },

    #[error("expected {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{vectors} vectors but {chunks} chunks")]
    LengthMismatch { vectors: usize, chunks: usize },

    #[error("vector dimension {0} is not usable")]
    InvalidDimension(usize),

    #[error("result batch has no usable '{0}' column")]
    MissingColumn(String),

    #[error("manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error(transparent)]
    Lance(#[from] lancedb::Error),

    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
