//! Document ingestion: turns a directory of per-subject documents into
//! per-subject indexes.

pub mod discovery;
pub mod error;
pub mod extract;
pub mod hashing;
pub mod pipeline;

pub use error::IngestError;
pub use hashing::corpus_hash;
pub use pipeline::{FailedDocument, IngestOutcome, IngestReport, Ingestor};
