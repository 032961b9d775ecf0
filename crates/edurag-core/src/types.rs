//! Domain types shared by the index store, ingestion and answering.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A text fragment queued for indexing.
///
/// - `text`: the payload that is embedded and later handed to the generator
/// - `source`: path of the originating document relative to the subject dir
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { text: text.into(), source: source.into() }
    }
}

/// One nearest-neighbour hit.
///
/// `position` is the 0-based insertion index inside the subject.
/// `distance` is the squared L2 distance; lower is closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub position: usize,
    pub source: String,
    pub text: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub context: String,
    pub sources: Vec<String>,
}

/// Subject names become table names on disk, so keep them to a safe alphabet.
pub fn validate_subject(name: &str) -> Result<&str> {
    let ok = !name.is_empty()
        && name.len() <= 128
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok { Ok(name) } else { Err(Error::InvalidSubject(name.to_string())) }
}
