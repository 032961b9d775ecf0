//! Subject → current index version record.
//!
//! Persisted as `manifest.json` next to the lance tables. Every save writes a
//! temp file in the same directory and renames it over the old manifest, so a
//! reader sees either the previous or the next manifest in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Result, StoreError};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub version: String,
    /// Hash of the raw corpus the version was built from; `None` for
    /// incrementally updated subjects.
    pub corpus_hash: Option<String>,
    pub chunks: usize,
    pub updated_at: DateTime<Utc>,
}

impl ManifestEntry {
    pub fn table_name(&self, subject: &str) -> String {
        table_name(subject, &self.version)
    }
}

pub fn table_name(subject: &str, version: &str) -> String {
    format!("{subject}__{version}")
}

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Fresh version id: millisecond timestamp and an in-process sequence number,
/// plus up to 12 alphanumerics of the corpus hash when known.
pub fn new_version(corpus_hash: Option<&str>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1000;
    let ts = format!("{}{seq:03}", Utc::now().format("%Y%m%d%H%M%S%3f"));
    let tag: String = corpus_hash.unwrap_or_default().chars().filter(char::is_ascii_alphanumeric).take(12).collect();
    if tag.is_empty() { format!("v{ts}") } else { format!("v{ts}_{tag}") }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub subjects: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// A missing manifest is an empty store, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Manifest {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| StoreError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}
