//! Per-subject index manager.
//!
//! Every subject version lives in its own lance table `<subject>__<version>`
//! whose rows pair a chunk with its vector. `manifest.json` names the current
//! version of each subject. Handles are cached per process and guarded by a
//! per-subject `RwLock`: searches share it, updates and rebuilds take it
//! exclusively.
//!
//! Several processes may share one root (a server and an indexer). A cached
//! handle whose version no longer matches the manifest is reopened, and a
//! rebuild keeps the version it replaced so readers still holding it finish
//! cleanly; only older versions are pruned.

use chrono::Utc;
use lancedb::{connect, Connection, Table};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use edurag_core::types::{validate_subject, Chunk, RetrievedChunk};

use crate::error::{Result, StoreError};
use crate::manifest::{new_version, table_name, Manifest, ManifestEntry};
use crate::schema::vector_dim;
use crate::{search, writer};

pub type SubjectHandle = Arc<RwLock<SubjectIndex>>;

/// In-memory view of one subject's current version.
#[derive(Debug)]
pub struct SubjectIndex {
    version: Option<String>,
    table: Option<Table>,
    count: usize,
}

impl SubjectIndex {
    fn empty() -> Self {
        Self { version: None, table: None, count: 0 }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

pub struct IndexStore {
    root: PathBuf,
    dim: usize,
    width: i32,
    db: Connection,
    manifest_lock: Mutex<()>,
    cache: Mutex<HashMap<String, SubjectHandle>>,
}

impl IndexStore {
    /// Open (or create) the store rooted at `root` for `dim`-wide vectors.
    pub async fn open(root: impl AsRef<Path>, dim: usize) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let width = i32::try_from(dim).ok().filter(|w| *w > 0).ok_or(StoreError::InvalidDimension(dim))?;
        std::fs::create_dir_all(&root)?;
        let db = connect(&root.to_string_lossy()).execute().await?;
        info!(root = %root.display(), dim, "index store opened");
        Ok(Self {
            root,
            dim,
            width,
            db,
            manifest_lock: Mutex::new(()),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn manifest_path(&self) -> PathBuf {
        Manifest::path_in(&self.root)
    }

    fn read_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }

    /// Subjects with a persisted version, sorted.
    pub fn subjects(&self) -> Result<Vec<String>> {
        Ok(self.read_manifest()?.subjects.into_keys().collect())
    }

    pub fn contains(&self, subject: &str) -> Result<bool> {
        Ok(self.read_manifest()?.subjects.contains_key(subject))
    }

    fn current_version(&self, subject: &str) -> Result<Option<String>> {
        Ok(self.read_manifest()?.subjects.remove(subject).map(|e| e.version))
    }

    /// Hash of the corpus the current version was built from, if recorded.
    pub fn corpus_hash(&self, subject: &str) -> Result<Option<String>> {
        Ok(self.read_manifest()?.subjects.get(subject).and_then(|e| e.corpus_hash.clone()))
    }

    /// Return the cached handle, opening the persisted version or starting an
    /// empty index the first time a subject is seen. A handle left behind by a
    /// rebuild in another process is reopened at the current version.
    pub async fn load_or_create(&self, subject: &str) -> Result<SubjectHandle> {
        validate_subject(subject)?;
        let mut cache = self.cache.lock().await;
        if let Some(handle) = cache.get(subject) {
            // A writer holding the lock is about to make the handle current.
            // While the read guard is held, no writer here can be mid-record.
            let fresh = match handle.try_read() {
                Ok(index) => index.version == self.current_version(subject)?,
                Err(_) => true,
            };
            if fresh {
                return Ok(Arc::clone(handle));
            }
            debug!(subject, "manifest moved on, reopening");
        }
        let index = self.open_subject(subject).await?;
        let handle = Arc::new(RwLock::new(index));
        cache.insert(subject.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    async fn open_subject(&self, subject: &str) -> Result<SubjectIndex> {
        let manifest = self.read_manifest()?;
        let Some(entry) = manifest.subjects.get(subject) else {
            debug!(subject, "no persisted index, starting empty");
            return Ok(SubjectIndex::empty());
        };
        let corrupt = |reason: String| StoreError::Corrupt { subject: subject.to_string(), reason };

        let name = entry.table_name(subject);
        let table = self
            .db
            .open_table(&name)
            .execute()
            .await
            .map_err(|e| corrupt(format!("cannot open table {name}: {e}")))?;
        let schema = table.schema().await.map_err(|e| corrupt(format!("cannot read schema of {name}: {e}")))?;
        match vector_dim(&schema) {
            Some(d) if d == self.dim => {}
            Some(d) => return Err(corrupt(format!("table {name} holds {d}-d vectors, expected {}", self.dim))),
            None => return Err(corrupt(format!("table {name} has no vector column"))),
        }
        let count = table.count_rows(None).await.map_err(|e| corrupt(format!("cannot count rows of {name}: {e}")))?;
        if count != entry.chunks {
            warn!(subject, table = %name, rows = count, recorded = entry.chunks, "row count differs from manifest");
        }
        info!(subject, version = %entry.version, chunks = count, "index loaded");
        Ok(SubjectIndex { version: Some(entry.version.clone()), table: Some(table), count })
    }

    /// Chunk texts in insertion order, aligned with the vectors.
    pub async fn load_or_create_texts(&self, subject: &str) -> Result<Vec<String>> {
        Ok(self.load_chunks(subject).await?.into_iter().map(|c| c.text).collect())
    }

    pub async fn load_chunks(&self, subject: &str) -> Result<Vec<Chunk>> {
        let handle = self.load_or_create(subject).await?;
        let index = handle.read().await;
        let Some(table) = index.table.as_ref() else { return Ok(Vec::new()) };
        if index.count == 0 {
            return Ok(Vec::new());
        }
        let rows = search::scan_rows(table, index.count).await?;
        Ok(rows.into_iter().map(|(_, source, text)| Chunk { text, source }).collect())
    }

    pub async fn count(&self, subject: &str) -> Result<usize> {
        let handle = self.load_or_create(subject).await?;
        let index = handle.read().await;
        Ok(index.count)
    }

    fn check_pairs(&self, vectors: &[Vec<f32>], chunks: &[Chunk]) -> Result<()> {
        if vectors.len() != chunks.len() {
            return Err(StoreError::LengthMismatch { vectors: vectors.len(), chunks: chunks.len() });
        }
        self.check_vectors(vectors)
    }

    fn check_vectors(&self, vectors: &[Vec<f32>]) -> Result<()> {
        match vectors.iter().find(|v| v.len() != self.dim) {
            Some(v) => Err(StoreError::DimensionMismatch { expected: self.dim, actual: v.len() }),
            None => Ok(()),
        }
    }

    /// Append vector/chunk pairs to the subject in one commit. Returns the new count.
    pub async fn update(&self, subject: &str, vectors: &[Vec<f32>], chunks: &[Chunk]) -> Result<usize> {
        self.check_pairs(vectors, chunks)?;
        let handle = self.load_or_create(subject).await?;
        let mut index = handle.write().await;
        if chunks.is_empty() {
            return Ok(index.count);
        }

        let batch = writer::chunk_batch(self.width, index.count, vectors, chunks)?;
        if let Some(table) = index.table.as_ref() {
            writer::append(table, batch).await?;
        } else {
            let version = new_version(None);
            let table = writer::create_table(&self.db, &table_name(subject, &version), self.width, Some(batch)).await?;
            index.table = Some(table);
            index.version = Some(version);
        }
        index.count += chunks.len();

        // Rows now differ from any recorded corpus, so the hash is cleared.
        if let Some(version) = index.version.clone() {
            self.record(subject, ManifestEntry { version, corpus_hash: None, chunks: index.count, updated_at: Utc::now() })
                .await?;
        }
        debug!(subject, added = chunks.len(), total = index.count, "index updated");
        Ok(index.count)
    }

    /// Write a fresh version holding exactly these pairs and switch the subject to it.
    ///
    /// The new table is complete before the manifest flips, so readers see
    /// either the previous version or the new one. A corrupt previous version
    /// does not block the rebuild.
    pub async fn replace(
        &self,
        subject: &str,
        corpus_hash: Option<&str>,
        vectors: &[Vec<f32>],
        chunks: &[Chunk],
    ) -> Result<usize> {
        validate_subject(subject)?;
        self.check_pairs(vectors, chunks)?;

        let batch = if chunks.is_empty() { None } else { Some(writer::chunk_batch(self.width, 0, vectors, chunks)?) };
        let handle = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(subject.to_string()).or_insert_with(|| Arc::new(RwLock::new(SubjectIndex::empty()))))
        };
        // Held from table creation to pruning, so two rebuilds of one subject
        // never prune each other's unrecorded table.
        let mut index = handle.write().await;

        let version = new_version(corpus_hash);
        let name = table_name(subject, &version);
        let table = writer::create_table(&self.db, &name, self.width, batch).await?;
        let entry = ManifestEntry {
            version: version.clone(),
            corpus_hash: corpus_hash.map(str::to_string),
            chunks: chunks.len(),
            updated_at: Utc::now(),
        };
        let previous = match self.record(subject, entry).await {
            Ok(previous) => previous.map(|e| e.version),
            Err(e) => {
                self.remove_table_dir(&name);
                return Err(e);
            }
        };
        *index = SubjectIndex { version: Some(version), table: Some(table), count: chunks.len() };

        let mut keep = vec![name.clone()];
        keep.extend(previous.map(|old| table_name(subject, &old)));
        self.prune_versions(subject, &keep);
        drop(index);
        info!(subject, table = %name, chunks = chunks.len(), "index replaced");
        Ok(chunks.len())
    }

    /// Up to `k` nearest chunks, closest first. Unknown or empty subjects yield nothing.
    pub async fn search(&self, subject: &str, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let handle = self.load_or_create(subject).await?;
        let index = handle.read().await;
        let Some(table) = index.table.as_ref() else { return Ok(Vec::new()) };
        if k == 0 || index.count == 0 {
            return Ok(Vec::new());
        }
        search::nearest(table, query, k.min(index.count)).await
    }

    /// Forget the cached handle so the next access re-reads the manifest.
    pub async fn evict(&self, subject: &str) -> bool {
        self.cache.lock().await.remove(subject).is_some()
    }

    /// Point `subject` at `entry`, returning the entry it replaced.
    async fn record(&self, subject: &str, entry: ManifestEntry) -> Result<Option<ManifestEntry>> {
        let _guard = self.manifest_lock.lock().await;
        let path = self.manifest_path();
        let mut manifest = Manifest::load(&path)?;
        let previous = manifest.subjects.insert(subject.to_string(), entry);
        manifest.save(&path)?;
        Ok(previous)
    }

    /// Remove every version table of `subject` except the ones in `keep`.
    fn prune_versions(&self, subject: &str, keep: &[String]) {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(subject, error = %e, "cannot list versions to prune");
                return;
            }
        };
        let prefix = format!("{subject}__");
        for entry in entries.filter_map(std::result::Result::ok) {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(".lance")) else { continue };
            let Some(version) = name.strip_prefix(&prefix) else { continue };
            // Tables of a subject whose own name starts with `{subject}__` are not ours.
            if !version.starts_with('v') || version.contains("__") || keep.iter().any(|k| k == name) {
                continue;
            }
            self.remove_table_dir(name);
        }
    }

    fn remove_table_dir(&self, name: &str) {
        let dir = self.root.join(format!("{name}.lance"));
        if !dir.exists() {
            return;
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => debug!(table = name, "old version removed"),
            Err(e) => warn!(table = name, error = %e, "could not remove old version"),
        }
    }
}
