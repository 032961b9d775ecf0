use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use edurag_core::types::validate_subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Pptx,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Immediate subdirectories of `corpus` whose names are usable subjects, sorted.
pub fn discover_subjects(corpus: &Path) -> std::io::Result<Vec<String>> {
    let mut subjects = Vec::new();
    for entry in std::fs::read_dir(corpus)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        match validate_subject(&name) {
            Ok(_) => subjects.push(name),
            Err(e) => warn!(dir = %entry.path().display(), error = %e, "skipping directory"),
        }
    }
    subjects.sort();
    Ok(subjects)
}

/// Supported documents under `dir`, recursively, in path order.
pub fn discover_documents(dir: &Path) -> Vec<(PathBuf, DocumentKind)> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| DocumentKind::from_path(e.path()).map(|k| (e.into_path(), k)))
        .collect()
}

/// `path` relative to `base`, with forward slashes.
pub fn relative_source(base: &Path, path: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).to_string_lossy().replace('\\', "/")
}
