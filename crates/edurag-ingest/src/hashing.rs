use std::path::Path;
use walkdir::WalkDir;

use crate::discovery::relative_source;

/// blake3 over every file's relative path and contents, in path order.
///
/// Any added, removed, renamed or edited file changes the hash.
pub fn corpus_hash(dir: &Path) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_source(dir, entry.path());
        let bytes = std::fs::read(entry.path())?;
        hasher.update(rel.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
