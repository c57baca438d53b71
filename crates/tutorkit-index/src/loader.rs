use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Load lesson documents from a folder.
///
/// Plain-text and markdown files are picked up in sorted path order so the
/// `doc_N` source names stay stable across runs. A missing folder is an
/// error; an existing-but-empty one yields an empty corpus (the expert then
/// answers with the stock apology).
pub fn load_documents(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Err(Error::Corpus(format!(
            "knowledge dir not found: {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.path().extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("md") => paths.push(entry.path().to_path_buf()),
            _ => {}
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path)?;
        if !text.trim().is_empty() {
            docs.push(text);
        }
    }
    tracing::debug!(dir = %dir.display(), docs = docs.len(), "loaded knowledge corpus");
    Ok(docs)
}
