//! Corpus discovery and loading.
//!
//! Walks the configured root directory for PDF files, extracts their text,
//! attaches filename-derived provenance, and splits everything into
//! header-prefixed chunks ready for embedding. A single file failing to
//! extract is logged and skipped; the rest of the corpus still loads.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chunk;
use crate::config::Config;
use crate::metadata;
use crate::models::DocumentChunk;

/// Recursively discover `*.pdf` files (case-insensitive suffix) under `root`,
/// sorted by path for deterministic ordering.
pub fn discover_pdfs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_pdf = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Load the whole corpus into chunks. Returns an empty vec when the root
/// holds no PDFs; fails only when the root itself is missing.
pub fn load_corpus(config: &Config) -> Result<Vec<DocumentChunk>> {
    let files = discover_pdfs(&config.corpus.root)?;

    if files.is_empty() {
        println!(
            "No PDF files found under '{}'.",
            config.corpus.root.display()
        );
        return Ok(Vec::new());
    }

    println!("Found {} PDF files. Loading...", files.len());

    let mut chunks = Vec::new();
    let mut loaded_files = 0usize;

    for path in &files {
        let text = match pdf_extract::extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Warning: failed to load {}: {}", path.display(), e);
                continue;
            }
        };

        let meta = metadata::extract_metadata(path);
        let file_chunks = chunk::build_chunks(
            &meta,
            &path.to_string_lossy(),
            &config.db.collection,
            &text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        );

        println!("Loaded {} chunks from {}", file_chunks.len(), meta.file_name);
        loaded_files += 1;
        chunks.extend(file_chunks);
    }

    println!(
        "Created {} enriched chunks from {} files.",
        chunks.len(),
        loaded_files
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_an_error() {
        let err = discover_pdfs(Path::new("/nonexistent/corpus/root")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn empty_root_yields_no_files() {
        let tmp = TempDir::new().unwrap();
        let files = discover_pdfs(tmp.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn suffix_match_is_case_insensitive_and_recursive() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("schemes/HDFC_Liquid_Fund");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("a.pdf"), b"x").unwrap();
        fs::write(nested.join("b.PDF"), b"x").unwrap();
        fs::write(nested.join("notes.txt"), b"x").unwrap();
        fs::write(tmp.path().join("c.Pdf"), b"x").unwrap();

        let files = discover_pdfs(tmp.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| {
            f.extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        }));
    }

    #[test]
    fn discovery_order_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.pdf"), b"x").unwrap();
        fs::write(tmp.path().join("a.pdf"), b"x").unwrap();
        let files = discover_pdfs(tmp.path()).unwrap();
        assert!(files[0].ends_with("a.pdf"));
        assert!(files[1].ends_with("b.pdf"));
    }

    #[test]
    fn unreadable_pdf_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.pdf"), b"not a pdf at all").unwrap();

        let mut config = Config::default();
        config.corpus.root = tmp.path().to_path_buf();

        let chunks = load_corpus(&config).unwrap();
        assert!(chunks.is_empty());
    }
}
