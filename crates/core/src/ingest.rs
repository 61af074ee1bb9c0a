use crate::chunking::{build_chunks, normalize_whitespace};
use crate::error::LoadError;
use crate::extractor::extract_page_texts;
use crate::models::{ChunkingOptions, DocChunk, DocumentFingerprint};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub fn digest_file(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, LoadError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoadError::MissingFileName(path.display().to_string()))?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Loads one document and splits it into ordered chunks covering all of its
/// readable pages. Fails with [`LoadError`] when the file is missing,
/// unreadable, or not a parseable PDF.
pub fn ingest_document_chunks(
    path: &Path,
    options: &ChunkingOptions,
) -> Result<Vec<DocChunk>, LoadError> {
    let fingerprint = build_document_fingerprint(path)?;
    let pages = extract_page_texts(path)?;

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for page in pages {
        let normalized = normalize_whitespace(&page.text);
        let (page_chunks, next_cursor) =
            build_chunks(&fingerprint, page.number, &normalized, options, cursor)?;
        cursor = next_cursor;
        chunks.extend(page_chunks);
    }

    Ok(chunks)
}
