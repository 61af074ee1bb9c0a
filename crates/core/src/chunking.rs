use crate::error::LoadError;
use crate::models::{ChunkingOptions, DocChunk, DocumentFingerprint};
use sha2::{Digest, Sha256};

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

fn validate(options: &ChunkingOptions) -> Result<(), LoadError> {
    if options.max_chars == 0 {
        return Err(LoadError::InvalidChunkConfig(
            "max_chars must be positive".to_string(),
        ));
    }
    if options.overlap_chars >= options.max_chars {
        return Err(LoadError::InvalidChunkConfig(format!(
            "overlap_chars {} must be smaller than max_chars {}",
            options.overlap_chars, options.max_chars
        )));
    }
    Ok(())
}

/// Splits text into spans of at most `max_chars` characters. Paragraphs are
/// accumulated until the cap; oversized paragraphs fall back to a sliding
/// character window with `overlap_chars` of overlap. Same input always
/// yields the same boundaries.
pub fn split_text(text: &str, options: &ChunkingOptions) -> Vec<String> {
    let paragraphs = text
        .split("\n\n")
        .map(|paragraph| paragraph.trim().replace('\t', " "))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>();

    let mut grouped = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        if current.is_empty() {
            current.push_str(&paragraph);
            continue;
        }

        if current.len() + paragraph.len() + 2 <= options.max_chars {
            current.push_str("\n\n");
            current.push_str(&paragraph);
        } else {
            grouped.push(std::mem::take(&mut current));
            current.push_str(&paragraph);
        }
    }

    if !current.is_empty() {
        grouped.push(current);
    }

    let mut chunks = Vec::new();
    for piece in grouped {
        if piece.chars().count() <= options.max_chars {
            chunks.push(piece);
            continue;
        }

        let chars: Vec<char> = piece.chars().collect();
        // Callers may bypass build_chunks' validation; keep the window
        // advancing even for a degenerate overlap.
        let step = options
            .max_chars
            .saturating_sub(options.overlap_chars)
            .max(1);
        let mut start = 0;
        while start < chars.len() {
            let end = (start + options.max_chars).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
    }

    chunks
}

/// Builds the chunks for one page, continuing the document-wide index at
/// `global_index`. Returns the chunks and the next free index.
pub fn build_chunks(
    document: &DocumentFingerprint,
    page: u32,
    page_text: &str,
    options: &ChunkingOptions,
    global_index: u64,
) -> Result<(Vec<DocChunk>, u64), LoadError> {
    validate(options)?;

    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for text in split_text(page_text, options) {
        let chunk_id = make_chunk_id(&document.document_id, page, cursor, &text);
        chunks.push(DocChunk {
            chunk_id,
            document_id: document.document_id.clone(),
            source_path: document.source_path.clone(),
            page,
            chunk_index: cursor,
            text,
        });
        cursor = cursor.saturating_add(1);
    }

    Ok((chunks, cursor))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> DocumentFingerprint {
        DocumentFingerprint {
            document_id: "doc-1".to_string(),
            document_title: "Test".to_string(),
            source_path: "/tmp/test.pdf".to_string(),
            checksum: "checksum".to_string(),
            ingested_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn splitting_is_deterministic() {
        let options = ChunkingOptions {
            max_chars: 40,
            overlap_chars: 8,
        };
        let text = "First paragraph here.\n\nSecond paragraph, somewhat longer than the first one.";

        let first = split_text(text, &options);
        let second = split_text(text, &options);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn no_chunk_exceeds_max_chars() {
        let options = ChunkingOptions {
            max_chars: 25,
            overlap_chars: 5,
        };
        let text = "x".repeat(200);

        for chunk in split_text(&text, &options) {
            assert!(chunk.chars().count() <= options.max_chars);
        }
    }

    #[test]
    fn oversized_paragraph_windows_carry_overlap() {
        let options = ChunkingOptions {
            max_chars: 10,
            overlap_chars: 4,
        };
        let text = "abcdefghijklmnopqrstuvwxyz";

        let chunks = split_text(text, &options);
        assert!(chunks.len() > 1);
        assert!(chunks[0].ends_with("ghij"));
        assert!(chunks[1].starts_with("ghij"));
    }

    #[test]
    fn build_chunks_threads_the_global_index() {
        let options = ChunkingOptions {
            max_chars: 30,
            overlap_chars: 5,
        };
        let (chunks, next) = build_chunks(
            &fingerprint(),
            1,
            "One paragraph.\n\nAnother paragraph that keeps going for a while.",
            &options,
            7,
        )
        .expect("valid config");

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].chunk_index, 7);
        assert_eq!(next, 7 + chunks.len() as u64);
        assert_eq!(chunks[0].document_id, "doc-1");
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let options = ChunkingOptions {
            max_chars: 4,
            overlap_chars: 9,
        };

        let chunks = split_text("abcdefghij", &options);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= options.max_chars);
        }
        assert_eq!(chunks[0], "abcd");
        assert_eq!(chunks[1], "bcde");
    }

    #[test]
    fn overlap_must_stay_below_max() {
        let options = ChunkingOptions {
            max_chars: 10,
            overlap_chars: 10,
        };
        let error = build_chunks(&fingerprint(), 1, "text", &options, 0)
            .expect_err("overlap >= max must be rejected");
        assert!(matches!(error, LoadError::InvalidChunkConfig(_)));
    }
}
