use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language the index is maintained in. Queries in other languages are
/// translated to this before retrieval and answers translated back.
pub const WORKING_LANGUAGE: &str = "en-IN";

/// Retrieval depth fixed for this deployment.
pub const DEFAULT_TOP_K: usize = 10;

/// Identity of a source document, computed once on ingest and discarded
/// after chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub document_title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// A bounded-size span of extracted page text, the unit of embedding
/// and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub source_path: String,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
}

/// A chunk plus its embedding as persisted in the index. Append-only;
/// never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub chunk_id: String,
    pub document_id: String,
    pub source_path: String,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
    pub vector: Vec<f32>,
}

impl IndexRecord {
    pub fn from_chunk(chunk: DocChunk, vector: Vec<f32>) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            document_id: chunk.document_id,
            source_path: chunk.source_path,
            page: chunk.page,
            chunk_index: chunk.chunk_index,
            text: chunk.text,
            vector,
        }
    }
}

/// One similarity hit, ranked by descending cosine score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub source_path: String,
    pub page: u32,
    pub text: String,
    pub score: f64,
}

/// Splitter settings. Boundaries are deterministic for a given input.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

/// Voice/model selectors forwarded to the speech collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsOptions {
    pub model: String,
    pub speaker: String,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            model: "bulbul:v2".to_string(),
            speaker: "anushka".to_string(),
        }
    }
}

/// Final product of the voice path: the localized answer text and its
/// synthesized audio.
#[derive(Debug, Clone)]
pub struct VoiceAnswer {
    pub answer: String,
    pub audio_wav: Vec<u8>,
}
