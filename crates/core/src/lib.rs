pub mod chunking;
pub mod clients;
pub mod composer;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod retriever;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use chunking::{build_chunks, normalize_whitespace, split_text};
pub use clients::{GeminiChatModel, GeminiEmbedder, SarvamSpeech, SarvamTranslator};
pub use composer::{build_context, AnswerComposer, FALLBACK_ANSWER, SYSTEM_PROMPT};
pub use error::{
    EmbeddingServiceError, GenerationError, LoadError, PipelineError, SpeechServiceError,
    TranslationServiceError,
};
pub use extractor::{extract_page_texts, PageText, PdfExtractor};
pub use ingest::{build_document_fingerprint, digest_file, ingest_document_chunks};
pub use models::{
    ChunkingOptions, DocChunk, DocumentFingerprint, IndexRecord, RetrievedChunk, TtsOptions,
    VoiceAnswer, DEFAULT_TOP_K, WORKING_LANGUAGE,
};
pub use pipeline::{QaPipeline, VoicePipeline};
pub use retriever::Retriever;
pub use store::{cosine_similarity, DiskVectorStore};
pub use traits::{ChatModel, Embedder, SpeechSynthesizer, Translator, VectorIndex};
