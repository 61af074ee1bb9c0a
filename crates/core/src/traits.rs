use crate::error::{
    EmbeddingServiceError, GenerationError, SpeechServiceError, TranslationServiceError,
};
use crate::models::{IndexRecord, RetrievedChunk, TtsOptions};
use async_trait::async_trait;

/// Remote embedding provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError>;
}

/// Durable similarity index. Append-only: records are never updated in
/// place, and re-appending identical input duplicates it.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn append(&self, records: Vec<IndexRecord>) -> Result<(), EmbeddingServiceError>;

    /// Top-k matches by descending cosine similarity. A never-populated
    /// index returns an empty result, not an error.
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, EmbeddingServiceError>;

    async fn count(&self) -> Result<usize, EmbeddingServiceError>;
}

/// Remote language-model completion. `Ok(None)` means the call succeeded
/// but the response carried no answer text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<Option<String>, GenerationError>;
}

/// Remote translation collaborator. `source` may be "auto".
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        input: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationServiceError>;
}

/// Remote text-to-speech collaborator. Returns raw WAV bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        target_language_code: &str,
        options: &TtsOptions,
    ) -> Result<Vec<u8>, SpeechServiceError>;
}
