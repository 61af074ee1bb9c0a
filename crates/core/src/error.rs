use thiserror::Error;

/// Failures while loading and chunking a source document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf had no readable page text: {0}")]
    NoText(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

/// Failures while embedding text or reading/writing the persisted index.
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("index storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding dimension {got} does not match expected {want}")]
    DimensionMismatch { got: usize, want: usize },
}

/// Failures during the language-model completion call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum TranslationServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum SpeechServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("audio decode error: {0}")]
    AudioDecode(#[from] base64::DecodeError),
}

/// Union error returned by the pipeline orchestrator. A failure in any leg
/// aborts the whole request; no partial results are surfaced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingServiceError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Translation(#[from] TranslationServiceError),

    #[error(transparent)]
    Speech(#[from] SpeechServiceError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
