use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pdf_qa_core::{
    EmbeddingServiceError, GenerationError, LoadError, PipelineError, QaPipeline,
    SpeechServiceError, SpeechSynthesizer, TranslationServiceError, Translator, TtsOptions,
    VoicePipeline, WORKING_LANGUAGE,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Source-language sentinel the translation collaborator treats as
/// "detect the language".
const AUTO_SOURCE: &str = "auto";

/// Request-scoped handles, constructed once at process start. The index
/// itself is re-read from disk on every query by the store.
#[derive(Clone)]
pub struct AppState {
    pub qa: Arc<QaPipeline>,
    pub voice: Arc<VoicePipeline>,
    pub translator: Arc<dyn Translator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub default_kb_file: PathBuf,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/upload", post(upload))
        .route("/api/view_default_file", get(view_default_file))
        .route("/api/ask", post(ask))
        .route("/api/voice-ask", post(voice_ask))
        .route("/api/translate", post(translate))
        .route("/api/tts", post(tts))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Structured failure reported to the caller. Nothing is retried and no
/// fallback computation runs; the message is the error's display form.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn input_missing(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        let status = match &error {
            PipelineError::Load(LoadError::Io(_)) => StatusCode::NOT_FOUND,
            PipelineError::Load(_) => StatusCode::BAD_REQUEST,
            PipelineError::Embedding(EmbeddingServiceError::Storage(_))
            | PipelineError::Embedding(EmbeddingServiceError::Serialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::Embedding(_)
            | PipelineError::Generation(_)
            | PipelineError::Translation(_)
            | PipelineError::Speech(_) => StatusCode::BAD_GATEWAY,
        };
        warn!(%error, "request failed");
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(error: LoadError) -> Self {
        PipelineError::from(error).into()
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        PipelineError::from(error).into()
    }
}

impl From<TranslationServiceError> for ApiError {
    fn from(error: TranslationServiceError) -> Self {
        PipelineError::from(error).into()
    }
}

impl From<SpeechServiceError> for ApiError {
    fn from(error: SpeechServiceError) -> Self {
        PipelineError::from(error).into()
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let query = require_text(request.query, "Query missing")?;
    let answer = state.qa.ask(&query).await?;
    Ok(Json(AskResponse { answer }))
}

#[derive(Debug, Deserialize)]
pub struct VoiceAskRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_target_language")]
    pub target_language_code: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_tts_speaker")]
    pub tts_speaker: String,
}

pub async fn voice_ask(
    State(state): State<AppState>,
    Json(request): Json<VoiceAskRequest>,
) -> Result<Response, ApiError> {
    let query = require_text(request.query, "Query missing")?;
    let tts = TtsOptions {
        model: request.tts_model,
        speaker: request.tts_speaker,
    };

    let voice_answer = state
        .voice
        .voice_ask(&query, &request.target_language_code, &tts)
        .await?;

    Ok(wav_response(voice_answer.audio_wav))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default = "default_source_language")]
    pub source_language_code: String,
    #[serde(default = "default_target_language")]
    pub target_language_code: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let input = require_text(request.input, "Input text missing")?;
    let translated_text = state
        .translator
        .translate(
            &input,
            &request.source_language_code,
            &request.target_language_code,
        )
        .await?;
    Ok(Json(TranslateResponse { translated_text }))
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default = "default_target_language")]
    pub target_language_code: String,
    #[serde(default = "default_tts_model")]
    pub model: String,
    #[serde(default = "default_tts_speaker")]
    pub speaker: String,
}

pub async fn tts(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, ApiError> {
    let text = require_text(request.text, "Text missing")?;
    let options = TtsOptions {
        model: request.model,
        speaker: request.speaker,
    };
    let audio = state
        .speech
        .synthesize(&text, &request.target_language_code, &options)
        .await?;
    Ok(wav_response(audio))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub chunks_indexed: usize,
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut use_default = false;
    let mut uploaded: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::input_missing(error.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("use_default_file") => {
                let value = field
                    .text()
                    .await
                    .map_err(|error| ApiError::input_missing(error.to_string()))?;
                use_default = value == "true";
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| ApiError::input_missing(error.to_string()))?;
                uploaded = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let path = if use_default {
        state.default_kb_file.clone()
    } else {
        let (file_name, bytes) =
            uploaded.ok_or_else(|| ApiError::input_missing("No file uploaded"))?;
        if file_name.is_empty() {
            return Err(ApiError::input_missing("No selected file"));
        }
        let file_name = sanitize_file_name(&file_name);
        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(|error| PipelineError::from(LoadError::Io(error)))?;
        let path = state.upload_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|error| PipelineError::from(LoadError::Io(error)))?;
        path
    };

    let chunks_indexed = state.qa.ingest_document(&path).await?;
    Ok(Json(UploadResponse {
        success: true,
        chunks_indexed,
    }))
}

pub async fn view_default_file(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bytes = tokio::fs::read(&state.default_kb_file)
        .await
        .map_err(|error| PipelineError::from(LoadError::Io(error)))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        bytes,
    )
        .into_response())
}

fn wav_response(audio: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/wav")],
        audio,
    )
        .into_response()
}

fn require_text(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::input_missing(message)),
    }
}

/// Uploads land in a flat directory; strip any path components the client
/// sent along.
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .to_string()
}

fn default_target_language() -> String {
    WORKING_LANGUAGE.to_string()
}

fn default_source_language() -> String {
    AUTO_SOURCE.to_string()
}

fn default_tts_model() -> String {
    TtsOptions::default().model
}

fn default_tts_speaker() -> String {
    TtsOptions::default().speaker
}
