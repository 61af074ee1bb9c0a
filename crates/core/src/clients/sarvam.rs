use crate::error::{SpeechServiceError, TranslationServiceError};
use crate::models::TtsOptions;
use crate::traits::{SpeechSynthesizer, Translator};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.sarvam.ai";

const API_KEY_HEADER: &str = "api-subscription-key";

/// Translation client for the Sarvam `/translate` endpoint.
#[derive(Clone)]
pub struct SarvamTranslator {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl SarvamTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Translator for SarvamTranslator {
    async fn translate(
        &self,
        input: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/translate",
                self.endpoint.trim_end_matches('/')
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({
                "input": input,
                "source_language_code": source,
                "target_language_code": target,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslationServiceError::BackendResponse {
                backend: "sarvam".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        parse_translate_response(&payload)
    }
}

fn parse_translate_response(payload: &Value) -> Result<String, TranslationServiceError> {
    payload
        .pointer("/translated_text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TranslationServiceError::BackendResponse {
            backend: "sarvam".to_string(),
            details: "translated_text missing".to_string(),
        })
}

/// Text-to-speech client for the Sarvam `/text-to-speech` endpoint. The
/// response carries base64 WAV segments which are decoded and concatenated.
#[derive(Clone)]
pub struct SarvamSpeech {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl SarvamSpeech {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SarvamSpeech {
    async fn synthesize(
        &self,
        text: &str,
        target_language_code: &str,
        options: &TtsOptions,
    ) -> Result<Vec<u8>, SpeechServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/text-to-speech",
                self.endpoint.trim_end_matches('/')
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({
                "text": text,
                "target_language_code": target_language_code,
                "model": options.model,
                "speaker": options.speaker,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpeechServiceError::BackendResponse {
                backend: "sarvam".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        decode_audio_segments(&payload)
    }
}

fn decode_audio_segments(payload: &Value) -> Result<Vec<u8>, SpeechServiceError> {
    let segments = payload
        .pointer("/audios")
        .and_then(Value::as_array)
        .ok_or_else(|| SpeechServiceError::BackendResponse {
            backend: "sarvam".to_string(),
            details: "audios missing".to_string(),
        })?;

    if segments.is_empty() {
        return Err(SpeechServiceError::BackendResponse {
            backend: "sarvam".to_string(),
            details: "audios empty".to_string(),
        });
    }

    let mut audio = Vec::new();
    for segment in segments {
        let encoded = segment
            .as_str()
            .ok_or_else(|| SpeechServiceError::BackendResponse {
                backend: "sarvam".to_string(),
                details: "audio segment is not a string".to_string(),
            })?;
        audio.extend(STANDARD.decode(encoded)?);
    }

    Ok(audio)
}
