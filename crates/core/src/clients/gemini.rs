use crate::error::{EmbeddingServiceError, GenerationError};
use crate::traits::{ChatModel, Embedder};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

/// Dimension of the embedding-001 vectors.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Embedding client for the Google Generative Language REST API.
#[derive(Clone)]
pub struct GeminiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL, api_key, DEFAULT_EMBEDDING_MODEL)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            operation,
            self.api_key
        )
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        let response = self
            .client
            .post(self.url("embedContent"))
            .json(&json!({
                "model": format!("models/{}", self.model),
                "content": { "parts": [{ "text": text }] },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmbeddingServiceError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        parse_embed_response(&payload)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let requests = texts
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.model),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect::<Vec<_>>();

        let response = self
            .client
            .post(self.url("batchEmbedContents"))
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmbeddingServiceError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        let vectors = parse_batch_embed_response(&payload)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingServiceError::BackendResponse {
                backend: "gemini".to_string(),
                details: format!("{} embeddings for {} inputs", vectors.len(), texts.len()),
            });
        }

        Ok(vectors)
    }
}

fn parse_embed_response(payload: &Value) -> Result<Vec<f32>, EmbeddingServiceError> {
    values_to_vector(payload.pointer("/embedding/values")).ok_or_else(|| {
        EmbeddingServiceError::BackendResponse {
            backend: "gemini".to_string(),
            details: "embedding values missing".to_string(),
        }
    })
}

fn parse_batch_embed_response(payload: &Value) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
    let embeddings = payload
        .pointer("/embeddings")
        .and_then(Value::as_array)
        .ok_or_else(|| EmbeddingServiceError::BackendResponse {
            backend: "gemini".to_string(),
            details: "embeddings array missing".to_string(),
        })?;

    embeddings
        .iter()
        .map(|entry| {
            values_to_vector(entry.pointer("/values")).ok_or_else(|| {
                EmbeddingServiceError::BackendResponse {
                    backend: "gemini".to_string(),
                    details: "embedding values missing".to_string(),
                }
            })
        })
        .collect()
}

fn values_to_vector(values: Option<&Value>) -> Option<Vec<f32>> {
    let values = values?.as_array()?;
    values
        .iter()
        .map(|value| value.as_f64().map(|number| number as f32))
        .collect()
}

/// Chat-completion client for the same API, pinned at temperature 0.
#[derive(Clone)]
pub struct GeminiChatModel {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiChatModel {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL, api_key, DEFAULT_CHAT_MODEL)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<Option<String>, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&json!({
                "systemInstruction": { "parts": [{ "text": system }] },
                "contents": [{ "role": "user", "parts": [{ "text": user }] }],
                "generationConfig": { "temperature": 0.0 },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        Ok(parse_generate_response(&payload))
    }
}

/// Pulls the first candidate's text out of a generateContent payload.
/// `None` means the response was structurally valid but carried no answer.
fn parse_generate_response(payload: &Value) -> Option<String> {
    let text = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)?
        .trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_batch_embed_response, parse_embed_response, parse_generate_response};
    use serde_json::json;

    #[test]
    fn embed_response_values_are_parsed() {
        let payload = json!({ "embedding": { "values": [0.25, -0.5] } });
        let vector = parse_embed_response(&payload).expect("values present");
        assert_eq!(vector, vec![0.25, -0.5]);
    }

    #[test]
    fn embed_response_without_values_is_an_error() {
        let payload = json!({ "embedding": {} });
        assert!(parse_embed_response(&payload).is_err());
    }

    #[test]
    fn batch_embed_response_preserves_order() {
        let payload = json!({
            "embeddings": [
                { "values": [1.0, 0.0] },
                { "values": [0.0, 1.0] },
            ]
        });
        let vectors = parse_batch_embed_response(&payload).expect("embeddings present");
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn generate_response_text_is_extracted() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Paris." }] } }
            ]
        });
        assert_eq!(parse_generate_response(&payload).as_deref(), Some("Paris."));
    }

    #[test]
    fn answerless_generate_response_is_none() {
        let payload = json!({ "candidates": [] });
        assert_eq!(parse_generate_response(&payload), None);

        let blank = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "   " }] } }
            ]
        });
        assert_eq!(parse_generate_response(&blank), None);
    }
}
