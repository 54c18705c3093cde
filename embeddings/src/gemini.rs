use crate::DEFAULT_EMBEDDING_MODEL;
use crate::DEFAULT_GEMINI_BASE_URL;
use crate::Embedder;
use crate::client::api_error_message;
use crate::client::gemini_client;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Configuration for the Gemini embedding client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Generative Language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model, with or without the `models/` prefix
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout enforced by the HTTP client
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Embeds text through the Gemini `embedContent` endpoint.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: &str, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = gemini_client(api_key, Duration::from_millis(config.request_timeout_ms))
            .map_err(|e| {
                if e.is_key_error() {
                    EmbeddingError::InvalidInput(e.to_string())
                } else {
                    EmbeddingError::Client(e.to_string())
                }
            })?;

        let model = qualified_model(&config.model);
        let endpoint = format!(
            "{}/v1beta/{model}:embedContent",
            config.base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            model,
        })
    }
}

fn qualified_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_id(&self) -> String {
        format!("gemini:{}", self.model)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".into()));
        }

        let request = EmbedContentRequest {
            model: &self.model,
            content: Content {
                role: "user",
                parts: vec![Part { text }],
            },
        };

        debug!("Embedding {} chars with {}", text.len(), self.model);
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: api_error_message(response).await,
            });
        }

        let parsed: EmbedContentResponse = response.json().await?;
        if parsed.embedding.values.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }

        Ok(parsed.embedding.values)
    }
}
