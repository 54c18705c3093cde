use crate::history::HistoryTurn;
use async_trait::async_trait;
use log::debug;
use log::warn;
use mri_embeddings::DEFAULT_GEMINI_BASE_URL;
use mri_embeddings::api_error_message;
use mri_embeddings::gemini_client;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Completion model used when none is configured
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-1.5-pro-latest";

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Completion API returned no text")]
    EmptyResponse,
}

/// Everything the model sees for one answer
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub history: Vec<HistoryTurn>,
    pub prompt: String,
}

/// Produces the assistant's raw text for a request.
#[async_trait]
pub trait CompletionService: Send + Sync {
    fn model_id(&self) -> String;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Configuration for the Gemini completion client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Sampling temperature; the API default applies when unset
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_ms: default_request_timeout_ms(),
            temperature: None,
        }
    }
}

/// Calls the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl GeminiCompletion {
    pub fn new(api_key: &str, config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = gemini_client(api_key, Duration::from_millis(config.request_timeout_ms))
            .map_err(|e| {
                if e.is_key_error() {
                    CompletionError::InvalidInput(e.to_string())
                } else {
                    CompletionError::Client(e.to_string())
                }
            })?;

        let model = config
            .model
            .trim()
            .trim_start_matches("models/")
            .to_string();
        let endpoint = format!(
            "{}/v1beta/models/{model}:generateContent",
            config.base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            model,
            temperature: config.temperature,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
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

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn request_body<'a>(
    request: &'a CompletionRequest,
    temperature: Option<f32>,
) -> GenerateContentRequest<'a> {
    let mut contents: Vec<Content<'a>> = request
        .history
        .iter()
        .map(|turn| Content {
            role: turn.role.as_str(),
            parts: vec![Part { text: &turn.text }],
        })
        .collect();
    contents.push(Content {
        role: "user",
        parts: vec![Part {
            text: &request.prompt,
        }],
    });

    GenerateContentRequest {
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: &request.system_instruction,
            }],
        },
        contents,
        generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
    }
}

fn answer_text(response: GenerateContentResponse) -> Result<String, CompletionError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        return match reason {
            Some(reason) => Err(CompletionError::Blocked(reason)),
            None => Err(CompletionError::EmptyResponse),
        };
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let blocked = matches!(
            candidate.finish_reason.as_deref(),
            Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")
        );
        return match candidate.finish_reason {
            Some(reason) if blocked => Err(CompletionError::Blocked(reason)),
            _ => Err(CompletionError::EmptyResponse),
        };
    }
    Ok(text)
}

#[async_trait]
impl CompletionService for GeminiCompletion {
    fn model_id(&self) -> String {
        format!("gemini:{}", self.model)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        if request.prompt.trim().is_empty() {
            return Err(CompletionError::InvalidInput("empty prompt".into()));
        }

        let body = request_body(request, self.temperature);
        debug!(
            "Requesting completion from {} with {} history turns",
            self.model,
            request.history.len()
        );
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Completion API returned {status}");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: api_error_message(response).await,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        answer_text(parsed)
    }
}
