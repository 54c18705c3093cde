//! HTTP plumbing shared by every Gemini client in the workspace.

use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeminiClientError {
    #[error("missing Gemini API key")]
    MissingApiKey,

    #[error("invalid Gemini API key: {0}")]
    InvalidApiKey(String),

    #[error("{0}")]
    Build(#[from] reqwest::Error),
}

impl GeminiClientError {
    /// The caller supplied a bad key, as opposed to a TLS or runtime failure.
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidApiKey(_))
    }
}

/// JSON client that sends `api_key` as a sensitive `x-goog-api-key` header on
/// every request and gives up after `timeout`.
pub fn gemini_client(
    api_key: &str,
    timeout: Duration,
) -> Result<reqwest::Client, GeminiClientError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(GeminiClientError::MissingApiKey);
    }

    let mut key = HeaderValue::from_str(api_key)
        .map_err(|e| GeminiClientError::InvalidApiKey(e.to_string()))?;
    key.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder()
        .timeout(timeout.max(Duration::from_millis(1)))
        .default_headers(headers)
        .build()?)
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Read a failed response and return the API's error text, prefixed with its
/// status code when present. Bodies that are not a Gemini error envelope are
/// returned as-is.
pub async fn api_error_message(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => error_message(body),
        Err(_) => "<body unavailable>".to_string(),
    }
}

fn error_message(body: String) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{code}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body,
    }
}
