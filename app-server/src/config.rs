use anyhow::Context;
use mri_chat::ChatConfig;
use mri_chat::CompletionConfig;
use mri_chat::DEFAULT_COMPLETION_MODEL;
use mri_embeddings::DEFAULT_EMBEDDING_MODEL;
use mri_embeddings::DEFAULT_GEMINI_BASE_URL;
use mri_embeddings::EmbeddingConfig;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (host:port)
    #[serde(default = "default_bind")]
    pub bind: String,

    /// JSON array of embedded passages loaded at startup
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Request header carrying the authenticated user id
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Incoming webhook notified when the progress store is unreachable
    #[serde(default)]
    pub alert_webhook_url: Option<String>,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub gemini: GeminiSettings,

    #[serde(default)]
    pub progress: ProgressSettings,
}

/// Shared settings for both Gemini clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// HTTP client timeout; the pipeline applies its own per-stage limits on top
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSettings {
    /// JSON file for completion records; in-memory only when unset
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default = "default_availability_timeout_ms")]
    pub availability_timeout_ms: u64,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("public/embeddings.json")
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_availability_timeout_ms() -> u64 {
    3_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            corpus_path: default_corpus_path(),
            identity_header: default_identity_header(),
            alert_webhook_url: None,
            chat: ChatConfig::default(),
            gemini: GeminiSettings::default(),
            progress: ProgressSettings::default(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
            request_timeout_ms: default_request_timeout_ms(),
            temperature: None,
        }
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            store_path: None,
            availability_timeout_ms: default_availability_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bind.trim().is_empty() {
            return Err("bind must not be empty".to_string());
        }
        if self.identity_header.trim().is_empty() {
            return Err("identity_header must not be empty".to_string());
        }
        if self.progress.availability_timeout_ms == 0 {
            return Err("progress.availability_timeout_ms must be > 0".to_string());
        }
        if self.gemini.request_timeout_ms == 0 {
            return Err("gemini.request_timeout_ms must be > 0".to_string());
        }
        self.chat.validate().map_err(|err| format!("chat: {err}"))
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: self.gemini.base_url.clone(),
            model: self.gemini.embedding_model.clone(),
            request_timeout_ms: self.gemini.request_timeout_ms,
        }
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            base_url: self.gemini.base_url.clone(),
            model: self.gemini.completion_model.clone(),
            request_timeout_ms: self.gemini.request_timeout_ms,
            temperature: self.gemini.temperature,
        }
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.progress.availability_timeout_ms)
    }
}
