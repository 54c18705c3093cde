use crate::alert::WebhookAlerter;
use crate::config::ServerConfig;
use crate::identity::HeaderIdentity;
use crate::identity::IdentityProvider;
use anyhow::Context;
use anyhow::anyhow;
use mri_chat::ChatPipeline;
use mri_chat::GeminiCompletion;
use mri_embeddings::GeminiEmbedder;
use mri_progress_store::JsonProgressStore;
use mri_progress_store::ProgressStore;
use mri_vector_store::Corpus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

/// Shared handles for every request handler
#[derive(Clone)]
pub struct AppState {
    pub(crate) pipeline: Arc<ChatPipeline>,
    pub(crate) progress: Arc<dyn ProgressStore>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) alerter: WebhookAlerter,
    pub(crate) availability_timeout: Duration,
    pub(crate) shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        pipeline: Arc<ChatPipeline>,
        progress: Arc<dyn ProgressStore>,
        identity: Arc<dyn IdentityProvider>,
        alerter: WebhookAlerter,
        availability_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            progress,
            identity,
            alerter,
            availability_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build production state: load the corpus, open the progress store and
    /// construct the Gemini clients.
    pub async fn from_config(config: &ServerConfig, api_key: &str) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|err| anyhow!("invalid configuration: {err}"))?;

        let corpus = Corpus::load(&config.corpus_path)
            .await
            .with_context(|| format!("load corpus {}", config.corpus_path.display()))?;
        if corpus.is_empty() {
            warn!(
                "Corpus {} is empty; answers will not be grounded",
                config.corpus_path.display()
            );
        }

        let embedder = GeminiEmbedder::new(api_key, &config.embedding_config())
            .context("build embedding client")?;
        let completion = GeminiCompletion::new(api_key, &config.completion_config())
            .context("build completion client")?;
        let pipeline = ChatPipeline::new(
            config.chat.clone(),
            Arc::new(corpus),
            Arc::new(embedder),
            Arc::new(completion),
        )?;

        let progress: Arc<dyn ProgressStore> = match &config.progress.store_path {
            Some(path) => Arc::new(
                JsonProgressStore::open(path)
                    .await
                    .with_context(|| format!("open progress store {}", path.display()))?,
            ),
            None => {
                info!("No progress.store_path configured; completions are kept in memory");
                Arc::new(JsonProgressStore::in_memory())
            }
        };

        let identity = HeaderIdentity::new(&config.identity_header)
            .with_context(|| format!("invalid identity_header {:?}", config.identity_header))?;
        let alerter = WebhookAlerter::new(config.alert_webhook_url.clone())
            .context("build alert client")?;

        Ok(Self::new(
            Arc::new(pipeline),
            progress,
            Arc::new(identity),
            alerter,
            config.availability_timeout(),
        ))
    }

    /// Token that stops the server and cancels in-flight chat requests.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
