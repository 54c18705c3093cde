use async_trait::async_trait;
use mri_app_server::AppState;
use mri_app_server::HeaderIdentity;
use mri_app_server::WebhookAlerter;
use mri_chat::ChatConfig;
use mri_chat::ChatPipeline;
use mri_chat::CompletionError;
use mri_chat::CompletionRequest;
use mri_chat::CompletionService;
use mri_embeddings::Embedder;
use mri_embeddings::EmbeddingError;
use mri_progress_store::JsonProgressStore;
use mri_progress_store::ProgressError;
use mri_progress_store::ProgressStore;
use mri_vector_store::Corpus;
use mri_vector_store::CorpusEntry;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const USER_HEADER: &str = "x-user-id";

/// Embedder returning canned vectors keyed by question text.
#[derive(Default)]
pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    fail: bool,
}

impl ScriptedEmbedder {
    pub fn constant(vector: Vec<f32>) -> Self {
        Self {
            fallback: vector,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_vector(mut self, question: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(question.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    fn model_id(&self) -> String {
        "scripted-embedder".to_string()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "UNAVAILABLE: embedding backend down".to_string(),
            });
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Completion service that records requests and returns a fixed reply.
pub struct ScriptedCompletion {
    reply: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn model_id(&self) -> String {
        "scripted-completion".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().await.push(request.clone());
        self.reply.clone().ok_or_else(|| CompletionError::Api {
            status: 500,
            message: "INTERNAL: model crashed".to_string(),
        })
    }
}

/// Completion call that never returns. Signals when a call starts and when
/// its future is dropped.
#[derive(Default)]
pub struct HangingCompletion {
    pub started: Notify,
    pub dropped: Notify,
}

struct NotifyOnDrop<'a>(&'a Notify);

impl Drop for NotifyOnDrop<'_> {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

#[async_trait]
impl CompletionService for HangingCompletion {
    fn model_id(&self) -> String {
        "hanging-completion".to_string()
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        let _on_drop = NotifyOnDrop(&self.dropped);
        self.started.notify_one();
        std::future::pending().await
    }
}

/// Progress store whose backend is down or hangs.
pub struct BrokenProgressStore {
    pub hang: Option<Duration>,
}

#[async_trait]
impl ProgressStore for BrokenProgressStore {
    async fn is_completed(&self, _user_id: &str, _slug: &str) -> Result<bool, ProgressError> {
        Err(ProgressError::Unavailable("connection refused".to_string()))
    }

    async fn mark_completed(&self, _user_id: &str, _slug: &str) -> Result<(), ProgressError> {
        Err(ProgressError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), ProgressError> {
        if let Some(delay) = self.hang {
            tokio::time::sleep(delay).await;
            return Ok(());
        }
        Err(ProgressError::Unavailable("connection refused".to_string()))
    }
}

/// Passages `A` (titled T1) and `B` (titled T2) on orthogonal axes.
pub fn two_passage_corpus() -> anyhow::Result<Corpus> {
    Ok(Corpus::from_entries(vec![
        CorpusEntry::new("A", vec![1.0, 0.0], "T1", "u1"),
        CorpusEntry::new("B", vec![0.0, 1.0], "T2", "u2"),
    ])?)
}

pub struct StateBuilder {
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionService>,
    progress: Arc<dyn ProgressStore>,
    alert_webhook_url: Option<String>,
    availability_timeout: Duration,
}

impl StateBuilder {
    pub fn new(embedder: ScriptedEmbedder, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            embedder: Arc::new(embedder),
            completion,
            progress: Arc::new(JsonProgressStore::in_memory()),
            alert_webhook_url: None,
            availability_timeout: Duration::from_secs(3),
        }
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressStore>) -> Self {
        self.progress = progress;
        self
    }

    pub fn alert_webhook(mut self, url: String) -> Self {
        self.alert_webhook_url = Some(url);
        self
    }

    pub fn availability_timeout(mut self, timeout: Duration) -> Self {
        self.availability_timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<AppState> {
        let pipeline = ChatPipeline::new(
            ChatConfig::default(),
            Arc::new(two_passage_corpus()?),
            self.embedder,
            self.completion,
        )?;
        Ok(AppState::new(
            Arc::new(pipeline),
            self.progress,
            Arc::new(HeaderIdentity::new(USER_HEADER)?),
            WebhookAlerter::new(self.alert_webhook_url)?,
            self.availability_timeout,
        ))
    }
}

/// Server bound to an ephemeral localhost port; stopped on drop.
pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    state: AppState,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn spawn(state: AppState) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{addr}");
        let handle = tokio::spawn(mri_app_server::serve(listener, state.clone()));
        Ok(Self {
            addr,
            base_url,
            state,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.state.shutdown_token().cancel();
        self.handle.abort();
    }
}
