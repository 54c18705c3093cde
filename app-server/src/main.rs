use anyhow::Context;
use anyhow::anyhow;
use clap::Parser;
use mri_app_server::AppState;
use mri_app_server::ServerConfig;
use mri_app_server::serve;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mri-app-server",
    about = "Chat and lesson progress API for MRI Learn"
)]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted.
    #[arg(long, env = "MRI_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (host:port), overriding the config file.
    #[arg(long, env = "MRI_BIND")]
    bind: Option<String>,

    /// Embedded corpus JSON file, overriding the config file.
    #[arg(long, env = "MRI_CORPUS")]
    corpus: Option<PathBuf>,

    /// Gemini API key used for both embedding and completion.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Incoming webhook for database alerts, overriding the config file.
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    slack_webhook_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))?;

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(corpus) = cli.corpus {
        config.corpus_path = corpus;
    }
    if cli.slack_webhook_url.is_some() {
        config.alert_webhook_url = cli.slack_webhook_url;
    }

    let state = AppState::from_config(&config, &cli.gemini_api_key).await?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;

    let shutdown = state.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    serve(listener, state).await?;
    Ok(())
}
