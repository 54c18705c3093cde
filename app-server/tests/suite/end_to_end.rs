use app_test_support::TestServer;
use mri_app_server::AppState;
use mri_app_server::ServerConfig;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn write_corpus(dir: &TempDir) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.path().join("embeddings.json");
    let corpus = json!([
        {
            "text": "Zone IV is the MR scanner magnet room.",
            "embedding": [1.0, 0.0, 0.0],
            "title": "MRI Safety Zones",
            "canonicalUrl": "/learn-mri/mri-safety/zones"
        },
        {
            "text": "Gadolinium shortens T1 relaxation.",
            "embedding": [0.0, 1.0, 0.0],
            "title": "Gadolinium Contrast",
            "canonicalUrl": "/learn-mri/mri-procedures/gadolinium"
        }
    ]);
    std::fs::write(&path, serde_json::to_vec(&corpus)?)?;
    Ok(path)
}

#[tokio::test]
async fn chat_through_gemini_clients() -> anyhow::Result<()> {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "embedding": { "values": [0.9, 0.1, 0.0] } })),
        )
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro-latest:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": "Use this context:\nZone IV is the MR scanner magnet room.\n\nUser: Which zone holds the magnet?"
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Zone IV.\n" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let dir = TempDir::new()?;
    let mut config = ServerConfig::default();
    config.corpus_path = write_corpus(&dir)?;
    config.gemini.base_url = gemini.uri();
    config.progress.store_path = Some(dir.path().join("progress.json"));

    let state = AppState::from_config(&config, "test-key").await?;
    let server = TestServer::spawn(state).await?;

    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({
            "messages": [{ "role": "user", "content": "Which zone holds the magnet?" }]
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>().await?,
        json!([{
            "role": "assistant",
            "content": "Zone IV.\n\n---\n\n**Sources:**\n- [MRI Safety Zones](/learn-mri/mri-safety/zones)"
        }])
    );
    Ok(())
}

#[tokio::test]
async fn gemini_outage_is_a_500() -> anyhow::Result<()> {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "overloaded", "status": "UNAVAILABLE" }
        })))
        .mount(&gemini)
        .await;

    let dir = TempDir::new()?;
    let mut config = ServerConfig::default();
    config.corpus_path = write_corpus(&dir)?;
    config.gemini.base_url = gemini.uri();

    let server = TestServer::spawn(AppState::from_config(&config, "test-key").await?).await?;
    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({ "messages": [{ "role": "user", "content": "What is k-space?" }] }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn startup_fails_on_missing_corpus_or_key() {
    let mut config = ServerConfig::default();
    config.corpus_path = "/nonexistent/embeddings.json".into();
    assert!(AppState::from_config(&config, "test-key").await.is_err());

    let dir = TempDir::new().unwrap();
    config.corpus_path = write_corpus(&dir).unwrap();
    assert!(AppState::from_config(&config, "   ").await.is_err());
}
