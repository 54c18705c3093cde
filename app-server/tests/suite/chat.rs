use app_test_support::HangingCompletion;
use app_test_support::ScriptedCompletion;
use app_test_support::ScriptedEmbedder;
use app_test_support::StateBuilder;
use app_test_support::TestServer;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

async fn post_chat(server: &TestServer, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&body)
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

#[tokio::test]
async fn answers_with_cited_sources() -> anyhow::Result<()> {
    let completion = Arc::new(ScriptedCompletion::replying("Answer X"));
    let state = StateBuilder::new(ScriptedEmbedder::constant(vec![1.0, 0.0]), completion.clone())
        .build()?;
    let server = TestServer::spawn(state).await?;

    let (status, body) = post_chat(
        &server,
        json!({ "messages": [{ "role": "user", "content": "Q" }] }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "role": "assistant",
            "content": "Answer X\n\n---\n\n**Sources:**\n- [T1](u1)"
        }])
    );
    let requests = completion.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Use this context:\nA\n\nUser: Q");
    Ok(())
}

#[tokio::test]
async fn declined_answer_has_no_sources() -> anyhow::Result<()> {
    let completion = Arc::new(ScriptedCompletion::replying(
        "<NO_ANSWER> I can only help with MRI topics.",
    ));
    let state =
        StateBuilder::new(ScriptedEmbedder::constant(vec![1.0, 1.0]), completion).build()?;
    let server = TestServer::spawn(state).await?;

    let (status, body) = post_chat(
        &server,
        json!({ "messages": [{ "role": "user", "content": "Best pizza in town?" }] }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "role": "assistant", "content": "I can only help with MRI topics." }])
    );
    Ok(())
}

#[tokio::test]
async fn history_reaches_the_model() -> anyhow::Result<()> {
    let completion = Arc::new(ScriptedCompletion::replying("ok"));
    let state = StateBuilder::new(ScriptedEmbedder::constant(vec![0.0, 1.0]), completion.clone())
        .build()?;
    let server = TestServer::spawn(state).await?;

    let (status, _) = post_chat(
        &server,
        json!({ "messages": [
            { "role": "assistant", "content": "Hi! Ask me about MRI." },
            { "role": "user", "content": "What is T2?" },
            { "role": "assistant", "content": "Transverse relaxation." },
            { "role": "user", "content": "And T2*?" }
        ]}),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    let history: Vec<String> = completion.requests().await[0]
        .history
        .iter()
        .map(|turn| format!("{}:{}", turn.role.as_str(), turn.text))
        .collect();
    assert_eq!(
        history,
        vec![
            "user:What is T2?".to_string(),
            "model:Transverse relaxation.".to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn malformed_requests_get_empty_400() -> anyhow::Result<()> {
    let completion = Arc::new(ScriptedCompletion::replying("unused"));
    let state = StateBuilder::new(ScriptedEmbedder::constant(vec![1.0, 0.0]), completion.clone())
        .build()?;
    let server = TestServer::spawn(state).await?;

    for body in [
        json!({ "messages": [] }),
        json!({ "messages": [{ "role": "system", "content": "Q" }] }),
        json!({ "messages": [{ "role": "user", "content": "Q" }, { "role": "assistant", "content": "A" }] }),
        json!({ "messages": [{ "role": "user", "content": "   " }] }),
        json!({ "question": "Q" }),
    ] {
        let (status, response) = post_chat(&server, body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!([]));
    }

    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().await?, json!([]));

    assert!(completion.requests().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn upstream_failures_get_empty_500() -> anyhow::Result<()> {
    let state = StateBuilder::new(
        ScriptedEmbedder::failing(),
        Arc::new(ScriptedCompletion::replying("unused")),
    )
    .build()?;
    let server = TestServer::spawn(state).await?;
    let (status, body) = post_chat(
        &server,
        json!({ "messages": [{ "role": "user", "content": "Q" }] }),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!([]));

    let state = StateBuilder::new(
        ScriptedEmbedder::constant(vec![1.0, 0.0]),
        Arc::new(ScriptedCompletion::failing()),
    )
    .build()?;
    let server = TestServer::spawn(state).await?;
    let (status, body) = post_chat(
        &server,
        json!({ "messages": [{ "role": "user", "content": "Q" }] }),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn wrong_query_dimension_is_a_client_error() -> anyhow::Result<()> {
    let state = StateBuilder::new(
        ScriptedEmbedder::constant(vec![1.0, 0.0, 0.0]),
        Arc::new(ScriptedCompletion::replying("unused")),
    )
    .build()?;
    let server = TestServer::spawn(state).await?;

    let (status, body) = post_chat(
        &server,
        json!({ "messages": [{ "role": "user", "content": "Q" }] }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn client_disconnect_drops_the_model_call() -> anyhow::Result<()> {
    let completion = Arc::new(HangingCompletion::default());
    let state = StateBuilder::new(ScriptedEmbedder::constant(vec![1.0, 0.0]), completion.clone())
        .build()?;
    let server = TestServer::spawn(state).await?;

    let body = json!({ "messages": [{ "role": "user", "content": "Q" }] }).to_string();
    let request = format!(
        "POST /api/chat HTTP/1.1\r\nhost: {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
        server.local_addr(),
        body.len()
    );
    let mut stream = TcpStream::connect(server.local_addr()).await?;
    stream.write_all(request.as_bytes()).await?;

    timeout(Duration::from_secs(5), completion.started.notified()).await?;
    drop(stream);

    // server still running, so only the disconnect can have dropped the call
    timeout(Duration::from_secs(5), completion.dropped.notified()).await?;
    drop(server);
    Ok(())
}

#[tokio::test]
async fn healthz_is_plain_ok() -> anyhow::Result<()> {
    let state = StateBuilder::new(
        ScriptedEmbedder::constant(vec![1.0, 0.0]),
        Arc::new(ScriptedCompletion::replying("unused")),
    )
    .build()?;
    let server = TestServer::spawn(state).await?;

    let response = reqwest::get(server.url("/healthz")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "ok");
    Ok(())
}
