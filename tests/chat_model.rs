use garagemap_api::chat::{self, ChatModel, GeminiChat, HISTORY_WINDOW};
use garagemap_api::config::AppConfig;
use garagemap_api::dto::chat::ChatTurn;
use garagemap_api::error::AppError;
use httpmock::prelude::*;

fn turn(role: &str, content: &str) -> ChatTurn {
    ChatTurn {
        role: role.into(),
        content: content.into(),
    }
}

fn config(base_url: &str, api_key: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 8000,
        jwt_secret: "test-secret".into(),
        gemini_api_key: api_key.into(),
        gemini_base_url: base_url.into(),
        gemini_model: "gemini-1.5-flash".into(),
        chat_timeout_secs: 5,
    }
}

#[test]
fn window_keeps_only_the_most_recent_turns() {
    let history: Vec<ChatTurn> = (0..25)
        .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("turn {i}")))
        .collect();

    let windowed = chat::window(&history);
    assert_eq!(windowed.len(), HISTORY_WINDOW);
    assert_eq!(windowed[0].content, "turn 15");
    assert_eq!(windowed[windowed.len() - 1].content, "turn 24");
}

#[test]
fn window_passes_short_histories_through() {
    let history = vec![turn("user", "hello"), turn("assistant", "hi")];
    let windowed = chat::window(&history);
    assert_eq!(windowed.len(), 2);
    assert_eq!(windowed[0].content, "hello");
}

#[tokio::test]
async fn gemini_client_extracts_the_completion_text() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash:generateContent")
            .header("x-goog-api-key", "test-key");
        then.status(200).json_body(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "  Check the brake pads first.  " } ] } }
            ]
        }));
    });

    let client = GeminiChat::new(&config(&server.base_url(), "test-key")).unwrap();
    let history = vec![turn("user", "my brakes squeal"), turn("assistant", "since when?")];
    let reply = client
        .complete("system prompt", &history, "since yesterday")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(reply, "Check the brake pads first.");
}

#[tokio::test]
async fn gemini_client_maps_upstream_failure_to_service_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash:generateContent");
        then.status(500).body("boom");
    });

    let client = GeminiChat::new(&config(&server.base_url(), "test-key")).unwrap();
    let err = client.complete("system prompt", &[], "hello").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)), "got {err:?}");
}

#[tokio::test]
async fn gemini_client_rejects_malformed_payloads() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash:generateContent");
        then.status(200).json_body(serde_json::json!({ "candidates": [] }));
    });

    let client = GeminiChat::new(&config(&server.base_url(), "test-key")).unwrap();
    let err = client.complete("system prompt", &[], "hello").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)), "got {err:?}");
}

#[tokio::test]
async fn gemini_client_without_a_key_fails_before_the_network() {
    let client = GeminiChat::new(&config("http://127.0.0.1:1", "")).unwrap();
    let err = client.complete("system prompt", &[], "hello").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)), "got {err:?}");
}
