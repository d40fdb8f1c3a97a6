use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use personaforge::logger::{LogLevel, Logger};
use personaforge::modules;
use personaforge::modules::persona::schema::PersonaInput;
use personaforge::services::extraction::{ExtractionError, PersonaExtractor};
use personaforge::services::storage::MemoryBlobStore;
use personaforge::AppState;

struct StubExtractor;

#[async_trait]
impl PersonaExtractor for StubExtractor {
    async fn extract(&self, _input: &PersonaInput) -> Result<Value, ExtractionError> {
        Ok(json!({}))
    }
}

fn test_server() -> TestServer {
    let state = AppState {
        storage: Arc::new(MemoryBlobStore::new()),
        extractor: Arc::new(StubExtractor),
        logger: Logger::new(LogLevel::Error),
    };
    let app = Router::new()
        .merge(modules::persona::routes::routes())
        .merge(modules::chat::routes::routes())
        .with_state(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_chat_with_unknown_persona_succeeds() {
    // Context loading failure is swallowed: chat works even when the persona
    // was never saved.
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hello?",
            "persona_id": "persona_AAAAbbbb1234"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert!(body["conversation_id"].as_str().unwrap().starts_with("conv_"));
    assert!(body["message_id"].as_str().unwrap().starts_with("msg_"));
    assert_eq!(body["metadata"]["agents_involved"], json!(["MockAgent"]));
    assert!(body["metadata"]["tokens_used"].as_u64().unwrap() > 0);
    assert!(body["metadata"]["processing_time_ms"].is_number());
}

#[tokio::test]
async fn test_chat_reuses_conversation_id() {
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Tell me about your work",
            "persona_id": "persona_AAAAbbbb1234",
            "conversation_id": "conv_existing0001"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["conversation_id"], "conv_existing0001");
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "",
            "persona_id": "persona_AAAAbbbb1234"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_chat_rejects_oversized_message() {
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "x".repeat(4001),
            "persona_id": "persona_AAAAbbbb1234"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_malformed_persona_id() {
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hello",
            "persona_id": "not-a-persona-id"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("persona_id"));
}

#[tokio::test]
async fn test_chat_rejects_oversized_history() {
    let server = test_server();

    let history: Vec<Value> = (0..11)
        .map(|i| json!({ "role": "user", "content": format!("message {}", i) }))
        .collect();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hello",
            "persona_id": "persona_AAAAbbbb1234",
            "history": history
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("History"));
}

#[tokio::test]
async fn test_chat_accepts_history_at_limit() {
    let server = test_server();

    let history: Vec<Value> = (0..10)
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "agent" };
            json!({ "role": role, "content": format!("message {}", i) })
        })
        .collect();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hello",
            "persona_id": "persona_AAAAbbbb1234",
            "history": history
        }))
        .await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_chat_rejects_unknown_history_role() {
    let server = test_server();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hello",
            "persona_id": "persona_AAAAbbbb1234",
            "history": [{ "role": "system", "content": "hi" }]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_with_saved_persona_context() {
    let server = test_server();

    let saved: Value = server
        .post("/functions/save-persona")
        .json(&json!({ "persona": { "name": "Jane", "background": "Data scientist" } }))
        .await
        .json();
    let persona_id = saved["persona_id"].as_str().unwrap();

    let response = server
        .post("/functions/chat")
        .json(&json!({
            "message": "Hi there",
            "persona_id": persona_id
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(!body["response"].as_str().unwrap().is_empty());
}
