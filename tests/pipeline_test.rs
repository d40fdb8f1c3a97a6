use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use personaforge::error::{classify, to_app_error, AppError, ErrorCode};
use personaforge::handler::adapter::ApiResponse;
use personaforge::handler::pipeline;
use personaforge::logger::{LogLevel, Logger};
use personaforge::modules;
use personaforge::modules::persona::schema::PersonaInput;
use personaforge::services::extraction::{ExtractionError, PersonaExtractor};
use personaforge::services::storage::{MemoryBlobStore, StorageError};
use personaforge::AppState;

struct StubExtractor;

#[async_trait]
impl PersonaExtractor for StubExtractor {
    async fn extract(&self, _input: &PersonaInput) -> Result<Value, ExtractionError> {
        Ok(json!({
            "name": "Stub",
            "background": "stub",
            "traits": [],
            "interests": [],
            "skills": [],
            "values": []
        }))
    }
}

fn test_state() -> AppState {
    AppState {
        storage: Arc::new(MemoryBlobStore::new()),
        extractor: Arc::new(StubExtractor),
        logger: Logger::new(LogLevel::Error),
    }
}

async fn explode(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("explode", &logger, request, move |_req| async move {
        Err::<ApiResponse, anyhow::Error>(anyhow::anyhow!("something went sideways"))
    })
    .await
}

fn test_server() -> TestServer {
    let app = Router::new()
        .merge(modules::persona::routes::routes())
        .merge(modules::chat::routes::routes())
        .route("/functions/explode", any(explode))
        .with_state(test_state());
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_generic_error_always_yields_json_taxonomy_body() {
    let server = test_server();

    let response = server.post("/functions/explode").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVER_ERROR");
    assert_eq!(body["statusCode"], 500);
    assert!(body["error"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn test_error_responses_carry_cors_headers() {
    let server = test_server();

    let response = server.post("/functions/explode").await;

    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn test_success_responses_carry_cors_headers() {
    let server = test_server();

    let response = server
        .post("/functions/process-persona")
        .json(&json!({ "textBlocks": ["someone interesting"] }))
        .await;

    response.assert_status(StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        headers.get("access-control-allow-methods").unwrap(),
        "GET, POST, OPTIONS, PUT, DELETE"
    );
}

#[tokio::test]
async fn test_options_preflight_on_chat_endpoint() {
    let server = test_server();

    let response = server.method(Method::OPTIONS, "/functions/chat").await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.text().is_empty());
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_malformed_json_body_is_bad_request() {
    let server = test_server();

    let response = server.post("/functions/chat").text("{not valid json").await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["error"], "Invalid JSON in request body");
}

#[tokio::test]
async fn test_empty_body_parses_as_empty_object() {
    // An absent body reaches validation as {}, so the failure is a
    // VALIDATION_ERROR rather than BAD_REQUEST.
    let server = test_server();

    let response = server.post("/functions/save-persona").await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[test]
fn test_classify_recognizes_unauthorized() {
    let error = classify("request failed with 401");
    assert_eq!(error.code, ErrorCode::Unauthorized);
    assert_eq!(error.status_code, StatusCode::UNAUTHORIZED);

    let error = classify("Unauthorized access");
    assert_eq!(error.code, ErrorCode::Unauthorized);
}

#[test]
fn test_classify_recognizes_not_found() {
    let error = classify("blob was not found");
    assert_eq!(error.code, ErrorCode::NotFound);
    assert_eq!(error.status_code, StatusCode::NOT_FOUND);
}

#[test]
fn test_classify_recognizes_rate_limit() {
    let error = classify("429: rate limit exceeded");
    assert_eq!(error.code, ErrorCode::RateLimit);
    assert_eq!(error.status_code, StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_classify_recognizes_collaborators() {
    assert_eq!(classify("OpenAI exploded").code, ErrorCode::ExtractionError);
    assert_eq!(classify("redis timeout").code, ErrorCode::StorageError);
}

#[test]
fn test_classify_defaults_to_server_error() {
    let error = classify("boom");
    assert_eq!(error.code, ErrorCode::ServerError);
    assert_eq!(error.status_code, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_classify_is_a_documented_heuristic() {
    // Prose that merely mentions "not found" is classified as a 404. This
    // fuzziness is intentional and kept.
    let error = classify("the phrase not found appears in unrelated prose");
    assert_eq!(error.code, ErrorCode::NotFound);
}

#[test]
fn test_to_app_error_passes_app_errors_through() {
    let original = AppError::validation("bad input");
    let normalized = to_app_error(anyhow::Error::from(original));
    assert_eq!(normalized.code, ErrorCode::ValidationError);
    assert_eq!(normalized.message, "bad input");
}

#[test]
fn test_to_app_error_maps_typed_collaborator_errors() {
    let normalized = to_app_error(anyhow::Error::from(ExtractionError::RateLimited));
    assert_eq!(normalized.code, ErrorCode::ExtractionError);
    assert_eq!(normalized.status_code, StatusCode::TOO_MANY_REQUESTS);

    let normalized = to_app_error(anyhow::Error::from(StorageError::AlreadyExists(
        "persona_abc.json".to_string(),
    )));
    assert_eq!(normalized.code, ErrorCode::StorageError);
}

#[test]
fn test_error_body_shape() {
    let body = AppError::not_found("Persona not found: persona_abc").to_body();
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(
        value,
        json!({
            "success": false,
            "error": "Persona not found: persona_abc",
            "code": "NOT_FOUND",
            "statusCode": 404
        })
    );
}
