use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

use crate::handler::adapter::{ApiRequest, ApiResponse};
use crate::handler::pipeline;
use crate::id;
use crate::modules::chat::model::ChatMessage;
use crate::modules::chat::schema::{ChatRequest, ChatResponse, ChatResponseMetadata};
use crate::modules::persona::crud::PersonaCrud;
use crate::services::mock_agent;
use crate::validation::validate_payload;
use crate::AppState;

pub async fn chat(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("chat", &logger, request, move |req| handle_chat(state, req)).await
}

async fn handle_chat(state: AppState, request: ApiRequest) -> anyhow::Result<ApiResponse> {
    state.logger.info("chat function called", None);
    let started = Instant::now();

    let body = pipeline::parse_json_body(&request)?;
    let input: ChatRequest = validate_payload(body)?;
    state.logger.info(
        "Chat input validated",
        Some(&json!({
            "messageLength": input.message.len(),
            "personaId": input.persona_id,
            "historyLength": input.history.len(),
        })),
    );

    // Persona context is optional: a load failure is logged and swallowed so
    // the conversation can continue without it.
    let crud = PersonaCrud::new(state.storage.clone());
    let persona_name = match crud.load(&input.persona_id).await {
        Ok(Some(value)) => {
            let name = value
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string);
            state.logger.info(
                "Persona loaded for context",
                Some(&json!({ "personaName": name })),
            );
            name
        }
        Ok(None) => {
            state.logger.debug(
                "Could not load persona for context (this is OK)",
                Some(&json!({ "personaId": input.persona_id })),
            );
            None
        }
        Err(err) => {
            state.logger.debug(
                "Could not load persona for context (this is OK)",
                Some(&json!({ "personaId": input.persona_id, "error": err.to_string() })),
            );
            None
        }
    };

    let conversation_id = input
        .conversation_id
        .clone()
        .unwrap_or_else(id::new_conversation_id);
    let reply = mock_agent::generate_reply(&input.message, persona_name.as_deref());
    let agent_message = ChatMessage::agent(reply);

    let processing_time_ms = started.elapsed().as_millis() as u64;
    state.logger.info(
        "Mock response generated successfully",
        Some(&json!({
            "conversationId": conversation_id,
            "messageId": agent_message.id,
            "responseLength": agent_message.content.len(),
            "processingTime": processing_time_ms,
        })),
    );

    let tokens_used = mock_agent::estimate_tokens(&agent_message.content);
    Ok(pipeline::json_response(
        &ChatResponse {
            success: true,
            response: agent_message.content.clone(),
            conversation_id,
            message_id: agent_message.id.clone(),
            metadata: ChatResponseMetadata {
                tokens_used,
                processing_time_ms,
                agents_involved: vec!["MockAgent".to_string()],
            },
        },
        StatusCode::OK,
    ))
}
