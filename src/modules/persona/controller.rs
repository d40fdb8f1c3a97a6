use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::error::AppError;
use crate::handler::adapter::{ApiRequest, ApiResponse};
use crate::handler::pipeline;
use crate::modules::persona::crud::PersonaCrud;
use crate::modules::persona::model::{Persona, PersonaMetadata, RawData};
use crate::modules::persona::schema::{
    GetPersonaQuery, GetPersonaResponse, ListPersonasResponse, Pagination, PersonaInput,
    ProcessPersonaResponse, SavePersonaPayload, SavePersonaResponse,
};
use crate::services::extraction::extraction_has_minimum;
use crate::validation::validate_payload;
use crate::AppState;

fn method_not_allowed() -> ApiResponse {
    pipeline::json_response(
        &json!({ "success": false, "error": "Method not allowed. Use POST." }),
        StatusCode::METHOD_NOT_ALLOWED,
    )
}

pub async fn process(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("process-persona", &logger, request, move |req| {
        handle_process(state, req)
    })
    .await
}

async fn handle_process(state: AppState, request: ApiRequest) -> anyhow::Result<ApiResponse> {
    state.logger.info("process-persona function called", None);

    if request.method() != Method::POST && request.method() != Method::OPTIONS {
        return Ok(method_not_allowed());
    }

    let body = pipeline::parse_json_body(&request)?;
    let input: PersonaInput = validate_payload(body)?;
    state.logger.info(
        "Input validated successfully",
        Some(&json!({
            "textBlockCount": input.text_blocks.len(),
            "linkCount": input.links.len(),
        })),
    );

    state.logger.info("Starting persona extraction", None);
    let extracted = state.extractor.extract(&input).await?;

    // Unusable extraction output is a soft failure: HTTP 200 with
    // success:false, distinct from the thrown-error channel.
    if !extraction_has_minimum(&extracted) {
        state
            .logger
            .error("Extracted persona failed validation", None, None);
        return Ok(pipeline::json_response(
            &json!({ "success": false, "error": "Failed to extract valid persona data" }),
            StatusCode::OK,
        ));
    }

    let mut persona: Persona = validate_payload(extracted)?;
    persona.metadata = Some(PersonaMetadata::new(
        input.text_blocks.len(),
        input.links.len(),
    ));
    persona.raw_data = Some(RawData {
        text_blocks: input.text_blocks.clone(),
        links: input.links.clone(),
    });

    state.logger.info(
        "Persona extracted and structured successfully",
        Some(&json!({
            "name": persona.name,
            "traits": persona.traits.len(),
            "interests": persona.interests.len(),
        })),
    );

    Ok(pipeline::json_response(
        &ProcessPersonaResponse {
            success: true,
            persona,
        },
        StatusCode::OK,
    ))
}

pub async fn save(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("save-persona", &logger, request, move |req| {
        handle_save(state, req)
    })
    .await
}

async fn handle_save(state: AppState, request: ApiRequest) -> anyhow::Result<ApiResponse> {
    state.logger.info("save-persona function called", None);

    if request.method() != Method::POST && request.method() != Method::OPTIONS {
        return Ok(method_not_allowed());
    }

    let body = pipeline::parse_json_body(&request)?;
    let payload: SavePersonaPayload = validate_payload(body)?;
    state.logger.info("Input validated successfully", None);

    let persona_id = PersonaCrud::generate_id();
    state.logger.info(
        "Persona ID generated",
        Some(&json!({ "personaId": persona_id })),
    );

    let crud = PersonaCrud::new(state.storage.clone());
    let receipt = crud.save(&persona_id, &payload.persona).await?;

    state.logger.info(
        "Persona saved successfully",
        Some(&json!({ "personaId": persona_id, "storagePath": receipt.path })),
    );

    Ok(pipeline::json_response(
        &SavePersonaResponse {
            success: true,
            persona_id,
            storage_path: receipt.path,
        },
        StatusCode::OK,
    ))
}

pub async fn get(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("get-persona", &logger, request, move |req| {
        handle_get(state, req)
    })
    .await
}

async fn handle_get(state: AppState, request: ApiRequest) -> anyhow::Result<ApiResponse> {
    state.logger.info("get-persona function called", None);

    // A missing or malformed id is a validation failure, distinct from a
    // well-formed id that is simply absent from storage.
    let raw = json!({ "persona_id": request.query_param("persona_id") });
    let query: GetPersonaQuery = validate_payload(raw)?;

    state.logger.info(
        "Retrieving persona from storage",
        Some(&json!({ "personaId": query.persona_id })),
    );

    let crud = PersonaCrud::new(state.storage.clone());
    let stored = crud.load(&query.persona_id).await?;
    let Some(value) = stored else {
        return Err(AppError::not_found(format!("Persona not found: {}", query.persona_id)).into());
    };

    let persona: Persona = validate_payload(value)?;

    state.logger.info(
        "Persona retrieved successfully",
        Some(&json!({ "personaId": query.persona_id, "name": persona.name })),
    );

    Ok(pipeline::json_response(
        &GetPersonaResponse {
            success: true,
            persona,
        },
        StatusCode::OK,
    ))
}

pub async fn list(State(state): State<AppState>, request: Request) -> Response {
    let logger = state.logger.clone();
    pipeline::dispatch("list-personas", &logger, request, move |req| {
        handle_list(state, req)
    })
    .await
}

async fn handle_list(state: AppState, request: ApiRequest) -> anyhow::Result<ApiResponse> {
    state.logger.info("list-personas function called", None);

    let params = request.query_params();
    let pagination = Pagination::from_query(&params)?;
    state.logger.info(
        "Pagination parameters validated",
        Some(&json!({ "limit": pagination.limit, "offset": pagination.offset })),
    );

    let crud = PersonaCrud::new(state.storage.clone());
    let (personas, total) = crud
        .list(pagination.limit as usize, pagination.offset as usize)
        .await?;

    state.logger.info(
        "Personas listed successfully",
        Some(&json!({ "count": personas.len(), "total": total })),
    );

    Ok(pipeline::json_response(
        &ListPersonasResponse {
            success: true,
            personas,
            total,
        },
        StatusCode::OK,
    ))
}
