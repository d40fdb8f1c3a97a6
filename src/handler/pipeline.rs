use std::future::Future;

use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{to_app_error, AppError};
use crate::handler::adapter::{ApiRequest, ApiResponse, FunctionEvent, FunctionReply};
use crate::logger::{Logger, RequestLogger};

/// Fixed CORS header set carried by every response, including errors and
/// preflight replies.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS, PUT, DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn with_cors(mut response: ApiResponse) -> ApiResponse {
    for (name, value) in cors_headers() {
        if let Some(name) = name {
            response.headers.insert(name, value);
        }
    }
    response
}

/// CORS preflight reply: 204, empty body.
pub fn handle_options() -> ApiResponse {
    ApiResponse {
        status: StatusCode::NO_CONTENT,
        headers: cors_headers(),
        body: String::new(),
    }
}

pub fn json_response<T: Serialize>(data: &T, status: StatusCode) -> ApiResponse {
    let body = serde_json::to_string(data).unwrap_or_else(|_| {
        r#"{"success":false,"error":"Failed to serialize response"}"#.to_string()
    });
    ApiResponse::new(status, body)
}

pub fn error_response(error: &AppError) -> ApiResponse {
    json_response(&error.to_body(), error.status_code)
}

/// Parses the request body as JSON; an absent or blank body yields an empty
/// object, malformed JSON fails with 400 BAD_REQUEST.
pub fn parse_json_body(request: &ApiRequest) -> Result<Value, AppError> {
    match request.body() {
        None => Ok(json!({})),
        Some(text) if text.trim().is_empty() => Ok(json!({})),
        Some(text) => serde_json::from_str(text)
            .map_err(|_| AppError::bad_request("Invalid JSON in request body")),
    }
}

/// Wraps a business handler with the cross-cutting concerns shared by every
/// endpoint: request adaptation, timing, logging, CORS, preflight
/// short-circuit, and error normalization. Errors never escape this function;
/// every reply is JSON with a `success` flag.
pub async fn dispatch<F, Fut>(
    function_name: &str,
    logger: &Logger,
    request: Request,
    business: F,
) -> Response
where
    F: FnOnce(ApiRequest) -> Fut,
    Fut: Future<Output = anyhow::Result<ApiResponse>>,
{
    let event = match FunctionEvent::from_request(request).await {
        Ok(event) => event,
        Err(err) => {
            let source: &dyn std::error::Error = &err;
            logger.error("Failed to adapt request", Some(source), None);
            return FunctionReply::from(with_cors(error_response(&err))).into_response();
        }
    };

    let request_log = RequestLogger::new(function_name, logger.clone());
    request_log.log_request(&event.method, &event.path, &event.headers, event.body.as_deref());

    let api_request = event.into_api_request();

    // Preflight never reaches the business handler.
    if api_request.method() == Method::OPTIONS {
        let response = handle_options();
        request_log.log_response(response.status, &response.body);
        return FunctionReply::from(response).into_response();
    }

    request_log.log_step("invoking handler", None);

    match business(api_request).await {
        Ok(response) => {
            let response = with_cors(response);
            request_log.log_response(response.status, &response.body);
            FunctionReply::from(response).into_response()
        }
        Err(err) => {
            let app_error = to_app_error(err);
            request_log.log_error(&app_error);
            FunctionReply::from(with_cors(error_response(&app_error))).into_response()
        }
    }
}
