use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::extraction::ExtractionError;
use crate::services::storage::StorageError;

/// Stable error codes carried in every error response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ExtractionError,
    StorageError,
    NotFound,
    Unauthorized,
    ServerError,
    BadRequest,
    RateLimit,
}

/// Uniform application error: every endpoint failure is expressed as one of
/// these before it leaves the handler pipeline.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub message: String,
    pub status_code: StatusCode,
    pub code: ErrorCode,
}

/// Wire shape of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl AppError {
    pub fn new(message: impl Into<String>, status_code: StatusCode, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            code,
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ServerError)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST, ErrorCode::ValidationError)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST, ErrorCode::BadRequest)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND, ErrorCode::NotFound)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimit)
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ExtractionError)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageError)
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.message.clone(),
            code: self.code,
            status_code: self.status_code.as_u16(),
        }
    }
}

/// Best-effort classification of an opaque error message by substring match.
///
/// This is a heuristic and a known source of misclassification: a message that
/// merely mentions "not found" in unrelated prose is classified as a 404.
/// Collaborators under our control return typed errors instead; this fallback
/// only handles errors whose origin we cannot see.
pub fn classify(message: impl Into<String>) -> AppError {
    let message = message.into();
    let lower = message.to_lowercase();

    if lower.contains("401") || lower.contains("unauthorized") {
        return AppError::unauthorized(message);
    }
    if lower.contains("404") || lower.contains("not found") {
        return AppError::not_found(message);
    }
    if lower.contains("429") || lower.contains("rate limit") {
        return AppError::rate_limit(message);
    }
    if lower.contains("extraction") || lower.contains("openai") {
        return AppError::extraction(message);
    }
    if lower.contains("storage") || lower.contains("redis") {
        return AppError::storage(message);
    }

    AppError::server(message)
}

/// Normalizes any error reaching the pipeline boundary into an [`AppError`].
///
/// Typed collaborator errors map through their `From` impls; everything else
/// falls back to [`classify`].
pub fn to_app_error(error: anyhow::Error) -> AppError {
    match error.downcast::<AppError>() {
        Ok(app) => app,
        Err(error) => match error.downcast::<ExtractionError>() {
            Ok(extraction) => extraction.into(),
            Err(error) => match error.downcast::<StorageError>() {
                Ok(storage) => storage.into(),
                Err(error) => classify(error.to_string()),
            },
        },
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        let status = match &err {
            ExtractionError::Unauthorized => StatusCode::UNAUTHORIZED,
            ExtractionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ExtractionError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::extraction(err.to_string()).with_status(status)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::storage(err.to_string())
    }
}
