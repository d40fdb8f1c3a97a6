use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Synthetic base against which request URLs are reconstructed. Only the
/// path and query of the original invocation are meaningful.
const SYNTHETIC_BASE: &str = "http://functions.local";

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Platform invocation event, captured before any business logic runs. This
/// module is the only place that touches the platform's request and response
/// types; everything above it works on [`ApiRequest`]/[`ApiResponse`].
#[derive(Debug)]
pub struct FunctionEvent {
    pub method: Method,
    pub path: String,
    pub raw_query: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl FunctionEvent {
    pub async fn from_request(request: Request) -> Result<Self, AppError> {
        let (parts, body) = request.into_parts();

        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|err| AppError::bad_request(format!("Failed to read request body: {}", err)))?;
        let body = if bytes.is_empty() {
            None
        } else {
            Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::bad_request("Request body is not valid UTF-8"))?,
            )
        };

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            raw_query: parts.uri.query().unwrap_or("").to_string(),
            headers: parts.headers,
            body,
        })
    }

    pub fn into_api_request(self) -> ApiRequest {
        let full = if self.raw_query.is_empty() {
            format!("{}{}", SYNTHETIC_BASE, self.path)
        } else {
            format!("{}{}?{}", SYNTHETIC_BASE, self.path, self.raw_query)
        };
        let uri: Uri = full
            .parse()
            .unwrap_or_else(|_| Uri::from_static(SYNTHETIC_BASE));

        let query: Vec<(String, String)> =
            serde_urlencoded::from_str(&self.raw_query).unwrap_or_default();

        ApiRequest {
            method: self.method,
            uri,
            headers: self.headers,
            query,
            body: self.body,
        }
    }
}

/// Normalized request handed to business handlers.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<String>,
}

impl ApiRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// First value of the named query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All query parameters; for repeated names the last value wins.
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query.iter().cloned().collect()
    }
}

/// Normalized response produced by business handlers.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: String) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }
}

/// Platform reply shape: status code, headers, body as text.
#[derive(Debug)]
pub struct FunctionReply {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl From<ApiResponse> for FunctionReply {
    fn from(response: ApiResponse) -> Self {
        Self {
            status_code: response.status.as_u16(),
            headers: response.headers,
            body: response.body,
        }
    }
}

impl IntoResponse for FunctionReply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *response.headers_mut() = self.headers;
        response
    }
}
