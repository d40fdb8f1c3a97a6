use std::time::Instant;

use axum::http::{HeaderMap, Method, StatusCode};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::id;

/// Header names whose values must never reach a log line (substring match,
/// case-insensitive).
const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "x-api-key",
    "cookie",
    "x-auth-token",
    "x-access-token",
];

/// Body field names whose values must never reach a log line (substring
/// match, case-insensitive, applied recursively).
const SENSITIVE_FIELDS: [&str; 5] = ["password", "token", "secret", "api_key", "apikey"];

const REDACTED: &str = "[REDACTED]";

/// Responses slower than this are flagged as warnings (advisory only).
pub const SLOW_RESPONSE_MS: u128 = 3000;

const BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Leveled structured logger. A message is emitted only when its severity
/// reaches the configured threshold, except error entries which are always
/// emitted regardless of the threshold.
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level == LogLevel::Error || level >= self.level
    }

    pub fn debug(&self, message: &str, context: Option<&Value>) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!("{}", format_entry(LogLevel::Debug, message, context, None));
        }
    }

    pub fn info(&self, message: &str, context: Option<&Value>) {
        if self.enabled(LogLevel::Info) {
            tracing::info!("{}", format_entry(LogLevel::Info, message, context, None));
        }
    }

    pub fn error(
        &self,
        message: &str,
        error: Option<&dyn std::error::Error>,
        context: Option<&Value>,
    ) {
        let detail = error.map(describe_error);
        tracing::error!(
            "{}",
            format_entry(LogLevel::Error, message, context, detail.as_deref())
        );
    }
}

/// One line per entry: `[ISO-timestamp] LEVEL: message`, followed by the JSON
/// context if present, otherwise the error detail if one was passed.
pub fn format_entry(
    level: LogLevel,
    message: &str,
    context: Option<&Value>,
    error_detail: Option<&str>,
) -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let base = format!("[{}] {}: {}", timestamp, level.as_str(), message);

    if let Some(context) = context {
        if context.as_object().map(|o| !o.is_empty()).unwrap_or(true) {
            return format!("{} {}", base, context);
        }
    }
    if let Some(detail) = error_detail {
        return format!("{} Error: {}", base, detail);
    }
    base
}

/// Error message plus its source chain, the closest analogue of a stack trace.
fn describe_error(error: &dyn std::error::Error) -> String {
    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    detail
}

/// Request-scoped logger used to diagnose boundary failures. Every entry is
/// tagged with a correlation id; headers and bodies are redacted before they
/// are written anywhere.
pub struct RequestLogger {
    function_name: String,
    request_id: String,
    started: Instant,
    logger: Logger,
}

impl RequestLogger {
    pub fn new(function_name: &str, logger: Logger) -> Self {
        Self {
            function_name: function_name.to_string(),
            request_id: id::new_request_id(function_name),
            started: Instant::now(),
            logger,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn log_request(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) {
        let mut context = json!({
            "requestId": self.request_id,
            "function": self.function_name,
            "method": method.as_str(),
            "path": path,
            "headers": redact_headers(headers),
        });
        if let Some(body) = body {
            let redacted = match serde_json::from_str::<Value>(body) {
                Ok(parsed) => redact_json(&parsed),
                Err(_) => Value::String("[Cannot parse body]".to_string()),
            };
            context["body"] = redacted;
        }
        self.logger
            .info(&format!("{} {}", method, path), Some(&context));
    }

    pub fn log_response(&self, status: StatusCode, body: &str) {
        let duration_ms = self.started.elapsed().as_millis();
        let context = json!({
            "requestId": self.request_id,
            "function": self.function_name,
            "status": status.as_u16(),
            "duration": format!("{}ms", duration_ms),
            "bodyPreview": preview_body(body),
        });
        self.logger.info("Handler completed", Some(&context));

        if duration_ms > SLOW_RESPONSE_MS {
            tracing::warn!(
                "[{}] Slow response detected: {}ms (>{SLOW_RESPONSE_MS}ms threshold)",
                self.request_id,
                duration_ms
            );
        }
    }

    pub fn log_error(&self, error: &AppError) {
        let duration_ms = self.started.elapsed().as_millis();
        let context = json!({
            "requestId": self.request_id,
            "function": self.function_name,
            "status": error.status_code.as_u16(),
            "duration": format!("{}ms", duration_ms),
        });
        let source: &dyn std::error::Error = error;
        self.logger.error(
            &format!("Handler error: {}", error.message),
            Some(source),
            Some(&context),
        );
    }

    pub fn log_step(&self, step: &str, data: Option<&Value>) {
        let mut context = json!({
            "requestId": self.request_id,
            "function": self.function_name,
            "step": step,
        });
        if let Some(data) = data {
            context["data"] = redact_json(data);
        }
        self.logger.debug(step, Some(&context));
    }
}

pub fn redact_headers(headers: &HeaderMap) -> Value {
    let mut out = Map::new();
    for (name, value) in headers {
        let key = name.as_str().to_string();
        let lower = key.to_lowercase();
        let redacted = SENSITIVE_HEADERS.iter().any(|s| lower.contains(s));
        let value = if redacted {
            REDACTED.to_string()
        } else {
            value.to_str().unwrap_or("[binary]").to_string()
        };
        out.insert(key, Value::String(value));
    }
    Value::Object(out)
}

/// Recursively replaces the values of sensitive fields at any nesting depth.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                let lower = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|s| lower.contains(s)) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), redact_json(value));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        other => other.clone(),
    }
}

/// First 500 characters of a response body, for log lines.
pub fn preview_body(body: &str) -> String {
    if body.is_empty() {
        return "[empty]".to_string();
    }
    if body.chars().count() > BODY_PREVIEW_CHARS {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{}...", preview)
    } else {
        body.to_string()
    }
}
