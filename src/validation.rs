use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// Persona identifier format: `persona_` + exactly 12 URL-safe characters.
pub static PERSONA_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^persona_[A-Za-z0-9_-]{12}$").expect("persona id pattern"));

pub fn is_valid_persona_id(id: &str) -> bool {
    PERSONA_ID_RE.is_match(id)
}

/// Deserializes an untyped JSON value into `T` (applying the schema's
/// defaults) and checks its declared constraints. All violated constraints
/// are collected and joined as `path: message; path: message`.
pub fn validate_payload<T>(value: serde_json::Value) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T =
        serde_json::from_value(value).map_err(|err| AppError::validation(err.to_string()))?;
    parsed
        .validate()
        .map_err(|errors| AppError::validation(flatten_errors(&errors)))?;
    Ok(parsed)
}

/// Flattens nested validation errors into a deterministic single-line
/// message. Paths are sorted so the output is stable across runs.
pub fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect_errors("", errors, &mut lines);
    lines.sort();
    lines.join("; ")
}

fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(&path, nested, out),
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    collect_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Trims the input and strips ASCII control characters (0x00-0x1F, 0x7F).
pub fn sanitize_string(input: &str) -> String {
    input.trim().chars().filter(|c| !c.is_ascii_control()).collect()
}

/// Parses and normalizes a URL, failing with a validation error on malformed
/// input.
pub fn sanitize_url(input: &str) -> Result<String, AppError> {
    url::Url::parse(input)
        .map(|url| url.to_string())
        .map_err(|_| AppError::validation(format!("Invalid URL: {}", input)))
}

/// Builds a [`ValidationError`] with an explicit message, for custom field
/// validators.
pub fn invalid(code: &'static str, message: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_owned().into());
    error
}
