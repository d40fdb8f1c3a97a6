use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::modules::persona::model::Persona;
use crate::validation::{invalid, PERSONA_ID_RE};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw persona creation input: text blocks and links supplied by the client.
///
/// Both collections are capped at 50 entries to bound extraction cost.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PersonaInput {
    #[serde(rename = "textBlocks")]
    #[validate(
        length(max = 50, message = "Maximum 50 text blocks allowed"),
        custom(function = validate_text_blocks)
    )]
    pub text_blocks: Vec<String>,
    #[serde(default)]
    #[validate(
        length(max = 50, message = "Maximum 50 links allowed"),
        custom(function = validate_links)
    )]
    pub links: Vec<String>,
}

fn validate_text_blocks(blocks: &[String]) -> Result<(), ValidationError> {
    if blocks.iter().any(|block| block.chars().count() > 5000) {
        return Err(invalid(
            "length",
            "Each text block must be at most 5000 characters",
        ));
    }
    if !blocks.iter().any(|block| !block.trim().is_empty()) {
        return Err(invalid(
            "required",
            "At least one non-empty text block required",
        ));
    }
    Ok(())
}

fn validate_links(links: &[String]) -> Result<(), ValidationError> {
    for link in links {
        if link.chars().count() > 2048 {
            return Err(invalid("length", "Link cannot exceed 2048 characters"));
        }
        if url::Url::parse(link).is_err() {
            return Err(invalid("url", "Invalid URL format"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct SavePersonaPayload {
    #[validate(nested)]
    pub persona: Persona,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GetPersonaQuery {
    #[validate(regex(path = *PERSONA_ID_RE, message = "Invalid persona ID format"))]
    pub persona_id: String,
}

/// Pagination parameters coerced from string query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    /// Applies defaults (limit 20, offset 0) and collects every violation
    /// into one validation error, in the shared `path: message; ...` format.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut violations = Vec::new();

        let limit = match params.get("limit") {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if (1..=MAX_PAGE_LIMIT as i64).contains(&value) => value as u32,
                _ => {
                    violations
                        .push("limit: must be an integer between 1 and 100".to_string());
                    DEFAULT_PAGE_LIMIT
                }
            },
        };

        let offset = match params.get("offset") {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if value >= 0 => value as u32,
                _ => {
                    violations.push("offset: must be a non-negative integer".to_string());
                    0
                }
            },
        };

        if !violations.is_empty() {
            violations.sort();
            return Err(AppError::validation(violations.join("; ")));
        }

        Ok(Self { limit, offset })
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessPersonaResponse {
    pub success: bool,
    pub persona: Persona,
}

#[derive(Debug, Serialize)]
pub struct SavePersonaResponse {
    pub success: bool,
    pub persona_id: String,
    pub storage_path: String,
}

#[derive(Debug, Serialize)]
pub struct GetPersonaResponse {
    pub success: bool,
    pub persona: Persona,
}

#[derive(Debug, Serialize)]
pub struct ListPersonasResponse {
    pub success: bool,
    pub personas: Vec<PersonaSummary>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub created_at: String,
}
