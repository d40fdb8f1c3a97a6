use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Structured profile extracted from free text and links.
///
/// Array fields are always present (possibly empty), never null, so
/// downstream iteration is safe. Personas are immutable once saved; `id` is
/// assigned only at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Persona {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub personality_type: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PersonaMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawData>,
}

/// Immutable provenance record attached when a persona is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text_blocks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_links: Option<usize>,
}

impl PersonaMetadata {
    pub fn new(source_text_blocks: usize, source_links: usize) -> Self {
        Self {
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            source_text_blocks: Some(source_text_blocks),
            source_links: Some(source_links),
        }
    }
}

/// Original inputs that produced a persona, preserved for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    #[serde(rename = "textBlocks")]
    pub text_blocks: Vec<String>,
    pub links: Vec<String>,
}
