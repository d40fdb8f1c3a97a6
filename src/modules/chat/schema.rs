use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::chat::model::ChatRole;
use crate::validation::PERSONA_ID_RE;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(
        min = 1,
        max = 4000,
        message = "Message must be between 1 and 4000 characters"
    ))]
    pub message: String,
    #[validate(regex(path = *PERSONA_ID_RE, message = "Invalid persona ID format"))]
    pub persona_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "History is limited to the 10 most recent messages"))]
    pub history: Vec<HistoryEntry>,
}

/// Recent conversation context sent with a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub conversation_id: String,
    pub message_id: String,
    pub metadata: ChatResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseMetadata {
    pub tokens_used: u64,
    pub processing_time_ms: u64,
    pub agents_involved: Vec<String>,
}
