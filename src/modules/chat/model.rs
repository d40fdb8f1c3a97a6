use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

/// One conversation turn. Messages are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChatMessageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: String) -> Self {
        Self {
            id: id::new_message_id(),
            role,
            content,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata: None,
        }
    }

    pub fn user(content: String) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn agent(content: String) -> Self {
        Self::new(ChatRole::Agent, content)
    }
}
