use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::env::AppConfig;
use crate::modules::persona::schema::PersonaInput;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Extraction API key is invalid or expired")]
    Unauthorized,
    #[error("Extraction rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Extraction service is temporarily unavailable. Please try again later.")]
    Unavailable,
    #[error("Extraction API error: {0}")]
    Api(String),
    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),
}

/// Turns raw text blocks and links into a structured persona object.
///
/// Returns the untyped JSON the model produced; callers gate it through
/// [`extraction_has_minimum`] and the persona schema before trusting it.
#[async_trait]
pub trait PersonaExtractor: Send + Sync {
    async fn extract(&self, input: &PersonaInput) -> Result<Value, ExtractionError>;
}

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are an expert at analyzing text and links about a person to create a detailed digital persona.

Your task:
1) Extract key information from the provided text blocks and links.
2) Structure the information into the exact JSON format specified below.
3) Field rules:
   - name: Full name if available, else null
   - age: Age as a number if mentioned, else null
   - occupation: Primary job/role if available, else null
   - background: Concise summary (string; may be empty)
   - traits: 5-7 personality traits (array of strings)
   - interests: 5-10 interests/hobbies (array of strings)
   - skills: 5-10 professional/technical skills (array of strings)
   - values: 3-5 core values (array of strings)
   - communication_style: How they communicate if known, else null
   - personality_type: If mentioned (MBTI, Big Five, etc.), else null
   - goals: Current/future goals if mentioned (array of strings)
   - challenges: Known challenges/concerns (array of strings)
   - relationships: Key relationships/connections (array of strings)

Output requirements:
- Return ONLY valid JSON. No markdown, no explanations, no preamble.
- If a field is unknown, use null (for nullable fields) or [] (for arrays).
- Return only the flat persona object. DO NOT wrap it in \"success\" or \
\"persona\" keys; the backend handles metadata and raw_data.";

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessageResponse,
}

#[derive(Debug, Deserialize)]
struct CompletionMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extraction collaborator backed by an OpenAI-style chat-completions API.
#[derive(Clone)]
pub struct OpenAiExtractor {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.extraction_base_url.clone(),
            api_key: config.extraction_api_key.clone(),
            model: config.extraction_model.clone(),
        }
    }

    fn user_message(input: &PersonaInput) -> String {
        let mut sections = Vec::new();

        if !input.text_blocks.is_empty() {
            let blocks = input
                .text_blocks
                .iter()
                .enumerate()
                .map(|(i, block)| format!("{}. {}", i + 1, block))
                .collect::<Vec<_>>()
                .join("\n\n");
            sections.push(format!("Text blocks about the person:\n{}", blocks));
        }
        if !input.links.is_empty() {
            sections.push(format!("Links provided:\n{}", input.links.join("\n")));
        }

        let message = sections.join("\n\n");
        if message.trim().is_empty() {
            "No information provided.".to_string()
        } else {
            message
        }
    }
}

#[async_trait]
impl PersonaExtractor for OpenAiExtractor {
    async fn extract(&self, input: &PersonaInput) -> Result<Value, ExtractionError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                CompletionMessage {
                    role: "system".to_string(),
                    content: EXTRACTION_SYSTEM_PROMPT.to_string(),
                },
                CompletionMessage {
                    role: "user".to_string(),
                    content: Self::user_message(input),
                },
            ],
            // Low temperature for consistent, factual extraction.
            temperature: 0.3,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => ExtractionError::Unauthorized,
                429 => ExtractionError::RateLimited,
                503 => ExtractionError::Unavailable,
                _ => {
                    let text = response.text().await.unwrap_or_default();
                    match serde_json::from_str::<ApiErrorResponse>(&text) {
                        Ok(parsed) => ExtractionError::Api(parsed.error.message),
                        Err(_) => ExtractionError::Api(text),
                    }
                }
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| ExtractionError::InvalidResponse("no choices in completion".into()))?;

        // The system prompt enforces JSON-only output; tolerate stray
        // whitespace or fencing around the object.
        let start = content
            .find('{')
            .ok_or_else(|| ExtractionError::InvalidResponse("no JSON object in completion".into()))?;
        let end = content
            .rfind('}')
            .ok_or_else(|| ExtractionError::InvalidResponse("no JSON object in completion".into()))?;

        serde_json::from_str(&content[start..=end])
            .map_err(|err| ExtractionError::InvalidResponse(err.to_string()))
    }
}

/// Minimum usable structure for an extraction result: a name or a non-empty
/// background, and all four core array fields present as arrays.
pub fn extraction_has_minimum(value: &Value) -> bool {
    let name_present = value
        .get("name")
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    let background_present = value
        .get("background")
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    if !name_present && !background_present {
        return false;
    }

    ["traits", "interests", "skills", "values"]
        .iter()
        .all(|field| value.get(*field).map(Value::is_array).unwrap_or(false))
}
