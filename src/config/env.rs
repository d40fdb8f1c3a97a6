use std::env;

use thiserror::Error;

use crate::logger::LogLevel;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    MissingVariables(String),
}

/// Validated process configuration, built once at startup and passed down
/// explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub extraction_api_key: String,
    pub extraction_base_url: String,
    pub extraction_model: String,
    pub redis_uri: String,
    pub log_level: LogLevel,
    pub bind_addr: String,
}

impl AppConfig {
    /// Fails fast when required variables are absent or blank, listing every
    /// missing one in a single error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = ["OPENAI_API_KEY", "REDIS_URI"];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing.join(", ")));
        }

        Ok(Self {
            extraction_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            extraction_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            extraction_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            redis_uri: env::var("REDIS_URI").unwrap_or_default(),
            log_level: env::var("LOG_LEVEL")
                .map(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
