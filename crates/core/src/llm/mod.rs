use crate::config::Settings;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod anthropic;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod openai;
pub mod prompt;

pub use error::ModelError;
pub use generator::RecommendationGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAI => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// One chat turn: a fixed system instruction plus a user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the model's free-text reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

/// Builds the client for `settings.llm_provider`. A missing key fails here, not per call.
pub fn client_from_settings(settings: &Settings) -> Result<Arc<dyn LlmClient>, ConfigError> {
    Ok(match settings.llm_provider {
        Provider::OpenAI => Arc::new(openai::OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!(" anthropic ".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("groq".parse::<Provider>().is_err());
    }

    #[test]
    fn missing_key_fails_at_construction() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let err = client_from_settings(&settings).err().unwrap();
        assert_eq!(err.to_string(), "OPENAI_API_KEY is required");
    }
}
