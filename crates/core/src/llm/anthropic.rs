use crate::config::Settings;
use crate::error::ConfigError;
use crate::llm::error::ModelError;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url = settings
            .anthropic_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .anthropic_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = settings.llm_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    fn headers(&self) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| ModelError::new(Provider::Anthropic, "auth", e.to_string()))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Unknown => {}
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let req = CreateMessageRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .map_err(|e| ModelError::transport(Provider::Anthropic, e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ModelError::transport(Provider::Anthropic, e))?;
        if !status.is_success() {
            return Err(ModelError::http(Provider::Anthropic, status, text));
        }

        let parsed = serde_json::from_str::<CreateMessageResponse>(&text).map_err(|e| {
            ModelError::new(Provider::Anthropic, "decode", e.to_string())
                .with_raw_output(text.clone())
        })?;

        if matches!(parsed.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::debug!(max_tokens = request.max_tokens, "Anthropic reply truncated at max_tokens");
        }

        let out = Self::response_text(&parsed);
        if out.trim().is_empty() {
            return Err(
                ModelError::new(Provider::Anthropic, "empty", "no text blocks returned")
                    .with_raw_output(text),
            );
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}
