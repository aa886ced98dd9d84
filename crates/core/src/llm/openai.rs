use crate::config::Settings;
use crate::error::ConfigError;
use crate::llm::error::ModelError;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = settings
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .openai_model
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

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_request<'a>(&'a self, req: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &req.system,
                },
                Message {
                    role: "user",
                    content: &req.prompt,
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }
    }

    fn response_text(res: ChatCompletionResponse) -> Option<String> {
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ModelError::new(Provider::OpenAI, "auth", e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&self.chat_request(&request))
            .send()
            .await
            .map_err(|e| ModelError::transport(Provider::OpenAI, e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ModelError::transport(Provider::OpenAI, e))?;
        if !status.is_success() {
            return Err(ModelError::http(Provider::OpenAI, status, text));
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            ModelError::new(Provider::OpenAI, "decode", e.to_string()).with_raw_output(text.clone())
        })?;
        Self::response_text(parsed).ok_or_else(|| {
            ModelError::new(Provider::OpenAI, "empty", "no completion choices returned")
                .with_raw_output(text)
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
