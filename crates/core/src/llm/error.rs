use crate::llm::Provider;
use thiserror::Error;

/// Completion-call failure. `stage` names where it happened (`http`, `transport`, `decode`,
/// `empty`).
#[derive(Debug, Clone, Error)]
#[error("LLM error (provider={provider}, stage={stage}): {detail}")]
pub struct ModelError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl ModelError {
    pub fn new(provider: Provider, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw: impl Into<String>) -> Self {
        self.raw_output = Some(raw.into());
        self
    }

    pub(crate) fn transport(provider: Provider, err: reqwest::Error) -> Self {
        Self::new(provider, "transport", err.to_string())
    }

    /// Non-2xx reply. Both providers wrap their explanation in `{"error": {"message": ..}}`.
    pub(crate) fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        let detail = match provider_message(&body) {
            Some(message) => format!("status={status}: {message}"),
            None => format!("status={status}"),
        };
        Self::new(provider, "http", detail).with_raw_output(body)
    }
}

fn provider_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = v.pointer("/error/message")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}
