use crate::domain::{AnalysisResult, MetricsRecord};
use crate::llm::error::ModelError;
use crate::llm::heuristics::{extract_confidence, extract_recommendation, key_factors};
use crate::llm::prompt::{analysis_prompt, SYSTEM_PROMPT};
use crate::llm::{CompletionRequest, LlmClient};
use std::sync::Arc;

/// Moderate on purpose: wording differs between identical calls.
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 800;

#[derive(Clone)]
pub struct RecommendationGenerator {
    client: Arc<dyn LlmClient>,
}

impl RecommendationGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn request(metrics: &MetricsRecord) -> CompletionRequest {
        CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: analysis_prompt(metrics),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// One completion call, no retries.
    pub async fn analyze(&self, metrics: &MetricsRecord) -> Result<AnalysisResult, ModelError> {
        let provider = self.client.provider();
        tracing::info!(symbol = %metrics.symbol, %provider, "analyzing with AI");

        let text = self.client.complete(Self::request(metrics)).await?;
        Ok(interpret(text, metrics))
    }
}

/// Turns a raw reply into the structured result.
pub fn interpret(analysis: String, metrics: &MetricsRecord) -> AnalysisResult {
    AnalysisResult {
        recommendation: extract_recommendation(&analysis),
        confidence: Some(extract_confidence(&analysis)),
        key_factors: key_factors(metrics),
        analysis,
    }
}
