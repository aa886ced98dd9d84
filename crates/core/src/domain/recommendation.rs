use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
    Error,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
            Recommendation::Error => "ERROR",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Recommendation::Buy => "🟢",
            Recommendation::Hold => "🟡",
            Recommendation::Sell => "🔴",
            Recommendation::Error => "⚪",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub recommendation: Recommendation,
    /// Absent only on the degraded `ERROR` result.
    pub confidence: Option<Confidence>,
    pub analysis: String,
    pub key_factors: Vec<String>,
}

impl AnalysisResult {
    /// Result reported in place of a real analysis when the completion call failed.
    pub fn failed(message: &str) -> Self {
        Self {
            recommendation: Recommendation::Error,
            confidence: None,
            analysis: format!("Failed to analyze stock: {message}"),
            key_factors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_labels_uppercase() {
        let v = serde_json::to_value(AnalysisResult {
            recommendation: Recommendation::Buy,
            confidence: Some(Confidence::Medium),
            analysis: "text".to_string(),
            key_factors: vec![],
        })
        .unwrap();
        assert_eq!(v["recommendation"], "BUY");
        assert_eq!(v["confidence"], "MEDIUM");
    }

    #[test]
    fn failed_result_has_error_label_and_no_confidence() {
        let r = AnalysisResult::failed("quota exceeded");
        assert_eq!(r.recommendation, Recommendation::Error);
        assert!(r.confidence.is_none());
        assert_eq!(r.analysis, "Failed to analyze stock: quota exceeded");
        assert_eq!(r.recommendation.emoji(), "⚪");
    }
}
