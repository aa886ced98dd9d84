use crate::domain::metrics::MetricsRecord;
use crate::domain::recommendation::AnalysisResult;
use serde::Serialize;

/// Where a pipeline run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    FetchData,
    Analyze,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSuccess {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub stock_data: MetricsRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    pub symbol: String,
    pub stage: FailureStage,
    pub error: String,
    pub message: String,
    /// Present when the data fetch succeeded and the analysis did not.
    pub stock_data: Option<MetricsRecord>,
    /// The degraded `ERROR` analysis, for analysis-stage failures only.
    pub analysis: Option<AnalysisResult>,
}

/// Per-symbol result handed to callers. Either fully populated or a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeRecord {
    Success(AnalysisSuccess),
    Failure(AnalysisFailure),
}

impl OutcomeRecord {
    pub fn symbol(&self) -> &str {
        match self {
            OutcomeRecord::Success(s) => &s.symbol,
            OutcomeRecord::Failure(f) => &f.symbol,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeRecord::Success(_))
    }

    pub fn as_success(&self) -> Option<&AnalysisSuccess> {
        match self {
            OutcomeRecord::Success(s) => Some(s),
            OutcomeRecord::Failure(_) => None,
        }
    }

    pub fn stock_data(&self) -> Option<&MetricsRecord> {
        match self {
            OutcomeRecord::Success(s) => Some(&s.stock_data),
            OutcomeRecord::Failure(f) => f.stock_data.as_ref(),
        }
    }
}
