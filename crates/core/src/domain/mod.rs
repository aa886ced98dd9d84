pub mod metrics;
pub mod outcome;
pub mod recommendation;

pub use metrics::{Bar, CompanyProfile, MetricsRecord};
pub use outcome::{AnalysisFailure, AnalysisSuccess, FailureStage, OutcomeRecord};
pub use recommendation::{AnalysisResult, Confidence, Recommendation};
