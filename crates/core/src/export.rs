use crate::domain::{Confidence, OutcomeRecord, Recommendation};
use crate::error::ExportError;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub timestamp: String,
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub recommendation: Recommendation,
    pub confidence: Option<Confidence>,
    pub key_factors: Vec<String>,
    pub analysis_summary: String,
    pub metrics: ExportMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetrics {
    pub week_change: f64,
    pub month_change: f64,
    pub pe_ratio: f64,
    pub volume: u64,
    pub market_cap: u64,
}

/// Successful outcomes only, in input order.
pub fn export_entries(outcomes: &[OutcomeRecord], now: DateTime<FixedOffset>) -> Vec<ExportEntry> {
    let timestamp = now.to_rfc3339();
    outcomes
        .iter()
        .filter_map(OutcomeRecord::as_success)
        .map(|s| ExportEntry {
            timestamp: timestamp.clone(),
            symbol: s.symbol.clone(),
            company_name: s.company_name.clone(),
            current_price: s.current_price,
            recommendation: s.analysis.recommendation,
            confidence: s.analysis.confidence,
            key_factors: s.analysis.key_factors.clone(),
            analysis_summary: summarize(&s.analysis.analysis),
            metrics: ExportMetrics {
                week_change: s.stock_data.week_change,
                month_change: s.stock_data.month_change,
                pe_ratio: s.stock_data.pe_ratio,
                volume: s.stock_data.volume,
                market_cap: s.stock_data.market_cap,
            },
        })
        .collect()
}

pub fn export_file_name(now: DateTime<FixedOffset>) -> String {
    format!("stock_analysis_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Writes `stock_analysis_<time>.json` into `dir` and returns its path.
pub fn export_outcomes(
    outcomes: &[OutcomeRecord],
    dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf, ExportError> {
    let entries = export_entries(outcomes, now);
    let path = dir.join(export_file_name(now));

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &entries)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), entries = entries.len(), "exported analysis");
    Ok(path)
}

fn summarize(analysis: &str) -> String {
    let mut out: String = analysis.chars().take(SUMMARY_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::sample_metrics;
    use crate::domain::{AnalysisFailure, AnalysisResult, AnalysisSuccess, FailureStage};
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 4, 1, 9, 5, 7)
            .unwrap()
    }

    fn outcomes() -> Vec<OutcomeRecord> {
        let m = sample_metrics();
        vec![
            OutcomeRecord::Success(AnalysisSuccess {
                symbol: m.symbol.clone(),
                company_name: m.company_name.clone(),
                current_price: m.current_price,
                analysis: AnalysisResult {
                    recommendation: Recommendation::Buy,
                    confidence: Some(Confidence::High),
                    analysis: "a".repeat(620),
                    key_factors: vec!["High trading volume".to_string()],
                },
                stock_data: m,
            }),
            OutcomeRecord::Failure(AnalysisFailure {
                symbol: "ZZZZ".to_string(),
                stage: FailureStage::FetchData,
                error: "No data available for this symbol".to_string(),
                message: "Failed to fetch data for ZZZZ".to_string(),
                stock_data: None,
                analysis: None,
            }),
        ]
    }

    #[test]
    fn file_name_uses_export_time() {
        assert_eq!(export_file_name(now()), "stock_analysis_20260401_090507.json");
    }

    #[test]
    fn entries_skip_failures_and_truncate_analysis() {
        let entries = export_entries(&outcomes(), now());
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.symbol, "AAPL");
        assert_eq!(e.analysis_summary.chars().count(), 503);
        assert!(e.analysis_summary.ends_with("a..."));
        assert_eq!(e.timestamp, "2026-04-01T09:05:07+09:00");
    }

    #[test]
    fn short_analysis_still_gets_ellipsis() {
        assert_eq!(summarize("Hold."), "Hold....");
    }

    #[test]
    fn writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_outcomes(&outcomes(), dir.path(), now()).unwrap();
        assert_eq!(path.file_name().unwrap(), "stock_analysis_20260401_090507.json");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"));
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
        assert_eq!(v[0]["recommendation"], "BUY");
        assert_eq!(v[0]["confidence"], "HIGH");
        assert_eq!(v[0]["metrics"]["volume"], 52_345_678);
        assert_eq!(v[0]["metrics"]["market_cap"], 2_950_000_000_000u64);
    }
}
