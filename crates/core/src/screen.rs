//! Simple filters over finished outcomes. Failed symbols never qualify.

use crate::domain::{OutcomeRecord, Recommendation};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumPick {
    pub symbol: String,
    pub company: String,
    pub price: f64,
    pub week_change: f64,
    pub month_change: f64,
    /// Latest volume over window average.
    pub volume_ratio: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePick {
    pub symbol: String,
    pub company: String,
    pub price: f64,
    pub pe_ratio: f64,
    pub forward_pe: f64,
    /// Percent, e.g. `3.5` for a 0.035 yield.
    pub dividend_yield_pct: f64,
    pub beta: f64,
    pub recommendation: Recommendation,
}

/// Week change above 2% and month change above 5%, strongest month first.
pub fn momentum_screen(outcomes: &[OutcomeRecord]) -> Vec<MomentumPick> {
    let mut picks: Vec<MomentumPick> = outcomes
        .iter()
        .filter_map(OutcomeRecord::as_success)
        .filter(|s| s.stock_data.week_change > 2.0 && s.stock_data.month_change > 5.0)
        .map(|s| {
            let m = &s.stock_data;
            let volume_ratio = if m.avg_volume == 0 {
                0.0
            } else {
                m.volume as f64 / m.avg_volume as f64
            };
            MomentumPick {
                symbol: s.symbol.clone(),
                company: s.company_name.clone(),
                price: m.current_price,
                week_change: m.week_change,
                month_change: m.month_change,
                volume_ratio,
                recommendation: s.analysis.recommendation,
            }
        })
        .collect();

    picks.sort_by(|a, b| {
        b.month_change
            .partial_cmp(&a.month_change)
            .unwrap_or(Ordering::Equal)
    });
    picks
}

/// Positive P/E under 20 with a dividend yield above 2%, cheapest first.
pub fn value_screen(outcomes: &[OutcomeRecord]) -> Vec<ValuePick> {
    let mut picks: Vec<ValuePick> = outcomes
        .iter()
        .filter_map(OutcomeRecord::as_success)
        .filter(|s| {
            let m = &s.stock_data;
            m.pe_ratio > 0.0 && m.pe_ratio < 20.0 && m.dividend_yield > 0.02
        })
        .map(|s| {
            let m = &s.stock_data;
            ValuePick {
                symbol: s.symbol.clone(),
                company: s.company_name.clone(),
                price: m.current_price,
                pe_ratio: m.pe_ratio,
                forward_pe: m.forward_pe,
                dividend_yield_pct: m.dividend_yield * 100.0,
                beta: m.beta,
                recommendation: s.analysis.recommendation,
            }
        })
        .collect();

    picks.sort_by(|a, b| a.pe_ratio.partial_cmp(&b.pe_ratio).unwrap_or(Ordering::Equal));
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::sample_metrics;
    use crate::domain::{AnalysisResult, AnalysisSuccess, MetricsRecord};

    fn outcome(symbol: &str, edit: impl FnOnce(&mut MetricsRecord)) -> OutcomeRecord {
        let mut m = sample_metrics();
        m.symbol = symbol.to_string();
        edit(&mut m);
        OutcomeRecord::Success(AnalysisSuccess {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Inc."),
            current_price: m.current_price,
            analysis: AnalysisResult {
                recommendation: Recommendation::Hold,
                confidence: None,
                analysis: String::new(),
                key_factors: Vec::new(),
            },
            stock_data: m,
        })
    }

    #[test]
    fn momentum_filters_and_sorts_by_month_change() {
        let outcomes = vec![
            outcome("A", |m| {
                m.week_change = 3.0;
                m.month_change = 6.0;
            }),
            outcome("B", |m| {
                m.week_change = 2.0;
                m.month_change = 20.0;
            }),
            outcome("C", |m| {
                m.week_change = 4.0;
                m.month_change = 12.0;
                m.volume = 90;
                m.avg_volume = 60;
            }),
        ];

        let picks = momentum_screen(&outcomes);
        let symbols: Vec<&str> = picks.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["C", "A"]);
        assert_eq!(picks[0].volume_ratio, 1.5);
    }

    #[test]
    fn value_filters_and_sorts_by_pe() {
        let outcomes = vec![
            outcome("KO", |m| {
                m.pe_ratio = 18.0;
                m.dividend_yield = 0.03;
            }),
            outcome("VZ", |m| {
                m.pe_ratio = 8.5;
                m.dividend_yield = 0.065;
            }),
            outcome("NVDA", |m| {
                m.pe_ratio = 60.0;
                m.dividend_yield = 0.03;
            }),
            outcome("NODIV", |m| {
                m.pe_ratio = 10.0;
                m.dividend_yield = 0.0;
            }),
        ];

        let picks = value_screen(&outcomes);
        let symbols: Vec<&str> = picks.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["VZ", "KO"]);
        assert!((picks[0].dividend_yield_pct - 6.5).abs() < 1e-9);
    }
}
