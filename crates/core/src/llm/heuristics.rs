//! Lexical post-processing of free-text model replies.
//!
//! These are substring scans, not sentiment analysis. Keyword sets and the 50-character
//! window are part of the observable contract and must stay as they are.

use crate::domain::{Confidence, MetricsRecord, Recommendation};

/// Width, in characters, of the leading window used to break BUY/SELL ties.
const LEAD_WINDOW_CHARS: usize = 50;

const HIGH_CONFIDENCE_WORDS: [&str; 4] = ["strongly recommend", "excellent", "compelling", "highly"];
const LOW_CONFIDENCE_WORDS: [&str; 4] = ["risky", "cautious", "uncertain", "volatile"];

/// BUY if "BUY" appears anywhere and "SELL" is absent from the leading window; SELL
/// symmetrically; HOLD otherwise. Case-insensitive.
pub fn extract_recommendation(analysis: &str) -> Recommendation {
    let upper = analysis.to_uppercase();
    let lead: String = upper.chars().take(LEAD_WINDOW_CHARS).collect();

    if upper.contains("BUY") && !lead.contains("SELL") {
        Recommendation::Buy
    } else if upper.contains("SELL") && !lead.contains("BUY") {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

/// HIGH-signal words win over LOW-signal words when both occur.
pub fn extract_confidence(analysis: &str) -> Confidence {
    let lower = analysis.to_lowercase();

    if HIGH_CONFIDENCE_WORDS.iter().any(|w| lower.contains(w)) {
        Confidence::High
    } else if LOW_CONFIDENCE_WORDS.iter().any(|w| lower.contains(w)) {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

/// Notable facts about the metrics themselves, independent of the model's reply.
pub fn key_factors(m: &MetricsRecord) -> Vec<String> {
    let mut factors = Vec::new();

    if m.week_change > 5.0 {
        factors.push("Strong weekly momentum".to_string());
    } else if m.week_change < -5.0 {
        factors.push("Weak weekly performance".to_string());
    }

    if m.pe_ratio > 0.0 && m.pe_ratio < 15.0 {
        factors.push("Attractive P/E ratio".to_string());
    } else if m.pe_ratio > 30.0 {
        factors.push("High P/E ratio".to_string());
    }

    if m.volume as f64 > m.avg_volume as f64 * 1.5 {
        factors.push("High trading volume".to_string());
    }

    if m.dividend_yield > 0.02 {
        factors.push(format!("Dividend yield: {:.2}%", m.dividend_yield * 100.0));
    }

    // Window extremes, not a true 52-week range.
    if m.current_price >= m.week_52_high * 0.95 {
        factors.push("Near 52-week high".to_string());
    } else if m.current_price <= m.week_52_low * 1.05 {
        factors.push("Near 52-week low".to_string());
    }

    factors
}
