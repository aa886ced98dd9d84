use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for categorical fields the metadata lookup could not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One trading day, already adjusted for splits and dividends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Best-effort descriptive bundle. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub market_cap: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub beta: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub recommendation_key: Option<String>,
    pub recommendation_mean: Option<f64>,
}

/// Flat snapshot of one symbol's recent trading and valuation figures.
///
/// Numbers are always finite; absent provider data shows up as `0` or [`NOT_AVAILABLE`].
/// `week_52_high`/`week_52_low` span only the fetched window (about five weeks), not a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub open_price: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub avg_volume: u64,
    pub market_cap: u64,
    pub pe_ratio: f64,
    pub forward_pe: f64,
    pub dividend_yield: f64,
    pub week_change: f64,
    pub month_change: f64,
    #[serde(rename = "52_week_high")]
    pub week_52_high: f64,
    #[serde(rename = "52_week_low")]
    pub week_52_low: f64,
    pub earnings_per_share: f64,
    pub beta: f64,
    pub sector: String,
    pub industry: String,
    /// Consensus label from analysts, e.g. `buy`.
    pub recommendation: String,
    /// Consensus score, 1 (strong buy) to 5 (sell).
    pub analyst_rating: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_metrics() -> MetricsRecord {
    use chrono::TimeZone;

    MetricsRecord {
        symbol: "AAPL".to_string(),
        company_name: "Apple Inc.".to_string(),
        current_price: 189.5,
        previous_close: 187.25,
        open_price: 188.0,
        day_high: 190.1,
        day_low: 186.9,
        volume: 52_345_678,
        avg_volume: 48_000_000,
        market_cap: 2_950_000_000_000,
        pe_ratio: 29.4,
        forward_pe: 26.1,
        dividend_yield: 0.0051,
        week_change: 1.25,
        month_change: -3.4,
        week_52_high: 199.62,
        week_52_low: 180.17,
        earnings_per_share: 6.43,
        beta: 1.28,
        sector: "Technology".to_string(),
        industry: "Consumer Electronics".to_string(),
        recommendation: "buy".to_string(),
        analyst_rating: 2.1,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 31, 21, 0, 0).unwrap(),
    }
}
