use crate::domain::metrics::NOT_AVAILABLE;
use crate::domain::{Bar, CompanyProfile, MetricsRecord};
use crate::error::DataError;
use crate::market::MarketDataProvider;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Trailing window requested from the provider.
pub const WINDOW_DAYS: i64 = 35;
const WEEK_DAYS: i64 = 7;

/// Turns a provider's raw series and metadata into a [`MetricsRecord`].
#[derive(Clone)]
pub struct MarketDataNormalizer {
    provider: Arc<dyn MarketDataProvider>,
}

impl MarketDataNormalizer {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch(&self, symbol: &str) -> Result<MetricsRecord, DataError> {
        self.fetch_at(symbol, Utc::now()).await
    }

    pub async fn fetch_at(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<MetricsRecord, DataError> {
        let symbol = symbol.trim().to_uppercase();
        let start = now - Duration::days(WINDOW_DAYS);

        let bars = self.provider.fetch_bars(&symbol, start, now).await?;
        if bars.is_empty() {
            return Err(DataError::NoData { symbol });
        }

        // The price series alone is enough; metadata is a bonus.
        let profile = match self.provider.fetch_profile(&symbol).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(
                    %symbol,
                    provider = self.provider.provider_name(),
                    error = %err,
                    "metadata lookup failed; using defaults"
                );
                CompanyProfile::default()
            }
        };

        tracing::debug!(%symbol, bars = bars.len(), "fetched price window");
        derive_metrics(&symbol, &bars, &profile, now).ok_or(DataError::NoData { symbol })
    }
}

/// Derives the metrics record from ascending daily bars. `None` when `bars` is empty.
pub fn derive_metrics(
    symbol: &str,
    bars: &[Bar],
    profile: &CompanyProfile,
    now: DateTime<Utc>,
) -> Option<MetricsRecord> {
    let last = bars.last()?;
    let first = bars.first()?;
    let current_price = last.close;

    let week_cutoff = now.naive_utc() - Duration::days(WEEK_DAYS);
    let week: Vec<&Bar> = bars
        .iter()
        .filter(|b| b.date.and_hms_opt(0, 0, 0).is_some_and(|d| d >= week_cutoff))
        .collect();
    let week_change = match week.as_slice() {
        [start, _, ..] => percent_change(current_price, start.close),
        _ => 0.0,
    };

    let month_change = if bars.len() > 1 {
        percent_change(current_price, first.close)
    } else {
        0.0
    };

    let previous = if bars.len() > 1 {
        &bars[bars.len() - 2]
    } else {
        last
    };

    let window_high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let window_low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let avg_volume = bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;

    Some(MetricsRecord {
        symbol: symbol.to_string(),
        company_name: profile
            .long_name
            .clone()
            .unwrap_or_else(|| symbol.to_string()),
        current_price: round2(current_price),
        previous_close: round2(previous.close),
        open_price: round2(last.open),
        day_high: round2(last.high),
        day_low: round2(last.low),
        volume: last.volume,
        avg_volume: finite_or_zero(avg_volume) as u64,
        market_cap: profile.market_cap.unwrap_or(0),
        pe_ratio: number(profile.trailing_pe),
        forward_pe: number(profile.forward_pe),
        dividend_yield: number(profile.dividend_yield),
        week_change: round2(week_change),
        month_change: round2(month_change),
        week_52_high: round2(window_high),
        week_52_low: round2(window_low),
        earnings_per_share: number(profile.trailing_eps),
        beta: number(profile.beta),
        sector: label(&profile.sector),
        industry: label(&profile.industry),
        recommendation: label(&profile.recommendation_key),
        analyst_rating: number(profile.recommendation_mean),
        timestamp: now,
    })
}

fn percent_change(current: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    (current - base) / base * 100.0
}

pub(crate) fn round2(v: f64) -> f64 {
    finite_or_zero((v * 100.0).round() / 100.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn number(v: Option<f64>) -> f64 {
    v.map(finite_or_zero).unwrap_or(0.0)
}

fn label(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
