use crate::config::Settings;
use crate::domain::{Bar, CompanyProfile};
use crate::error::{ConfigError, DataError};
use crate::market::MarketDataProvider;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
// Any response from here sets the session cookie the crumb is bound to.
const COOKIE_URL: &str = "https://fc.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,assetProfile,financialData";

// The endpoints reject requests without a browser-like agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooFinanceClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// quoteSummary needs a session cookie plus the crumb issued for it. Fetched once per client
    /// and shared by clones; cleared again when Yahoo rejects it.
    async fn crumb(&self) -> Result<String, DataError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // fc.yahoo.com answers 404 but still sets the cookie.
        if let Err(err) = self.http.get(COOKIE_URL).headers(Self::headers()).send().await {
            tracing::debug!(error = %err, "yahoo cookie request failed");
        }

        let res = self
            .http
            .get(self.url("/v1/test/getcrumb"))
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await?;
        let crumb = parse_crumb(status, text)?;
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn forget_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<(reqwest::StatusCode, Option<T>, String), DataError> {
        let res = self
            .http
            .get(url)
            .headers(Self::headers())
            .query(query)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        let parsed = serde_json::from_str::<T>(&text).ok();
        Ok((status, parsed, text))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let url = self.url(&format!("/v8/finance/chart/{symbol}"));
        let query = [
            ("period1", start.timestamp().to_string()),
            ("period2", end.timestamp().to_string()),
            ("interval", "1d".to_string()),
            ("events", "div,splits".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ];

        let (status, parsed, text) = self.get_json::<ChartResponse>(url, &query).await?;
        match parsed {
            Some(body) if status.is_success() || body.chart.error.is_some() => {
                parse_chart(symbol, body)
            }
            _ if !status.is_success() => Err(DataError::Http {
                status: status.as_u16(),
                body: text,
            }),
            _ => Err(DataError::Decode(format!(
                "chart response is not valid JSON: {text}"
            ))),
        }
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DataError> {
        let url = self.url(&format!("/v10/finance/quoteSummary/{symbol}"));
        let query = [
            ("modules", SUMMARY_MODULES.to_string()),
            ("crumb", self.crumb().await?),
        ];

        let (status, parsed, text) = self.get_json::<QuoteSummaryResponse>(url, &query).await?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.forget_crumb().await;
        }
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        let body = parsed.ok_or_else(|| {
            DataError::Decode(format!("quoteSummary response is not valid JSON: {text}"))
        })?;
        parse_quote_summary(body)
    }
}

/// The crumb endpoint replies with the bare token as text; anything else is an error page.
fn parse_crumb(status: reqwest::StatusCode, body: String) -> Result<String, DataError> {
    let crumb = body.trim();
    let looks_valid = !crumb.is_empty()
        && !crumb.contains(char::is_whitespace)
        && !crumb.contains(['<', '{']);
    if !status.is_success() || !looks_valid {
        return Err(DataError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(crumb.to_string())
}

fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Vec<Bar>, DataError> {
    if let Some(err) = body.chart.error {
        tracing::debug!(symbol, code = %err.code, description = %err.description, "chart error");
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.gmtoffset;
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        let factor = match at(&adjclose, i) {
            Some(adj) if close != 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(Bar {
            date,
            open: at(&quote.open, i).unwrap_or(close) * factor,
            high: at(&quote.high, i).unwrap_or(close) * factor,
            low: at(&quote.low, i).unwrap_or(close) * factor,
            close: close * factor,
            volume: at(&quote.volume, i).map(|v| v.max(0.0) as u64).unwrap_or(0),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten().filter(|v| v.is_finite())
}

fn parse_quote_summary(body: QuoteSummaryResponse) -> Result<CompanyProfile, DataError> {
    if let Some(err) = body.quote_summary.error {
        return Err(DataError::Decode(format!(
            "quoteSummary error {}: {}",
            err.code, err.description
        )));
    }
    let result = body
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::Decode("quoteSummary returned no result".to_string()))?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();
    let profile = result.asset_profile.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();

    Ok(CompanyProfile {
        long_name: non_empty(price.long_name),
        market_cap: price
            .market_cap
            .value()
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64),
        trailing_pe: detail.trailing_pe.value(),
        forward_pe: detail.forward_pe.value(),
        dividend_yield: detail.dividend_yield.value(),
        trailing_eps: stats.trailing_eps.value(),
        beta: detail.beta.value(),
        sector: non_empty(profile.sector),
        industry: non_empty(profile.industry),
        recommendation_key: non_empty(financial.recommendation_key),
        recommendation_mean: financial.recommendation_mean.value(),
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
    asset_profile: Option<AssetProfileModule>,
    financial_data: Option<FinancialDataModule>,
}

/// `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when the value is unknown.
#[derive(Debug, Default, Deserialize)]
struct RawNumber {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawNumber {
    fn value(&self) -> Option<f64> {
        self.raw.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
    market_cap: RawNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: RawNumber,
    #[serde(rename = "forwardPE")]
    forward_pe: RawNumber,
    #[serde(rename = "dividendYield")]
    dividend_yield: RawNumber,
    beta: RawNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatisticsModule {
    trailing_eps: RawNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialDataModule {
    recommendation_key: Option<String>,
    recommendation_mean: RawNumber,
}
