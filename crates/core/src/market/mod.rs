use crate::domain::{Bar, CompanyProfile};
use crate::error::DataError;
use chrono::{DateTime, Utc};

pub mod normalizer;
pub mod yahoo;

pub use normalizer::MarketDataNormalizer;
pub use yahoo::YahooFinanceClient;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars in ascending date order. An unknown symbol may yield an empty series.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError>;

    /// Descriptive metadata. Callers treat any error here as "not available".
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DataError>;
}
