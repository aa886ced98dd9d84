use crate::config::Settings;
use crate::domain::{AnalysisFailure, AnalysisResult, AnalysisSuccess, FailureStage, OutcomeRecord};
use crate::error::ConfigError;
use crate::llm::{self, LlmClient, RecommendationGenerator};
use crate::market::{MarketDataNormalizer, MarketDataProvider, YahooFinanceClient};
use std::sync::Arc;

/// Fetch-then-analyze pipeline for one symbol at a time.
///
/// Holds its two collaborators and nothing else; no results are cached between calls.
#[derive(Clone)]
pub struct StockAgent {
    normalizer: MarketDataNormalizer,
    generator: RecommendationGenerator,
}

impl StockAgent {
    pub fn new(market: Arc<dyn MarketDataProvider>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            normalizer: MarketDataNormalizer::new(market),
            generator: RecommendationGenerator::new(llm),
        }
    }

    /// Yahoo Finance plus the configured LLM provider. Fails when the API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let market = Arc::new(YahooFinanceClient::from_settings(settings)?);
        let llm = llm::client_from_settings(settings)?;
        Ok(Self::new(market, llm))
    }

    /// Never fails: collaborator errors come back as [`OutcomeRecord::Failure`].
    pub async fn analyze_symbol(&self, symbol: &str) -> OutcomeRecord {
        let symbol = symbol.trim().to_uppercase();
        tracing::info!(%symbol, "analyzing symbol");

        let metrics = match self.normalizer.fetch(&symbol).await {
            Ok(metrics) => metrics,
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "market data fetch failed");
                return OutcomeRecord::Failure(AnalysisFailure {
                    message: format!("Failed to fetch data for {symbol}: {err}"),
                    error: err.to_string(),
                    symbol,
                    stage: FailureStage::FetchData,
                    stock_data: None,
                    analysis: None,
                });
            }
        };

        tracing::info!(
            %symbol,
            company = %metrics.company_name,
            current_price = metrics.current_price,
            week_change = metrics.week_change,
            month_change = metrics.month_change,
            "retrieved stock data"
        );

        match self.generator.analyze(&metrics).await {
            Ok(analysis) => {
                tracing::info!(
                    %symbol,
                    recommendation = %analysis.recommendation,
                    "analysis complete"
                );
                OutcomeRecord::Success(AnalysisSuccess {
                    symbol,
                    company_name: metrics.company_name.clone(),
                    current_price: metrics.current_price,
                    analysis,
                    stock_data: metrics,
                })
            }
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "analysis failed");
                let error = err.to_string();
                OutcomeRecord::Failure(AnalysisFailure {
                    symbol,
                    stage: FailureStage::Analyze,
                    message: format!("Failed to analyze stock: {error}"),
                    analysis: Some(AnalysisResult::failed(&error)),
                    error,
                    stock_data: Some(metrics),
                })
            }
        }
    }

    /// Runs symbols one after another, carrying on past failures.
    pub async fn analyze_many<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<OutcomeRecord> {
        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            out.push(self.analyze_symbol(symbol.as_ref()).await);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, CompanyProfile, Confidence, Recommendation};
    use crate::error::DataError;
    use crate::llm::{CompletionRequest, ModelError, Provider};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed closes per symbol; unknown symbols get an empty series.
    struct FakeMarket {
        closes: HashMap<String, Vec<f64>>,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for FakeMarket {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_bars(
            &self,
            symbol: &str,
            _start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Bar>, DataError> {
            let closes = self.closes.get(symbol).cloned().unwrap_or_default();
            let n = closes.len() as i64;
            Ok(closes
                .into_iter()
                .enumerate()
                .map(|(i, close)| Bar {
                    date: (end - Duration::days(n - 1 - i as i64)).date_naive(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                })
                .collect())
        }

        async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DataError> {
            Ok(CompanyProfile {
                long_name: Some(format!("{symbol} Corp")),
                trailing_pe: Some(12.0),
                ..Default::default()
            })
        }
    }

    /// Replies per symbol found in the prompt; a symbol mapped to `None` fails.
    struct FakeLlm {
        replies: HashMap<String, Option<String>>,
        calls: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl LlmClient for FakeLlm {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
            *self.calls.lock().unwrap() += 1;
            for (symbol, reply) in &self.replies {
                if request.prompt.contains(&format!("({symbol})")) {
                    return reply.clone().ok_or_else(|| {
                        ModelError::http(
                            Provider::OpenAI,
                            reqwest::StatusCode::TOO_MANY_REQUESTS,
                            r#"{"error":{"message":"You exceeded your current quota"}}"#.to_string(),
                        )
                    });
                }
            }
            Ok("No strong view.".to_string())
        }
    }

    fn agent(llm: Arc<FakeLlm>) -> StockAgent {
        let market = FakeMarket {
            closes: HashMap::from([
                ("AAPL".to_string(), vec![100.0, 104.0, 110.0]),
                ("TSLA".to_string(), vec![250.0, 240.0]),
            ]),
        };
        StockAgent::new(Arc::new(market), llm)
    }

    fn llm(replies: &[(&str, Option<&str>)]) -> Arc<FakeLlm> {
        Arc::new(FakeLlm {
            replies: replies
                .iter()
                .map(|(s, r)| (s.to_string(), r.map(str::to_string)))
                .collect(),
            calls: Mutex::new(0),
        })
    }

    #[tokio::test]
    async fn success_merges_metrics_and_analysis() {
        let llm = llm(&[("AAPL", Some("Buy: excellent momentum."))]);
        let outcome = agent(llm).analyze_symbol("aapl").await;

        let OutcomeRecord::Success(s) = outcome else {
            panic!("expected success");
        };
        assert_eq!(s.symbol, "AAPL");
        assert_eq!(s.company_name, "AAPL Corp");
        assert_eq!(s.current_price, 110.0);
        assert_eq!(s.analysis.recommendation, Recommendation::Buy);
        assert_eq!(s.analysis.confidence, Some(Confidence::High));
        assert_eq!(s.stock_data.month_change, 10.0);
        assert!(s
            .analysis
            .key_factors
            .contains(&"Attractive P/E ratio".to_string()));
    }

    #[tokio::test]
    async fn fetch_failure_skips_analysis() {
        let llm = llm(&[]);
        let outcome = agent(llm.clone()).analyze_symbol("ZZZZ").await;

        let OutcomeRecord::Failure(f) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(f.stage, FailureStage::FetchData);
        assert_eq!(f.error, "No data available for this symbol");
        assert_eq!(
            f.message,
            "Failed to fetch data for ZZZZ: No data available for this symbol"
        );
        assert!(f.stock_data.is_none());
        assert!(f.analysis.is_none());
        assert_eq!(*llm.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn model_failure_keeps_fetched_metrics() {
        let llm = llm(&[("TSLA", None)]);
        let outcome = agent(llm).analyze_symbol("TSLA").await;

        let OutcomeRecord::Failure(f) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(f.stage, FailureStage::Analyze);
        assert_eq!(f.stock_data.as_ref().map(|m| m.current_price), Some(240.0));
        let degraded = f.analysis.unwrap();
        assert_eq!(degraded.recommendation, Recommendation::Error);
        assert!(degraded.confidence.is_none());
        assert!(degraded.analysis.contains("status=429"));
        assert!(degraded.analysis.contains("You exceeded your current quota"));
        assert!(f.error.contains("You exceeded your current quota"));
        assert!(f.message.starts_with("Failed to analyze stock: LLM error"));
    }

    #[tokio::test]
    async fn many_continues_after_failures_in_order() {
        let llm = llm(&[("AAPL", Some("Sell now.")), ("TSLA", None)]);
        let outcomes = agent(llm).analyze_many(&["TSLA", "NOPE", "AAPL"]).await;

        let symbols: Vec<&str> = outcomes.iter().map(|o| o.symbol()).collect();
        assert_eq!(symbols, ["TSLA", "NOPE", "AAPL"]);
        assert!(!outcomes[0].is_success());
        assert!(outcomes[0].stock_data().is_some());
        assert!(outcomes[1].stock_data().is_none());
        assert_eq!(
            outcomes[2].as_success().map(|s| s.analysis.recommendation),
            Some(Recommendation::Sell)
        );
    }
}
