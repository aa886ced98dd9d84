pub mod agent;
pub mod domain;
pub mod error;
pub mod export;
pub mod llm;
pub mod market;
pub mod portfolio;
pub mod report;
pub mod screen;

pub mod config {
    use crate::error::ConfigError;
    use crate::llm::Provider;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub llm_provider: Provider,
        pub openai_api_key: Option<String>,
        pub openai_model: Option<String>,
        pub openai_base_url: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_model: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub llm_timeout_secs: Option<u64>,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> Result<Self, ConfigError> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup. `from_env` is the process-env flavour.
        pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where
            F: Fn(&str) -> Option<String>,
        {
            let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let llm_provider = match get("LLM_PROVIDER") {
                Some(v) => v.parse::<Provider>()?,
                None => Provider::OpenAI,
            };

            Ok(Self {
                llm_provider,
                openai_api_key: get("OPENAI_API_KEY"),
                openai_model: get("OPENAI_MODEL"),
                openai_base_url: get("OPENAI_BASE_URL"),
                anthropic_api_key: get("ANTHROPIC_API_KEY"),
                anthropic_model: get("ANTHROPIC_MODEL"),
                anthropic_base_url: get("ANTHROPIC_BASE_URL"),
                llm_timeout_secs: parse_opt(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS")?,
                market_data_base_url: get("MARKET_DATA_BASE_URL"),
                market_data_timeout_secs: parse_opt(
                    get("MARKET_DATA_TIMEOUT_SECS"),
                    "MARKET_DATA_TIMEOUT_SECS",
                )?,
                sentry_dsn: get("SENTRY_DSN"),
            })
        }

        /// Replaces the key of the selected provider, e.g. from a CLI flag.
        pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
            let api_key = Some(api_key.into());
            match self.llm_provider {
                Provider::OpenAI => self.openai_api_key = api_key,
                Provider::Anthropic => self.anthropic_api_key = api_key,
            }
            self
        }

        pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
            self.openai_api_key
                .as_deref()
                .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))
        }

        pub fn require_anthropic_api_key(&self) -> Result<&str, ConfigError> {
            self.anthropic_api_key
                .as_deref()
                .ok_or(ConfigError::MissingCredential("ANTHROPIC_API_KEY"))
        }
    }

    fn parse_opt(value: Option<String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
        value
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid { key, value: v })
            })
            .transpose()
    }

}
