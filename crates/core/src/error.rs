use thiserror::Error;

pub use crate::llm::error::ModelError;

/// Raised while building clients from [`crate::config::Settings`]. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Market-data failures. Recoverable per symbol.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No data available for this symbol")]
    NoData { symbol: String },

    #[error("market data request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("market data HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode market data: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed command-line inputs for portfolio and sector runs.
#[derive(Debug, Error)]
pub enum ParseInputError {
    #[error("invalid holding {0:?}, expected SYMBOL:SHARES@BUY_PRICE")]
    Holding(String),

    #[error("invalid sector group {0:?}, expected NAME=SYM1,SYM2")]
    SectorGroup(String),
}
