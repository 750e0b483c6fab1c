use std::time::Duration;
use thiserror::Error;

/// Main error type for the deal engine
#[derive(Error, Debug)]
pub enum DealEngineError {
    /// Catalog could not be loaded completely (fatal at startup)
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scoring oracle rejected a feature vector (per-listing, recoverable)
    #[error("Scoring oracle error: {0}")]
    Oracle(String),

    /// Scoring oracle did not answer in time (per-listing, recoverable)
    #[error("Scoring oracle timed out after {0:?}")]
    OracleTimeout(Duration),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl DealEngineError {
    /// Errors that only cost a single listing its place in the ranking
    pub fn is_per_listing(&self) -> bool {
        matches!(self, DealEngineError::Oracle(_) | DealEngineError::OracleTimeout(_))
    }
}

impl From<String> for DealEngineError {
    fn from(s: String) -> Self {
        DealEngineError::Other(s)
    }
}

impl From<&str> for DealEngineError {
    fn from(s: &str) -> Self {
        DealEngineError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DealEngineError>;
