//! Error types for the scrapekit crate

use thiserror::Error;

/// Result type for scrapekit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for scrapekit operations
///
/// Per-page failures never surface here; they are recorded on the
/// [`ScrapeResult`](crate::scrape::ScrapeResult) instead. This type covers
/// setup, export and analysis failures.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid scraper configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// LLM analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),
}
