//! Error types for the scraper module

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Why a single page could not be scraped.
///
/// Every variant is recoverable at the item level: the session converts it
/// into the `error` field of the page's result and moves on.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The input could not be normalized into an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The site's robots.txt disallows the URL for our user agent
    #[error("Blocked by robots.txt")]
    RobotsBlocked,

    /// The request never completed
    #[error("{0}")]
    Network(NetworkErrorKind),

    /// The request completed with a non-2xx status
    #[error("HTTP error: {status}")]
    Http {
        /// Status returned by the server
        status: StatusCode,
    },

    /// A single extraction field failed
    #[error("Parse error in {field}: {message}")]
    Parse {
        /// The field that could not be extracted
        field: &'static str,
        /// Parser message
        message: String,
    },
}

impl ScrapeError {
    /// Status code to record alongside the error, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(status.as_u16()),
            _ => None,
        }
    }
}

/// Category of a network-level failure.
///
/// The categories only differ in the message shown to the user; they are all
/// handled the same way and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The request exceeded the configured timeout
    Timeout,
    /// DNS resolution, refused connection or TLS handshake failure
    Connection,
    /// The redirect limit was exceeded
    Redirect,
    /// The response body could not be read
    Body,
    /// Anything else reqwest reports
    Other,
}

impl NetworkErrorKind {
    /// Classify a reqwest error
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection
        } else if err.is_redirect() {
            Self::Redirect
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Timeout => "Timeout",
            Self::Connection => "Connection error",
            Self::Redirect => "Too many redirects",
            Self::Body => "Failed to read response body",
            Self::Other => "Request error",
        };
        f.write_str(message)
    }
}

impl From<&reqwest::Error> for ScrapeError {
    fn from(err: &reqwest::Error) -> Self {
        Self::Network(NetworkErrorKind::classify(err))
    }
}
