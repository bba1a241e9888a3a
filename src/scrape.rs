//! # Page Scraping Module
//!
//! The core of the toolkit: fetch a page, extract structured content from it,
//! and run whole batches of pages politely and without letting one failure
//! affect the others.
//!
//! ## Key Components
//!
//! - `ScraperConfig`: Session-wide settings (delay, timeout, robots.txt, headers)
//! - `ScraperSession`: Owns the shared HTTP client and robots.txt cache; scrapes
//!   single pages and sequential batches
//! - `ScrapeResult`: The structured outcome of one page, successful or not
//! - `BatchSummary`: Pure aggregation over a batch's results
//! - `export`: JSON serialization of results
//!
//! ## Pipeline
//!
//! Each URL moves through [`Stage`]s: it is normalized, checked against
//! robots.txt, fetched once and, on a 2xx response, handed to the extractors.
//! Any stage may end the item early with an error recorded on its result;
//! nothing is retried.

mod config;
mod error;
pub mod export;
pub mod extract;
mod fetch;
mod robots;
mod session;
pub mod summary;
pub mod text;
pub mod urls;

pub use config::{ScraperConfig, ScraperConfigBuilder};
pub use error::{NetworkErrorKind, ScrapeError};
pub use fetch::FetchedPage;
pub use robots::RobotsGate;
pub use session::ScraperSession;
pub use summary::{BatchSummary, Sitemap, format_summary};
pub use urls::normalize_url;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which parts of a page to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub text: bool,
    pub links: bool,
    pub images: bool,
    pub metadata: bool,

    /// CSS selector restricting text extraction to the matching subtrees
    pub selector: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            text: true,
            links: true,
            images: true,
            metadata: true,
            selector: None,
        }
    }
}

/// A single page to scrape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Raw URL; a missing scheme is filled in during normalization
    pub url: String,

    pub options: ExtractOptions,

    /// Headers for this request only, sent in addition to the session's
    pub headers: BTreeMap<String, String>,
}

impl ScrapeRequest {
    /// Request `url` with the default extraction options
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Replace the extraction options
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a header for this request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A hyperlink found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    /// Trimmed anchor text, empty when the anchor has none
    pub anchor_text: String,
    pub title: Option<String>,
}

/// An image found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    /// Empty when the image has no `alt` attribute
    pub alt_text: String,
    pub title: Option<String>,
}

/// Outcome of scraping one page.
///
/// Exactly one is produced per request. `status_code` is absent when the
/// server was never reached; `error` is set for every kind of failure,
/// including completed requests with a non-2xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// The normalized URL requested (the trimmed input if normalization failed)
    pub url: String,
    pub status_code: Option<u16>,
    pub title: Option<String>,
    pub text_content: Option<String>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub metadata: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl ScrapeResult {
    /// A result for a page that failed with `error`
    pub fn failed(url: impl Into<String>, error: &ScrapeError) -> Self {
        Self {
            url: url.into(),
            status_code: error.status_code(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Successful pages have no error and a 2xx status
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code.is_some_and(|code| (200..300).contains(&code))
    }

    /// The server answered, but not with usable content
    pub fn is_soft_failure(&self) -> bool {
        self.error.is_some() && self.status_code.is_some()
    }
}

/// Where an item is in the scraping pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Normalizing,
    RobotsCheck,
    Fetching,
    Extracting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Normalizing => "normalizing",
            Self::RobotsCheck => "robots_check",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
