//! # scrapekit - Polite Web Page Scraping for Rust
//!
//! This crate fetches web pages and turns them into structured results: title,
//! visible text, links, images and meta tags. Batches run strictly one page at
//! a time with a fixed delay between requests, and robots.txt is honored by
//! default.
//!
//! ## Features
//!
//! - One pooled HTTP client per session with cookies and default headers
//! - robots.txt checks cached per origin
//! - Per-field extraction that degrades instead of failing the page
//! - A result for every input URL, in input order, whatever goes wrong
//! - JSON export and batch statistics
//! - Optional LLM summaries and content analysis of scraped pages through `rig`
//!
//! ## Example
//!
//! ```rust,no_run
//! use scrapekit::scrape::{ExtractOptions, ScraperConfig, ScraperSession};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScraperConfig::builder()
//!         .delay(Duration::from_millis(500))
//!         .build();
//!     let mut session = ScraperSession::new(config)?;
//!
//!     let results = session
//!         .scrape_many(&["example.com", "https://www.rust-lang.org"], &ExtractOptions::default())
//!         .await;
//!
//!     for result in &results {
//!         println!("{}: {:?}", result.url, result.title);
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub mod analysis;
pub mod scrape;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::scrape::{
        ExtractOptions, ScrapeRequest, ScrapeResult, ScraperConfig, ScraperSession,
    };
}
