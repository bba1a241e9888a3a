//! # LLM Analysis Module
//!
//! Optional post-processing of scraped pages with a language model. The
//! scraping core knows nothing about this module; it only consumes the
//! `text_content` of finished results.
//!
//! ## Key Components
//!
//! - `Summarizer`: Capability trait for anything that can summarize text
//! - `CompletionSummarizer`: A `Summarizer` over any `rig` completion model
//! - `ContentAnalyzer`: Capability trait for page analysis from title and text
//! - `CompletionAnalyzer`: Summary, sentiment, category, entities, language and
//!   quality, one agent each over the same model
//! - `ThrottledModel`: Adds a per-minute quota to any completion model
//! - `AiProvider`: Provider selection and API key lookup
//! - `AiEnhancedScraper`: Scrapes pages and analyzes the successful ones
//!
//! ## Example
//!
//! ```rust,no_run
//! use rig::providers::gemini;
//! use scrapekit::analysis::{AiProvider, CompletionSummarizer, Summarizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AiProvider::Gemini;
//!     let client = gemini::Client::new(&provider.api_key_from_env()?);
//!     let summarizer = CompletionSummarizer::new(client.completion_model(provider.default_model()));
//!
//!     let summary = summarizer.summarize("Rust is a systems programming language.").await?;
//!     println!("{}", summary.text);
//!     Ok(())
//! }
//! ```

mod analyzer;
mod enhanced;
mod error;
#[cfg(test)]
mod mock_model;
mod provider;
mod summarizer;
mod throttle;

pub use analyzer::{
    AnalysisReport, CATEGORIES, CompletionAnalyzer, ContentAnalyzer, Entities, Sentiment,
    UNKNOWN_CATEGORY, UNKNOWN_LANGUAGE,
};
pub use enhanced::{AiEnhancedScraper, EnhancedResult};
pub use error::AnalysisError;
pub use provider::AiProvider;
pub use summarizer::{
    CompletionSummarizer, DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_WORDS, Summarizer, Summary,
};
pub use throttle::ThrottledModel;
