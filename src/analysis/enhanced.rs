//! Scraping with an LLM analysis of each page

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{AnalysisReport, ContentAnalyzer};
use crate::scrape::{ScrapeRequest, ScrapeResult, ScraperSession};

/// A scrape result with its analysis.
///
/// `analysis` is set only for successful pages with text; when analysis was
/// attempted and failed outright, `analysis_error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedResult {
    pub scrape: ScrapeResult,
    pub analysis: Option<AnalysisReport>,
    pub analysis_error: Option<String>,
}

/// A [`ScraperSession`] paired with a [`ContentAnalyzer`]
pub struct AiEnhancedScraper<A: ContentAnalyzer> {
    session: ScraperSession,
    analyzer: A,
}

impl<A: ContentAnalyzer> AiEnhancedScraper<A> {
    pub fn new(session: ScraperSession, analyzer: A) -> Self {
        Self { session, analyzer }
    }

    pub fn session(&self) -> &ScraperSession {
        &self.session
    }

    /// Scrape one page and analyze it
    pub async fn scrape(&mut self, request: &ScrapeRequest) -> EnhancedResult {
        let result = self.session.scrape(request).await;
        self.analyze(result).await
    }

    /// Scrape `requests` as a batch, then analyze every successful page in
    /// request order. `on_result` sees each scrape result as it completes.
    #[instrument(skip_all, fields(pages = requests.len()))]
    pub async fn scrape_batch<F>(
        &mut self,
        requests: &[ScrapeRequest],
        on_result: F,
    ) -> Vec<EnhancedResult>
    where
        F: FnMut(usize, &ScrapeResult),
    {
        let results = self.session.scrape_batch(requests, on_result).await;
        let mut enhanced = Vec::with_capacity(results.len());
        for result in results {
            enhanced.push(self.analyze(result).await);
        }
        info!(
            "Analyzed {} of {} pages",
            enhanced.iter().filter(|r| r.analysis.is_some()).count(),
            enhanced.len()
        );
        enhanced
    }

    async fn analyze(&self, scrape: ScrapeResult) -> EnhancedResult {
        let title = scrape.title.as_deref().unwrap_or_default();
        let outcome = match scrape.text_content.as_deref() {
            Some(text) if scrape.is_success() && !text.trim().is_empty() => {
                Some(self.analyzer.analyze(title, text).await)
            }
            _ => None,
        };

        match outcome {
            Some(Ok(report)) => EnhancedResult {
                scrape,
                analysis: Some(report),
                analysis_error: None,
            },
            Some(Err(e)) => {
                warn!("Failed to analyze {}: {}", scrape.url, e);
                EnhancedResult {
                    scrape,
                    analysis: None,
                    analysis_error: Some(e.to_string()),
                }
            }
            None => EnhancedResult {
                scrape,
                analysis: None,
                analysis_error: None,
            },
        }
    }

    pub fn into_parts(self) -> (ScraperSession, A) {
        (self.session, self.analyzer)
    }
}
