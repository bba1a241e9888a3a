//! Aggregation over scrape results.
//!
//! Everything here is derived from a slice of results alone, so any caller can
//! summarize a batch after the fact without re-running it.

use serde::Serialize;
use std::fmt::Write as _;

use super::urls::{filter_external_links, filter_internal_links, is_document_url, is_image_url};
use super::{Link, ScrapeResult};

/// Counts over a batch of results.
///
/// A result counts as succeeded when it has no error and a 2xx status (see
/// [`ScrapeResult::is_success`]); everything else is a failure, split into
/// soft failures (the server answered) and unreachable pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub soft_failures: usize,
    pub unreachable: usize,
    pub total_links: usize,
    pub total_images: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ScrapeResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            if result.is_success() {
                summary.succeeded += 1;
            } else if result.status_code.is_some() {
                summary.soft_failures += 1;
            } else {
                summary.unreachable += 1;
            }
            summary.total_links += result.links.len();
            summary.total_images += result.images.len();
            summary
        })
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Share of successful results in percent; 0 for an empty batch
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 * 100.0 / self.total as f64
        }
    }
}

/// Render a plain-text report of a batch
pub fn format_summary(results: &[ScrapeResult]) -> String {
    if results.is_empty() {
        return "No scraping results to summarize.".to_string();
    }

    let summary = BatchSummary::from_results(results);
    let mut report = String::new();
    let _ = writeln!(report, "Scraping Summary");
    let _ = writeln!(report, "================");
    let _ = writeln!(report, "Total pages processed: {}", summary.total);
    let _ = writeln!(report, "Successful: {}", summary.succeeded);
    let _ = writeln!(report, "Failed: {}", summary.failed());
    let _ = writeln!(report, "Success rate: {:.1}%", summary.success_rate());
    let _ = writeln!(report, "Links found: {}", summary.total_links);
    let _ = writeln!(report);

    for result in results {
        let mark = if result.is_success() { '✓' } else { '✗' };
        match &result.error {
            Some(error) => {
                let _ = writeln!(report, "{} {} ({})", mark, result.url, error);
            }
            None => {
                let _ = writeln!(report, "{} {}", mark, result.url);
            }
        }
    }
    report
}

/// Links of a page grouped by where they point
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sitemap {
    pub domain: String,
    pub total_links: usize,
    pub internal_links: Vec<Link>,
    pub external_links: Vec<Link>,
    pub image_links: Vec<Link>,
    pub document_links: Vec<Link>,
    pub other_links: Vec<Link>,
}

impl Sitemap {
    /// Categorize `links` relative to `base_domain`.
    ///
    /// Links without a host that are not relative paths (`mailto:` and the
    /// like) are neither internal nor external. Every non-empty link lands in
    /// exactly one of image/document/other.
    pub fn from_links(links: &[Link], base_domain: &str) -> Self {
        let mut sitemap = Self {
            domain: base_domain.to_string(),
            total_links: links.len(),
            internal_links: filter_internal_links(links, base_domain)
                .into_iter()
                .cloned()
                .collect(),
            external_links: filter_external_links(links, base_domain)
                .into_iter()
                .cloned()
                .collect(),
            ..Self::default()
        };

        for link in links.iter().filter(|link| !link.url.is_empty()) {
            if is_image_url(&link.url) {
                sitemap.image_links.push(link.clone());
            } else if is_document_url(&link.url) {
                sitemap.document_links.push(link.clone());
            } else {
                sitemap.other_links.push(link.clone());
            }
        }
        sitemap
    }
}
