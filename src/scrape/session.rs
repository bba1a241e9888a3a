//! Scraper sessions: single-page scraping and sequential batches

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::config::ScraperConfig;
use super::error::ScrapeError;
use super::extract::extract_all;
use super::fetch::{build_client, fetch_page};
use super::robots::RobotsGate;
use super::summary::BatchSummary;
use super::urls::normalize_url;
use super::{ExtractOptions, ScrapeRequest, ScrapeResult, Stage};
use crate::error::Result;

/// A configured scraper owning one pooled HTTP client.
///
/// The client (connection pool and cookie jar) and the robots.txt cache are
/// shared by every page scraped through the session. Scraping takes
/// `&mut self`, so a session is never driven from two places at once.
/// Dropping the session releases the transport.
pub struct ScraperSession {
    config: ScraperConfig,
    client: Client,
    robots: RobotsGate,
}

impl ScraperSession {
    /// Build a session from `config`.
    ///
    /// Fails only when the configured headers are not valid HTTP headers or
    /// the TLS backend cannot be initialized.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = build_client(&config)?;
        let robots = RobotsGate::new(config.respect_robots, config.robots_agent());
        info!(
            "Scraper session ready (delay {:?}, timeout {:?}, robots.txt {})",
            config.delay,
            config.timeout,
            if config.respect_robots { "on" } else { "off" }
        );
        Ok(Self {
            config,
            client,
            robots,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape `url` with `options`
    pub async fn scrape_page(&mut self, url: &str, options: &ExtractOptions) -> ScrapeResult {
        let request = ScrapeRequest::new(url).with_options(options.clone());
        self.scrape(&request).await
    }

    /// Scrape a single page.
    ///
    /// Never fails: every error is recorded on the returned result.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn scrape(&mut self, request: &ScrapeRequest) -> ScrapeResult {
        let mut stage = Stage::Pending;
        let result = match self.run_pipeline(request, &mut stage).await {
            Ok(result) => {
                info!(
                    "Scraped {} ({} links, {} images)",
                    result.url,
                    result.links.len(),
                    result.images.len()
                );
                result
            }
            Err((url, err)) => {
                warn!(stage = %stage, "Scraping {} failed: {}", url, err);
                ScrapeResult::failed(url, &err)
            }
        };
        advance(&mut stage, Stage::Done);
        result
    }

    async fn run_pipeline(
        &mut self,
        request: &ScrapeRequest,
        stage: &mut Stage,
    ) -> std::result::Result<ScrapeResult, (String, ScrapeError)> {
        advance(stage, Stage::Normalizing);
        let normalized =
            normalize_url(&request.url).map_err(|e| (request.url.trim().to_string(), e))?;
        let parsed = Url::parse(&normalized)
            .map_err(|e| (normalized.clone(), ScrapeError::InvalidUrl(e.to_string())))?;

        advance(stage, Stage::RobotsCheck);
        if !self.robots.is_allowed(&self.client, &parsed).await {
            return Err((normalized, ScrapeError::RobotsBlocked));
        }

        advance(stage, Stage::Fetching);
        let page = fetch_page(&self.client, &parsed, &request.headers)
            .await
            .map_err(|e| (normalized.clone(), e))?;
        if !page.status.is_success() {
            return Err((normalized, ScrapeError::Http {
                status: page.status,
            }));
        }

        advance(stage, Stage::Extracting);
        let extracted = extract_all(&page.body, Some(&page.final_url), &request.options);

        Ok(ScrapeResult {
            url: normalized,
            status_code: Some(page.status.as_u16()),
            title: extracted.title,
            text_content: extracted.text_content,
            links: extracted.links,
            images: extracted.images,
            metadata: extracted.metadata,
            error: None,
        })
    }

    /// Scrape `urls` in order with the same options.
    ///
    /// Returns one result per input, in input order.
    pub async fn scrape_many<S: AsRef<str>>(
        &mut self,
        urls: &[S],
        options: &ExtractOptions,
    ) -> Vec<ScrapeResult> {
        self.scrape_many_with(urls, options, |_, _| {}).await
    }

    /// Like [`scrape_many`](Self::scrape_many), calling `on_result` with each
    /// item's index and result as soon as it is done.
    pub async fn scrape_many_with<S, F>(
        &mut self,
        urls: &[S],
        options: &ExtractOptions,
        on_result: F,
    ) -> Vec<ScrapeResult>
    where
        S: AsRef<str>,
        F: FnMut(usize, &ScrapeResult),
    {
        let requests: Vec<ScrapeRequest> = urls
            .iter()
            .map(|url| ScrapeRequest::new(url.as_ref()).with_options(options.clone()))
            .collect();
        self.scrape_batch(&requests, on_result).await
    }

    /// Scrape `requests` one at a time, pausing for the configured delay
    /// between consecutive items.
    ///
    /// A failing item never stops the batch; the output has exactly one
    /// result per request, in request order.
    #[instrument(skip_all, fields(pages = requests.len()))]
    pub async fn scrape_batch<F>(
        &mut self,
        requests: &[ScrapeRequest],
        mut on_result: F,
    ) -> Vec<ScrapeResult>
    where
        F: FnMut(usize, &ScrapeResult),
    {
        info!("Starting to scrape {} pages", requests.len());
        let mut results = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            if index > 0 && !self.config.delay.is_zero() {
                debug!("Waiting {:?} before the next request", self.config.delay);
                sleep(self.config.delay).await;
            }

            info!(
                "Scraping page {}/{}: {}",
                index + 1,
                requests.len(),
                request.url
            );
            let result = self.scrape(request).await;
            on_result(index, &result);
            results.push(result);
        }

        let summary = BatchSummary::from_results(&results);
        info!(
            "Completed scraping {} pages ({} succeeded, {} failed)",
            summary.total,
            summary.succeeded,
            summary.failed()
        );
        results
    }

    /// Release the session's transport
    pub fn close(self) {
        debug!("Scraper session closed");
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::{Duration, Instant};

    const HTML: &str = r#"<html><head><title>Mock</title>
        <meta name="description" content="mock page"></head>
        <body><p>Hello from the mock</p><a href="/next">Next</a>
        <img src="/logo.png" alt="Logo"></body></html>"#;

    fn config() -> ScraperConfig {
        ScraperConfig::builder()
            .delay(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .respect_robots(false)
            .build()
    }

    async fn page(server: &mut mockito::ServerGuard, path: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(HTML)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_scrape_page_success() {
        let mut server = Server::new_async().await;
        let mock = page(&mut server, "/").await;

        let mut session = ScraperSession::new(config()).unwrap();
        let url = format!("{}/", server.url());
        let result = session.scrape_page(&url, &ExtractOptions::default()).await;

        assert!(result.is_success(), "unexpected error: {:?}", result.error);
        assert_eq!(result.url, url);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.title.as_deref(), Some("Mock"));
        assert!(result.text_content.unwrap().contains("Hello from the mock"));
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].url, format!("{}/next", server.url()));
        assert_eq!(result.images[0].alt_text, "Logo");
        assert_eq!(result.metadata.get("description").unwrap(), "mock page");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_url_skips_robots_and_fetch() {
        let mut server = Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nAllow: /")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body(HTML)
            .expect(1)
            .create_async()
            .await;

        let mut session = ScraperSession::new(
            ScraperConfig::builder()
                .delay(Duration::ZERO)
                .respect_robots(true)
                .build(),
        )
        .unwrap();
        let urls = [String::new(), format!("{}/ok", server.url())];
        let results = session.scrape_many(&urls, &ExtractOptions::default()).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].error.as_deref().unwrap().starts_with("Invalid URL"));
        assert_eq!(results[0].status_code, None);
        assert!(results[1].is_success(), "unexpected error: {:?}", results[1].error);

        // only the valid item reached the server
        robots.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_soft_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(410)
            .with_body(HTML)
            .create_async()
            .await;

        let mut session = ScraperSession::new(config()).unwrap();
        let result = session
            .scrape_page(&format!("{}/gone", server.url()), &ExtractOptions::default())
            .await;

        assert_eq!(result.status_code, Some(410));
        assert_eq!(result.error.as_deref(), Some("HTTP error: 410 Gone"));
        assert!(result.text_content.is_none());
        assert!(result.links.is_empty());
        assert!(result.is_soft_failure());
    }

    #[tokio::test]
    async fn test_robots_disallow_blocks_fetch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /private/\n")
            .create_async()
            .await;
        let private = server
            .mock("GET", "/private/page")
            .expect(0)
            .create_async()
            .await;
        let public = page(&mut server, "/public/page").await;

        let mut session = ScraperSession::new(
            ScraperConfig::builder()
                .delay(Duration::ZERO)
                .respect_robots(true)
                .build(),
        )
        .unwrap();
        let options = ExtractOptions::default();

        let blocked = session
            .scrape_page(&format!("{}/private/page", server.url()), &options)
            .await;
        assert_eq!(blocked.error.as_deref(), Some("Blocked by robots.txt"));
        assert_eq!(blocked.status_code, None);

        let allowed = session
            .scrape_page(&format!("{}/public/page", server.url()), &options)
            .await;
        assert!(allowed.is_success());

        private.assert_async().await;
        public.assert_async().await;
    }

    #[tokio::test]
    async fn test_robots_failure_permits_fetch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/robots.txt")
            .with_status(500)
            .create_async()
            .await;
        let target = page(&mut server, "/private/page").await;

        let mut session = ScraperSession::new(
            ScraperConfig::builder()
                .delay(Duration::ZERO)
                .respect_robots(true)
                .build(),
        )
        .unwrap();
        let result = session
            .scrape_page(
                &format!("{}/private/page", server.url()),
                &ExtractOptions::default(),
            )
            .await;

        assert!(result.is_success());
        target.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let mut server = Server::new_async().await;
        page(&mut server, "/a").await;
        page(&mut server, "/b").await;

        let urls = vec![
            format!("{}/a", server.url()),
            "http://127.0.0.1:1/unreachable".to_string(),
            format!("{}/b", server.url()),
        ];
        let mut session = ScraperSession::new(config()).unwrap();
        let mut seen = Vec::new();
        let results = session
            .scrape_many_with(&urls, &ExtractOptions::default(), |index, _| {
                seen.push(index)
            })
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(seen, vec![0, 1, 2]);
        for (url, result) in urls.iter().zip(&results) {
            assert_eq!(&result.url, url);
        }
        assert_eq!(results.iter().filter(|r| r.error.is_some()).count(), 1);
        assert_eq!(results[1].error.as_deref(), Some("Connection error"));
        assert_eq!(results[1].status_code, None);
        assert!(results[0].text_content.as_deref().unwrap().contains("Hello"));
        assert!(results[2].text_content.as_deref().unwrap().contains("Hello"));
    }

    #[tokio::test]
    async fn test_batch_with_invalid_inputs_keeps_length() {
        let mut server = Server::new_async().await;
        page(&mut server, "/ok").await;

        let urls = ["", format!("{}/ok", server.url()).as_str(), "ftp://nope"]
            .map(String::from);
        let mut session = ScraperSession::new(config()).unwrap();
        let results = session.scrape_many(&urls, &ExtractOptions::default()).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].error.is_some());
        assert!(results[1].is_success());
        assert_eq!(results[2].url, "ftp://nope");
        assert!(results[2].error.is_some());
    }

    #[tokio::test]
    async fn test_delay_between_batch_items() {
        let mut server = Server::new_async().await;
        page(&mut server, "/1").await;
        page(&mut server, "/2").await;
        page(&mut server, "/3").await;

        let config = ScraperConfig::builder()
            .delay(Duration::from_millis(200))
            .respect_robots(false)
            .build();
        let mut session = ScraperSession::new(config).unwrap();
        let urls: Vec<String> = ["/1", "/2", "/3"]
            .iter()
            .map(|path| format!("{}{}", server.url(), path))
            .collect();

        let started = Instant::now();
        let results = session.scrape_many(&urls, &ExtractOptions::default()).await;

        assert!(started.elapsed() >= Duration::from_millis(400));
        assert!(results.iter().all(ScrapeResult::is_success));
    }

    #[tokio::test]
    async fn test_per_request_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/secure")
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_body(HTML)
            .create_async()
            .await;

        let mut session = ScraperSession::new(config()).unwrap();
        let request = ScrapeRequest::new(format!("{}/secure", server.url()))
            .with_header("Authorization", "Bearer t0ken");
        let result = session.scrape(&request).await;

        assert!(result.is_success());
        mock.assert_async().await;
        session.close();
    }
}
