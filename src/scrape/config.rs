//! # Scraper Configuration Module
//!
//! Session-wide settings for the scraper: the politeness delay between batch
//! items, the per-request timeout, robots.txt compliance, the user agent and
//! default headers. Settings are fixed once a
//! [`ScraperSession`](super::ScraperSession) is built from them.
//!
//! ## Key Components
//!
//! - `ScraperConfig`: The configuration struct
//! - `ScraperConfigBuilder`: Builder pattern implementation for easier configuration

use std::collections::BTreeMap;
use std::time::Duration;

/// Default delay between consecutive requests of a batch
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a scraper session
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Fixed pause before every batch request except the first
    pub delay: Duration,

    /// Upper bound for a single request, robots.txt fetches included
    pub timeout: Duration,

    /// Whether to consult robots.txt before fetching
    pub respect_robots: bool,

    /// User agent sent with every request
    pub user_agent: String,

    /// Headers sent with every request, merged over the built-in defaults
    pub headers: BTreeMap<String, String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            respect_robots: true,
            user_agent: format!("scrapekit/{}", env!("CARGO_PKG_VERSION")),
            headers: default_headers(),
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
    ])
}

/// Builder for ScraperConfig
#[derive(Debug, Default)]
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl ScraperConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ScraperConfig::default(),
        }
    }

    /// Set the delay between batch requests
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set whether to respect robots.txt
    pub fn respect_robots(mut self, respect_robots: bool) -> Self {
        self.config.respect_robots = respect_robots;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a header, replacing any default with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config
            .headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.config.headers.insert(name, value.into());
        self
    }

    /// Add several headers at once
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Build the configuration
    pub fn build(self) -> ScraperConfig {
        self.config
    }
}

impl ScraperConfig {
    /// Create a new builder
    pub fn builder() -> ScraperConfigBuilder {
        ScraperConfigBuilder::new()
    }

    /// The product token robots.txt groups are matched against.
    ///
    /// `scrapekit/0.1.0 (+https://example.com)` matches `User-agent: scrapekit`.
    pub fn robots_agent(&self) -> &str {
        let token = self
            .user_agent
            .split(['/', ' '])
            .next()
            .unwrap_or_default()
            .trim();
        if token.is_empty() { "*" } else { token }
    }
}
