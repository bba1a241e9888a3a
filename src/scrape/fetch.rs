//! HTTP transport for the scraper: client construction and single-page GETs

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::config::ScraperConfig;
use super::error::ScrapeError;
use crate::error::{Error, Result};

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub status: StatusCode,
    pub body: String,
}

/// Build the pooled client shared by every request of a session.
///
/// Cookies persist across requests and the configured headers are installed
/// as defaults.
pub fn build_client(config: &ScraperConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidConfig(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidConfig(format!("header {}: {}", name, e)))?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .timeout(config.timeout)
        .build()?;
    Ok(client)
}

/// Perform exactly one GET for `url`.
///
/// Any response is returned as a [`FetchedPage`], including 4xx/5xx; only
/// failures to complete the exchange become errors.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    extra_headers: &BTreeMap<String, String>,
) -> std::result::Result<FetchedPage, ScrapeError> {
    let mut request = client.get(url.clone());
    for (name, value) in extra_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => request = request.header(name, value),
            _ => warn!("Skipping invalid header {:?}", name),
        }
    }

    let response = request.send().await.map_err(|e| {
        warn!("Request to {} failed: {}", url, e);
        ScrapeError::from(&e)
    })?;

    let status = response.status();
    let final_url = response.url().clone();
    debug!("{} answered {}", url, status);

    let body = response.text().await.map_err(|e| {
        warn!("Reading body of {} failed: {}", url, e);
        ScrapeError::from(&e)
    })?;

    Ok(FetchedPage {
        final_url,
        status,
        body,
    })
}
