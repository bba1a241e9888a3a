//! URL normalization and classification helpers

use url::Url;

use super::Link;
use super::error::ScrapeError;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt"];

/// Coerce a raw URL string into an absolute http(s) URL.
///
/// Inputs without a scheme get `https://` prepended. The returned string is
/// the candidate itself rather than the re-serialized [`Url`], which keeps the
/// function idempotent (`https://example.com` does not gain a trailing slash).
pub fn normalize_url(raw: &str) -> Result<String, ScrapeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidUrl("empty URL".to_string()));
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        return Err(ScrapeError::InvalidUrl(format!(
            "unsupported scheme in {}",
            trimmed
        )));
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(candidate),
        _ => Err(ScrapeError::InvalidUrl(format!("{}: missing host", trimmed))),
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Host (with port, if any) of a URL; empty when the URL has none
pub fn extract_domain(url: &str) -> String {
    normalize_url(url)
        .ok()
        .and_then(|normalized| Url::parse(&normalized).ok())
        .map(|parsed| authority(&parsed))
        .unwrap_or_default()
}

fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Lowercased extension of the last path segment, if any
pub fn file_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

pub fn is_image_url(url: &str) -> bool {
    file_extension(url).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_document_url(url: &str) -> bool {
    file_extension(url).is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a link stays on `base_domain`. Relative links count as internal.
pub fn is_internal_link(link: &Link, base_domain: &str) -> bool {
    match Url::parse(&link.url) {
        Ok(parsed) => parsed.has_host() && authority(&parsed) == base_domain,
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Whether a link points at a different host than `base_domain`
pub fn is_external_link(link: &Link, base_domain: &str) -> bool {
    match Url::parse(&link.url) {
        Ok(parsed) => parsed.has_host() && authority(&parsed) != base_domain,
        Err(_) => false,
    }
}

/// Links that stay on `base_domain`, relative links included
pub fn filter_internal_links<'a>(links: &'a [Link], base_domain: &str) -> Vec<&'a Link> {
    links
        .iter()
        .filter(|link| !link.url.is_empty() && is_internal_link(link, base_domain))
        .collect()
}

/// Links that leave `base_domain`
pub fn filter_external_links<'a>(links: &'a [Link], base_domain: &str) -> Vec<&'a Link> {
    links
        .iter()
        .filter(|link| is_external_link(link, base_domain))
        .collect()
}
