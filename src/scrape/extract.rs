//! Content extraction functionality for the scraper module
//!
//! Every extractor works on an already parsed [`Html`] document and is
//! independent of the others, so a failure in one field leaves the rest intact.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;
use url::Url;

use super::error::ScrapeError;
use super::{ExtractOptions, Image, Link};

/// Elements whose text never counts as page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Meta names/properties copied into the metadata map verbatim
const META_KEYS: &[&str] = &["description", "keywords", "author"];

/// Meta name/property prefixes copied into the metadata map
const META_PREFIXES: &[&str] = &["og:", "twitter:"];

/// Fields extracted from one document
#[derive(Debug, Default, Clone)]
pub struct Extracted {
    pub title: Option<String>,
    pub text_content: Option<String>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub metadata: BTreeMap<String, String>,
}

/// Run the extractors selected in `options` over `html`.
///
/// `base` is used to resolve relative link and image URLs. A failing
/// extractor is logged and its field left at the empty default.
pub fn extract_all(html: &str, base: Option<&Url>, options: &ExtractOptions) -> Extracted {
    let document = Html::parse_document(html);
    let mut extracted = Extracted::default();

    if options.text {
        let text = extract_text(&document, options.selector.as_deref());
        extracted.text_content = Some(degrade("text", text));
    }

    if options.links {
        extracted.links = degrade("links", extract_links(&document, base));
    }

    if options.images {
        extracted.images = degrade("images", extract_images(&document, base));
    }

    if options.metadata {
        extracted.title = degrade("title", extract_title(&document));
        extracted.metadata = degrade("metadata", extract_metadata(&document));
        if let Some(title) = &extracted.title {
            extracted
                .metadata
                .entry("title".to_string())
                .or_insert_with(|| title.clone());
        }
    }

    extracted
}

fn degrade<T: Default>(field: &str, result: Result<T, ScrapeError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Extraction of {} failed: {}", field, e);
        T::default()
    })
}

fn selector(field: &'static str, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse {
        field,
        message: format!("selector {:?}: {:?}", css, e),
    })
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text under `root`, skipping script-like elements
fn element_text(root: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in root.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                matches!(
                    ancestor.value(),
                    Node::Element(element) if SKIPPED_ELEMENTS.contains(&element.name())
                )
            });
            if !hidden {
                parts.push(&**text);
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Extract the readable text of a document.
///
/// With `scope`, only subtrees matching that CSS selector contribute; a
/// selector that matches nothing yields an empty string.
pub fn extract_text(document: &Html, scope: Option<&str>) -> Result<String, ScrapeError> {
    match scope {
        Some(css) => {
            let scope = selector("text", css)?;
            let texts: Vec<String> = document
                .select(&scope)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            Ok(texts.join(" "))
        }
        None => Ok(element_text(document.root_element())),
    }
}

fn resolve(base: Option<&Url>, reference: &str) -> String {
    match base {
        Some(base) => base
            .join(reference)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| reference.to_string()),
        None => reference.to_string(),
    }
}

fn non_empty_attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Extract all anchors that carry an `href`, in document order.
///
/// An empty `href` refers to the page itself and resolves to `base`.
pub fn extract_links(document: &Html, base: Option<&Url>) -> Result<Vec<Link>, ScrapeError> {
    let anchors = selector("links", "a")?;
    let links = document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            Some(Link {
                url: resolve(base, href),
                anchor_text: collapse_whitespace(&anchor.text().collect::<String>()),
                title: non_empty_attr(&anchor, "title"),
            })
        })
        .collect();
    Ok(links)
}

/// Extract all images that carry a `src`, in document order
pub fn extract_images(document: &Html, base: Option<&Url>) -> Result<Vec<Image>, ScrapeError> {
    let images = selector("images", "img")?;
    let images = document
        .select(&images)
        .filter_map(|image| {
            let src = non_empty_attr(&image, "src")?;
            Some(Image {
                src: resolve(base, &src),
                alt_text: image.value().attr("alt").unwrap_or_default().trim().to_string(),
                title: non_empty_attr(&image, "title"),
            })
        })
        .collect();
    Ok(images)
}

/// Extract the trimmed text of the first `title` element
pub fn extract_title(document: &Html) -> Result<Option<String>, ScrapeError> {
    let title = selector("title", "title")?;
    Ok(document
        .select(&title)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty()))
}

fn is_recognized_meta(key: &str) -> bool {
    META_KEYS.contains(&key) || META_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Extract recognized meta tags and the canonical link.
///
/// Keys are the lowercased `name` or `property` attribute. Unrecognized tags
/// and tags with an empty `content` are ignored.
pub fn extract_metadata(document: &Html) -> Result<BTreeMap<String, String>, ScrapeError> {
    let meta = selector("metadata", "meta")?;
    let mut metadata = BTreeMap::new();

    for element in document.select(&meta) {
        let key = element
            .value()
            .attr("name")
            .or_else(|| element.value().attr("property"))
            .map(|key| key.trim().to_ascii_lowercase());
        let Some(key) = key.filter(|key| is_recognized_meta(key)) else {
            continue;
        };
        if let Some(content) = non_empty_attr(&element, "content") {
            metadata.entry(key).or_insert(content);
        }
    }

    let canonical = selector("metadata", "link[rel='canonical']")?;
    if let Some(href) = document
        .select(&canonical)
        .next()
        .and_then(|element| non_empty_attr(&element, "href"))
    {
        metadata.insert("canonical_url".to_string(), href);
    }

    Ok(metadata)
}
