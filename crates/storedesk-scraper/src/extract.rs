//! Typed content extraction with explicit fallback chains.
//!
//! Every extractor works on an already parsed document. `scraper::Html` is
//! not `Send`, so callers parse and extract inside one synchronous call and
//! never hold the document across an `.await`.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{ContentMeta, Platform, ScrapedContent};

pub const STATIC_BODY_TEXT_LIMIT: usize = 10_000;
pub const BROWSER_BODY_TEXT_LIMIT: usize = 15_000;
pub const RAW_HTML_LIMIT: usize = 50_000;
pub const MAX_IMAGES: usize = 20;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

static NON_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| selector("script, style, noscript, iframe"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static META_KEYWORDS: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[name="keywords"]"#));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:title"]"#));
static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:description"]"#));
static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:image"]"#));

/// Parse a document and drop `script`, `style`, `noscript` and `iframe`.
#[must_use]
pub fn parse_and_strip(html: &str) -> Html {
    let mut doc = Html::parse_document(html);
    let ids: Vec<_> = doc.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    doc
}

/// Build normalized content from a fetched page.
#[must_use]
pub fn extract_content(
    html: &str,
    canonical_url: &str,
    platform: Platform,
    body_limit: usize,
) -> ScrapedContent {
    let doc = parse_and_strip(html);
    let base = Url::parse(canonical_url).ok();

    ScrapedContent {
        url: canonical_url.to_string(),
        platform,
        title: extract_title(&doc),
        description: extract_description(&doc),
        images: extract_images(&doc, base.as_ref()),
        body_text: extract_body_text(&doc, body_limit),
        raw_html: truncate_chars(&doc.html(), RAW_HTML_LIMIT),
        meta: extract_meta(&doc),
        screenshot: None,
    }
}

/// `<title>`, then `og:title`, then the first `<h1>`.
#[must_use]
pub fn extract_title(doc: &Html) -> Option<String> {
    first_text(doc, &TITLE)
        .or_else(|| meta_content(doc, &OG_TITLE))
        .or_else(|| first_text(doc, &H1))
}

/// `meta[name=description]`, then `og:description`.
#[must_use]
pub fn extract_description(doc: &Html) -> Option<String> {
    meta_content(doc, &META_DESCRIPTION).or_else(|| meta_content(doc, &OG_DESCRIPTION))
}

/// Image URLs in document order: `src`, falling back to `data-src`.
///
/// Relative URLs are resolved against `base`; only http(s) URLs survive.
#[must_use]
pub fn extract_images(doc: &Html, base: Option<&Url>) -> Vec<String> {
    let candidates = doc.select(&IMG).filter_map(|img| {
        let attrs = img.value();
        attrs
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| attrs.attr("data-src"))
            .map(str::to_string)
    });
    filter_image_urls(candidates, base)
}

/// Whitespace-collapsed visible text of `<body>`, capped at `limit` chars.
#[must_use]
pub fn extract_body_text(doc: &Html, limit: usize) -> String {
    let root = doc
        .select(&BODY)
        .next()
        .unwrap_or_else(|| doc.root_element());
    let text = root.text().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapse_whitespace(&text), limit)
}

#[must_use]
pub fn extract_keywords(doc: &Html) -> Vec<String> {
    meta_content(doc, &META_KEYWORDS)
        .map(|raw| split_keywords(&raw))
        .unwrap_or_default()
}

#[must_use]
pub fn extract_meta(doc: &Html) -> ContentMeta {
    ContentMeta {
        keywords: extract_keywords(doc),
        og_image: meta_content(doc, &OG_IMAGE),
        og_title: meta_content(doc, &OG_TITLE),
        og_description: meta_content(doc, &OG_DESCRIPTION),
    }
}

// ---------------------------------------------------------------------------
// Shared normalization, also applied to in-browser snapshots
// ---------------------------------------------------------------------------

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Drop `data:` URIs and non-http(s) URLs, dedupe, and cap at [`MAX_IMAGES`].
pub fn filter_image_urls<I>(candidates: I, base: Option<&Url>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with("data:") {
                return None;
            }
            let resolved = match base {
                Some(base) => base.join(raw).ok()?,
                None => Url::parse(raw).ok()?,
            };
            matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
        })
        .filter(|url| seen.insert(url.clone()))
        .take(MAX_IMAGES)
        .collect()
}

/// Comma-split keyword list, trimmed and deduplicated in order.
#[must_use]
pub fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel).next().map(element_text).filter(|t| !t.is_empty())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
