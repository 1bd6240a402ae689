//! HTML parser for extracting links and the canonical URL
//!
//! Parsing is best-effort: `scraper` builds a tree out of any markup, so malformed
//! HTML degrades to fewer results instead of an error.

use crate::UrlError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Schemes that can never be fetched over HTTP
const SKIPPED_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:", "fax:", "data:", "file:", "ftp:"];

/// Extracts all followable links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` values, resolved against `base_url`
///
/// **Exclude:**
/// - Empty values and fragment-only values (`#section`)
/// - `mailto:`, `javascript:`, `tel:`, `fax:`, `data:`, `file:`, `ftp:` (case-insensitive)
/// - Anything that does not resolve to `http` or `https`
///
/// Fragments are stripped and the result is deduplicated, keeping document order.
///
/// # Example
///
/// ```
/// use sitewave::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a#top">A</a><a href="/a">Again</a><a href="mailto:x@y.z">Mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base), vec!["https://example.com/a".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(link) = element.value().attr("href").and_then(|href| resolve_link(href, base_url)) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves one anchor value, returning None when it should not be followed
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if !matches!(absolute.scheme(), "http" | "https") {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute.to_string())
}

/// Resolves `href` against `base` using standard URI resolution
///
/// # Errors
///
/// Returns `UrlError::Resolve` naming both inputs when `base` is not an absolute URL
/// or `href` cannot be joined onto it.
pub fn resolve_url(href: &str, base: &str) -> Result<String, UrlError> {
    let resolve_error = |reason: String| UrlError::Resolve {
        href: href.to_string(),
        base: base.to_string(),
        reason,
    };

    let base_url = Url::parse(base).map_err(|e| resolve_error(e.to_string()))?;
    let resolved = base_url
        .join(href.trim())
        .map_err(|e| resolve_error(e.to_string()))?;

    Ok(resolved.to_string())
}

/// Returns the page's declared canonical URL
///
/// The first `<link rel="canonical">` element with a non-empty `href` is resolved
/// against `base_url`. Absent, empty, or unresolvable values give `None`.
pub fn get_canonical(html: &str, base_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("link[rel][href]").ok()?;

    let href = document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("canonical"))
        })
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())?;

    base_url.join(href).ok().map(|url| url.to_string())
}
