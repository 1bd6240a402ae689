//! sitemaps.org 0.9 document rendering

use crate::state::{is_valid_lastmod, PageRecord};
use html_escape::encode_quoted_attribute;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// One `<sitemap>` entry of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: String,
}

/// Renders a `<urlset>` document
///
/// `lastmod` is emitted only for values in an accepted W3C date format.
pub fn render_urlset(pages: &[&PageRecord]) -> String {
    let mut xml = String::with_capacity(128 + pages.len() * 100);

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NAMESPACE));

    for page in pages {
        xml.push_str("  <url>\n");
        push_element(&mut xml, "loc", &page.url);
        if let Some(lastmod) = page.last_modified.as_deref().filter(|d| is_valid_lastmod(d)) {
            push_element(&mut xml, "lastmod", lastmod);
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Renders a `<sitemapindex>` document
pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut xml = String::new();

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">\n", SITEMAP_NAMESPACE));

    for entry in entries {
        xml.push_str("  <sitemap>\n");
        push_element(&mut xml, "loc", &entry.loc);
        push_element(&mut xml, "lastmod", &entry.lastmod);
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    xml.push_str("    <");
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&encode_quoted_attribute(value));
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}
