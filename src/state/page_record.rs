/// Page record definitions for the crawl result set
///
/// A `PageRecord` is created the first time a fetch for its canonical URL succeeds
/// and is never mutated after insertion.
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One discovered page, keyed by its canonical URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL (declared `<link rel="canonical">` or the fetched URL)
    pub url: String,

    /// HTTP status code of the fetch that produced this record
    pub status: u16,

    /// Last modification date, `YYYY-MM-DD` when taken from a `Last-Modified` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl PageRecord {
    pub fn new(url: impl Into<String>, status: u16, last_modified: Option<String>) -> Self {
        Self {
            url: url.into(),
            status,
            last_modified,
        }
    }
}

impl fmt::Display for PageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_modified {
            Some(date) => write!(f, "{} [{}] {}", self.url, self.status, date),
            None => write!(f, "{} [{}]", self.url, self.status),
        }
    }
}

/// Parses an HTTP `Last-Modified` header into a `YYYY-MM-DD` date
///
/// HTTP dates (`Sun, 06 Nov 1994 08:49:37 GMT`) and RFC 3339 timestamps are accepted.
/// Returns `None` for anything else; callers record the page without a date.
pub fn parse_last_modified(header: &str) -> Option<String> {
    let header = header.trim();

    DateTime::parse_from_rfc2822(header)
        .or_else(|_| DateTime::parse_from_rfc3339(header))
        .ok()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

/// Checks a `lastmod` value against the W3C date formats sitemaps accept
///
/// Accepted: `YYYY-MM-DD` and full RFC 3339 timestamps.
pub fn is_valid_lastmod(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}
