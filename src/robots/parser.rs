//! Robots.txt parser and rule matcher
//!
//! Rules from every applicable `User-agent` group are merged into two lists, Allow and
//! Disallow, each sorted longest pattern first. A query checks the Allow list first and
//! the Disallow list second; the first match in either list decides.
//!
//! This precedence differs from the "single longest match across both lists"
//! convention used by some search engines: an Allow rule wins over a longer Disallow rule.
//!
//! Group handling also differs from crawlers that reset applicability on every
//! `User-agent` line: consecutive `User-agent` lines form one group, so
//! `User-agent: *` followed by `User-agent: OtherBot` and `Disallow: /x` still
//! blocks `/x` for every crawler.
//!
//! Patterns are percent-encoded the way the `url` crate encodes paths, so
//! `Disallow: /café` matches the `/caf%C3%A9` path of a parsed URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// Characters the `url` crate escapes in a path, plus every non-ASCII byte
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Allow/Disallow rules that apply to one crawler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRuleSet {
    /// Allow patterns, longest first
    allows: Vec<String>,
    /// Disallow patterns, longest first
    disallows: Vec<String>,
}

impl RobotsRuleSet {
    /// Creates an empty rule set that allows everything
    ///
    /// This is the fallback when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses robots.txt content for the given crawler name
    ///
    /// # Parsing Rules
    ///
    /// - `#` starts a comment that runs to the end of the line
    /// - Lines without a `field: value` shape are skipped
    /// - Consecutive `User-agent` lines form one group; the group applies when any of its
    ///   tokens is `*` or equals `agent_name` (case-insensitive, whole token)
    /// - Non-empty `Allow`/`Disallow` values inside an applicable group are collected
    /// - Unknown fields (`Crawl-delay`, `Sitemap`, ...) are ignored
    pub fn parse(content: &str, agent_name: &str) -> Self {
        let agent_name = agent_name.trim().to_lowercase();
        let mut rules = Self::default();

        let mut group_applies = false;
        // True while we are still reading the User-agent lines of one group
        let mut in_agent_lines = false;

        for raw_line in content.lines() {
            let line = match raw_line.find('#') {
                Some(idx) => &raw_line[..idx],
                None => raw_line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        group_applies = false;
                        in_agent_lines = true;
                    }
                    let token = value.to_lowercase();
                    if token == "*" || (!token.is_empty() && token == agent_name) {
                        group_applies = true;
                    }
                }
                "allow" => {
                    in_agent_lines = false;
                    if group_applies && !value.is_empty() {
                        rules.allows.push(encode_path(value));
                    }
                }
                "disallow" => {
                    in_agent_lines = false;
                    if group_applies && !value.is_empty() {
                        rules.disallows.push(encode_path(value));
                    }
                }
                _ => {
                    in_agent_lines = false;
                }
            }
        }

        // Stable sort keeps file order among equal-length patterns
        rules.allows.sort_by(|a, b| b.len().cmp(&a.len()));
        rules.disallows.sort_by(|a, b| b.len().cmp(&a.len()));

        rules
    }

    /// Returns true when no rules were collected
    pub fn is_empty(&self) -> bool {
        self.allows.is_empty() && self.disallows.is_empty()
    }

    /// Allow patterns, longest first
    pub fn allows(&self) -> &[String] {
        &self.allows
    }

    /// Disallow patterns, longest first
    pub fn disallows(&self) -> &[String] {
        &self.disallows
    }

    /// Checks whether a URL may be crawled
    ///
    /// Accepts an absolute URL (its path plus `?query` is matched) or a bare path
    /// starting with `/`. Anything else that cannot be parsed is allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitewave::robots::RobotsRuleSet;
    ///
    /// let rules = RobotsRuleSet::parse("User-agent: *\nDisallow: /a/\nAllow: /a/b/", "sitewave");
    /// assert!(rules.is_allowed("https://example.com/a/b/c"));
    /// assert!(!rules.is_allowed("/a/x"));
    /// ```
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        match Url::parse(url) {
            Ok(parsed) => {
                let mut path = parsed.path().to_string();
                if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
                    path.push('?');
                    path.push_str(query);
                }
                self.is_path_allowed(&path)
            }
            Err(_) if url.starts_with('/') => self.is_path_allowed(&encode_path(url)),
            Err(_) => true,
        }
    }

    /// Checks a path (with optional `?query`) against the rule lists
    pub fn is_path_allowed(&self, path: &str) -> bool {
        if self.allows.iter().any(|rule| matches_rule(path, rule)) {
            return true;
        }

        !self.disallows.iter().any(|rule| matches_rule(path, rule))
    }
}

fn encode_path(value: &str) -> String {
    utf8_percent_encode(value, PATH_ENCODE_SET).to_string()
}

/// Checks if a path matches a robots.txt pattern
///
/// - Matching starts at the beginning of the path (prefix match)
/// - `*` matches any run of characters
/// - A trailing `$` anchors the pattern to the end of the path
/// - An empty pattern matches nothing
///
/// # Examples
///
/// ```
/// use sitewave::robots::matches_rule;
///
/// assert!(matches_rule("/admin/users", "/admin"));
/// assert!(matches_rule("/x.pdf", "/*.pdf$"));
/// assert!(!matches_rule("/x.pdf.html", "/*.pdf$"));
/// assert!(!matches_rule("/public/admin", "/admin"));
/// ```
pub fn matches_rule(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let segments: Vec<&str> = pattern.split('*').collect();

    // The first segment is literal and must be a prefix
    let Some(rest) = path.strip_prefix(segments[0]) else {
        return false;
    };

    if segments.len() == 1 {
        return !anchored || rest.is_empty();
    }

    let mut rest = rest;
    let last = segments[segments.len() - 1];

    // Leftmost placement of each middle segment leaves the most room for the rest
    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }

    if anchored {
        rest.ends_with(last)
    } else {
        rest.contains(last)
    }
}
