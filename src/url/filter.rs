use crate::config::FilterConfig;
use crate::url::matcher::matches_glob;

/// Include/exclude glob filter applied to discovered links
///
/// With a non-empty include list a URL must match at least one include pattern;
/// it must then match none of the exclude patterns. Matching is case-insensitive
/// unless `case_sensitive` is set.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<String>,
    exclude: Vec<String>,
    case_sensitive: bool,
}

impl UrlFilter {
    /// Creates a filter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from the `[filter]` configuration section
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            case_sensitive: config.case_sensitive,
        }
    }

    pub fn add_include_pattern(&mut self, pattern: impl Into<String>) {
        self.include.push(pattern.into());
    }

    pub fn add_exclude_pattern(&mut self, pattern: impl Into<String>) {
        self.exclude.push(pattern.into());
    }

    /// True when the filter has no patterns at all
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Checks if a URL passes the include and exclude lists
    pub fn should_crawl(&self, url: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| self.matches(p, url)) {
            return false;
        }

        !self.exclude.iter().any(|p| self.matches(p, url))
    }

    /// Keeps only the URLs that pass the filter
    pub fn filter_urls<'a>(&self, urls: &'a [String]) -> Vec<&'a String> {
        urls.iter().filter(|url| self.should_crawl(url)).collect()
    }

    fn matches(&self, pattern: &str, url: &str) -> bool {
        if self.case_sensitive {
            matches_glob(pattern, url)
        } else {
            matches_glob(&pattern.to_lowercase(), &url.to_lowercase())
        }
    }
}
