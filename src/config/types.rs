use serde::Deserialize;

/// Main configuration structure for Sitewave
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URL; its host bounds the crawl
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum number of pages recorded
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link hops from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of in-flight fetches within a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Minimum spacing between request starts (milliseconds, 0 disables)
    #[serde(rename = "delay-ms", default)]
    pub delay_ms: u64,

    /// Request budget per `window-secs`; unset means unlimited
    #[serde(rename = "max-requests-per-window", default)]
    pub max_requests_per_window: Option<usize>,

    /// Length of the request budget window (seconds)
    #[serde(rename = "window-secs", default = "default_window_secs")]
    pub window_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt `User-agent` lines
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving sitemap chunks and the index
    pub directory: String,

    /// Maximum `<url>` entries per chunk (clamped to 1..=50000 by the writer)
    #[serde(rename = "max-per-file", default = "default_max_per_file")]
    pub max_per_file: usize,

    /// Public URL prefix for chunk locations in the index
    #[serde(rename = "public-base", default)]
    pub public_base: Option<String>,
}

/// Include/exclude URL patterns
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(rename = "case-sensitive", default)]
    pub case_sensitive: bool,
}

fn default_max_pages() -> usize {
    10_000
}

fn default_max_depth() -> u32 {
    5
}

fn default_concurrency() -> usize {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_per_file() -> usize {
    crate::sitemap::MAX_URLS_PER_FILE
}
