//! Sitewave: a single-host crawler that produces sitemaps
//!
//! This crate discovers every reachable page on one host starting from a seed URL,
//! honoring page/depth ceilings and robots.txt, and serializes the discovered set
//! into chunked, gzip-compressed sitemaps.org files plus a sitemap index.

pub mod config;
pub mod crawler;
pub mod observer;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sitewave operations
#[derive(Debug, Error)]
pub enum SitewaveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Robots.txt error: {0}")]
    Robots(String),

    #[error("Sitemap writer error: {0}")]
    Writer(#[from] sitemap::WriterError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Raised before any network activity takes place.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Cannot resolve '{href}' against '{base}': {reason}")]
    Resolve {
        href: String,
        base: String,
        reason: String,
    },
}

/// Result type alias for Sitewave operations
pub type Result<T> = std::result::Result<T, SitewaveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlLimits, CrawlReport, Crawler};
pub use sitemap::write_sitemaps;
pub use state::{CrawlStats, PageRecord};
