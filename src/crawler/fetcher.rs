//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with an identifying user agent and bounded redirects
//! - Batched GETs with a concurrency ceiling and index-ordered delivery
//! - Single GETs (used for robots.txt)
//! - Optional request pacing through a shared `Throttle`
//! - Transport error classification
//!
//! HTTP error statuses are not fetch failures: a 404 or 503 is a `FetchedPage`
//! like any other, and the caller decides what to do with it.

use crate::config::{HttpConfig, UserAgentConfig};
use crate::crawler::throttle::Throttle;
use crate::state::parse_last_modified;
use crate::url::parse_fetchable;
use crate::ConfigError;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LAST_MODIFIED};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

/// Upper bound for the per-batch concurrency ceiling
pub const MAX_CONCURRENCY: usize = 100;

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A received HTTP response, whatever its status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Last-Modified header as `YYYY-MM-DD`
    pub last_modified: Option<String>,

    /// Page body; empty for statuses >= 400, and for non-HTML responses
    /// fetched through `fetch_many`
    pub body: String,
}

impl FetchedPage {
    /// Returns true for 4xx and 5xx statuses
    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }

    /// Returns true when the Content-Type names an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_html_content_type)
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text/html") || ct.contains("application/xhtml+xml")
}

/// Which response bodies are read into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyPolicy {
    Any,
    HtmlOnly,
}

/// Transport-level failure for one URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("Redirect error for {url}: {reason}")]
    Redirect { url: String, reason: String },

    #[error("Failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

impl FetchError {
    /// The URL the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Connect { url, .. }
            | FetchError::Redirect { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Request { url, .. } => url,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        let reason = error.to_string();

        if error.is_timeout() {
            FetchError::Timeout { url }
        } else if error.is_redirect() {
            FetchError::Redirect { url, reason }
        } else if error.is_connect() {
            FetchError::Connect { url, reason }
        } else if error.is_body() || error.is_decode() {
            FetchError::Body { url, reason }
        } else {
            FetchError::Request { url, reason }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sitewave::config::{HttpConfig, UserAgentConfig};
/// use sitewave::crawler::build_http_client;
///
/// let agent = UserAgentConfig {
///     crawler_name: "Sitewave".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
/// };
///
/// let client = build_http_client(&agent, &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

    Client::builder()
        .user_agent(agent.header_value())
        .default_headers(headers)
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .redirect(Policy::limited(http.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Executes GETs with a bounded number of requests in flight
///
/// The client is cheap to clone and may be shared across fetchers and crawls.
/// Clones share one throttle.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    concurrency: usize,
    throttle: Arc<Throttle>,
}

impl Fetcher {
    /// Creates a fetcher, validating `concurrency` to `1..=MAX_CONCURRENCY`
    pub fn new(client: Client, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, concurrency
            )));
        }

        debug!(concurrency, "Fetcher initialized");
        Ok(Self {
            client,
            concurrency,
            throttle: Arc::new(Throttle::unlimited()),
        })
    }

    /// Paces every request this fetcher sends, including robots.txt
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = Arc::new(throttle);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches a single URL, reading the body whatever its content type
    pub async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = validate(url)?;
        self.fetch_one(url, parsed, BodyPolicy::Any).await
    }

    /// Fetches a batch of URLs and reports each outcome with its original index
    ///
    /// URLs that do not parse as HTTP(S) with a host are reported through
    /// `on_failure` without being dispatched. Every response, including 4xx/5xx,
    /// goes to `on_success`; only transport failures go to `on_failure`.
    /// Bodies are read only for HTML responses.
    ///
    /// Returns once every item has settled. Callbacks run on the calling task in
    /// ascending index order, independent of network completion order.
    pub async fn fetch_many<S, F>(&self, urls: &[String], mut on_success: S, mut on_failure: F)
    where
        S: FnMut(FetchedPage, usize),
        F: FnMut(FetchError, usize),
    {
        if urls.is_empty() {
            return;
        }

        let mut outcomes: Vec<(usize, Result<FetchedPage, FetchError>)> =
            Vec::with_capacity(urls.len());
        let mut dispatch = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            match validate(url) {
                Ok(parsed) => dispatch.push((index, url.as_str(), parsed)),
                Err(e) => outcomes.push((index, Err(e))),
            }
        }

        trace!(
            dispatched = dispatch.len(),
            rejected = outcomes.len(),
            "Dispatching batch"
        );

        let settled: Vec<(usize, Result<FetchedPage, FetchError>)> = stream::iter(dispatch)
            .map(|(index, url, parsed)| async move {
                (index, self.fetch_one(url, parsed, BodyPolicy::HtmlOnly).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes.extend(settled);
        outcomes.sort_by_key(|(index, _)| *index);

        for (index, outcome) in outcomes {
            match outcome {
                Ok(page) => on_success(page, index),
                Err(e) => on_failure(e, index),
            }
        }
    }

    async fn fetch_one(
        &self,
        url: &str,
        parsed: Url,
        policy: BodyPolicy,
    ) -> Result<FetchedPage, FetchError> {
        self.throttle.acquire().await;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers();

        let content_type = header_string(headers, CONTENT_TYPE);
        let last_modified =
            header_string(headers, LAST_MODIFIED).and_then(|value| parse_last_modified(&value));

        let wants_body = match policy {
            BodyPolicy::Any => true,
            BodyPolicy::HtmlOnly => content_type.as_deref().is_some_and(is_html_content_type),
        };

        let body = if status < 400 && wants_body {
            response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?
        } else {
            String::new()
        };

        debug!(url, status, "Fetched");

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status,
            content_type,
            last_modified,
            body,
        })
    }
}

fn validate(url: &str) -> Result<Url, FetchError> {
    parse_fetchable(url).ok_or_else(|| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: "expected an http(s) URL with a host".to_string(),
    })
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
