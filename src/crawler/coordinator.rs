//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Validating limits and the start URL before any network activity
//! - Loading robots.txt once per crawl
//! - Dispatching BFS waves through the fetcher
//! - Applying each wave's results to the crawl state in batch order
//! - Reporting progress to an optional observer
//! - Stopping cooperatively between waves

use crate::config::{validate, validate_start_url, Config};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::frontier::{CrawlLimits, CrawlState, Disposition};
use crate::crawler::throttle::Throttle;
use crate::observer::{CrawlEvent, CrawlObserver};
use crate::robots::{fetch_robots, RobotsRuleSet};
use crate::state::{CrawlStats, PageRecord};
use crate::url::UrlFilter;
use crate::{ConfigError, SitewaveError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Recorded pages in insertion order
    pub pages: Vec<PageRecord>,

    /// Final counters
    pub stats: CrawlStats,

    /// True when the crawl ended because a stop was requested
    pub stopped: bool,
}

/// Requests that a running crawl dispatch no further batches
///
/// The batch in flight when the stop is requested always finishes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Single-host crawler
///
/// Holds the reusable parts of a crawl (fetcher, agent name, filter, observer).
/// Per-crawl state lives inside `crawl` and is never shared between invocations.
pub struct Crawler {
    fetcher: Fetcher,
    agent_name: String,
    filter: UrlFilter,
    observer: Option<Arc<dyn CrawlObserver>>,
    stop: StopHandle,
}

impl Crawler {
    /// Creates a crawler
    ///
    /// `agent_name` is the token matched against robots.txt `User-agent` lines.
    pub fn new(fetcher: Fetcher, agent_name: impl Into<String>) -> Self {
        Self {
            fetcher,
            agent_name: agent_name.into(),
            filter: UrlFilter::new(),
            observer: None,
            stop: StopHandle::default(),
        }
    }

    /// Builds a crawler from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, SitewaveError> {
        let client = build_http_client(&config.user_agent, &config.http)?;
        let fetcher = Fetcher::new(client, config.crawler.concurrency)?
            .with_throttle(Throttle::from_config(&config.crawler));

        Ok(Self::new(fetcher, config.user_agent.crawler_name.clone())
            .with_filter(UrlFilter::from_config(&config.filter)))
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_filter(mut self, filter: UrlFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Handle for requesting a cooperative stop from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Crawls one host starting from `start_url`
    ///
    /// # Flow
    ///
    /// 1. Validate limits and the start URL (`ConfigError`, no network activity)
    /// 2. Fetch robots.txt; any failure means crawling unrestricted
    /// 3. While the queue is non-empty and fewer than `max_pages` pages are recorded:
    ///    dequeue a batch, fetch it, apply the results in batch order
    /// 4. Return the recorded pages
    ///
    /// Fetch failures are reported to the observer and never abort the crawl.
    pub async fn crawl(
        &self,
        start_url: &str,
        limits: CrawlLimits,
    ) -> Result<CrawlReport, SitewaveError> {
        if limits.max_pages < 1 {
            return Err(ConfigError::Validation("max-pages must be at least 1".to_string()).into());
        }
        let start = validate_start_url(start_url)?;
        let mut state = CrawlState::new(&start, limits)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("start URL has no host: {}", start_url)))?;

        info!(
            start_url = %start,
            max_pages = limits.max_pages,
            max_depth = limits.max_depth,
            "Starting crawl"
        );
        self.emit(CrawlEvent::Started {
            start_url: start.to_string(),
            max_pages: limits.max_pages,
            max_depth: limits.max_depth,
        });

        let robots = self.load_robots(&start).await;
        let mut stopped = false;

        while state.has_work() {
            if self.stop.is_stopped() {
                info!("Stop requested, not dispatching further batches");
                self.emit(CrawlEvent::StopRequested {
                    stats: state.stats(),
                });
                stopped = true;
                break;
            }

            let batch = state.next_batch();
            let urls: Vec<String> = batch.iter().map(|entry| entry.url.clone()).collect();
            let batch_number = state.stats().batches;

            debug!(batch = batch_number, size = urls.len(), "Fetching batch");
            self.emit(CrawlEvent::BatchStarted {
                batch: batch_number,
                size: urls.len(),
            });

            let mut failures = Vec::new();
            self.fetcher
                .fetch_many(
                    &urls,
                    |page, index| {
                        let entry = &batch[index];
                        if let Disposition::Duplicate(canonical) =
                            state.apply_response(entry, &page, &robots, &self.filter)
                        {
                            debug!(url = %entry.url, %canonical, "Duplicate canonical dropped");
                        }
                    },
                    |error, index| failures.push((index, error)),
                )
                .await;

            for (index, error) in failures {
                state.record_failure();
                self.emit(CrawlEvent::FetchFailed {
                    url: batch[index].url.clone(),
                    depth: batch[index].depth,
                    error,
                });
            }

            let stats = state.stats();
            info!("Progress: {}", stats);
            self.emit(CrawlEvent::Progress { stats });
        }

        let stats = state.stats();
        info!(
            pages = stats.unique_pages,
            processed = stats.processed,
            failed = stats.failed,
            "Crawl completed"
        );
        self.emit(CrawlEvent::Finished { stats });

        Ok(CrawlReport {
            pages: state.into_pages(),
            stats,
            stopped,
        })
    }

    async fn load_robots(&self, start: &url::Url) -> RobotsRuleSet {
        match fetch_robots(&self.fetcher, start, &self.agent_name).await {
            Ok(rules) => {
                self.emit(CrawlEvent::RobotsLoaded {
                    allow_rules: rules.allows().len(),
                    disallow_rules: rules.disallows().len(),
                });
                rules
            }
            Err(e) => {
                self.emit(CrawlEvent::RobotsUnavailable {
                    reason: e.to_string(),
                });
                RobotsRuleSet::allow_all()
            }
        }
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

/// Runs a complete crawl described by a configuration
///
/// # Example
///
/// ```no_run
/// use sitewave::config::load_config;
/// use sitewave::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sitewave.toml"))?;
/// let report = crawl(&config).await?;
/// println!("{} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<CrawlReport, SitewaveError> {
    validate(config)?;

    let crawler = Crawler::from_config(config)?;
    let limits = CrawlLimits {
        max_pages: config.crawler.max_pages,
        max_depth: config.crawler.max_depth,
    };

    crawler.crawl(&config.crawler.start_url, limits).await
}
