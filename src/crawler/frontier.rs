//! Crawl frontier and result set
//!
//! `CrawlState` is owned by exactly one crawl invocation. It is mutated only from the
//! crawl's control flow, after each batch has settled, so no locking is involved.
//!
//! # Enqueue Conditions
//!
//! A link found on a page at depth `d < max_depth` is queued at depth `d + 1` when:
//! - its host equals the start host exactly
//! - it passes the include/exclude filter
//! - robots.txt allows it
//! - it is not a recorded canonical URL
//! - it is not queued or already dispatched
//! - recorded pages plus queued entries stay below `max_pages`

use crate::crawler::fetcher::FetchedPage;
use crate::crawler::parser::{extract_links, get_canonical};
use crate::robots::RobotsRuleSet;
use crate::state::{CrawlStats, PageRecord};
use crate::url::{is_same_host, UrlFilter};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};
use url::Url;

/// Largest number of entries dispatched together
pub const BATCH_SIZE: usize = 50;

/// Page and depth ceilings for one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum number of pages recorded
    pub max_pages: usize,

    /// Maximum link hops from the start URL
    pub max_depth: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 10_000,
            max_depth: 5,
        }
    }
}

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// What happened to one fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Status >= 400; not recorded, not mined for links
    HttpError(u16),

    /// Canonical URL already recorded
    Duplicate(String),

    /// New page recorded under `canonical`
    Recorded {
        canonical: String,
        links_queued: usize,
    },
}

/// Seen set, queue, and counters for one crawl
#[derive(Debug)]
pub struct CrawlState {
    host: String,
    limits: CrawlLimits,

    /// Recorded pages in insertion order
    pages: Vec<PageRecord>,

    /// Canonical URL -> index into `pages`
    seen: HashMap<String, usize>,

    queue: VecDeque<FrontierEntry>,

    /// URLs currently in `queue`
    queued: HashSet<String>,

    /// URLs already handed to the fetcher; each URL is fetched at most once
    dispatched: HashSet<String>,

    processed: usize,
    failed: usize,
    batches: usize,
}

impl CrawlState {
    /// Creates the state with the seed at depth 0
    ///
    /// Returns `None` when the start URL has no host.
    pub fn new(start_url: &Url, limits: CrawlLimits) -> Option<Self> {
        let host = start_url.host_str()?.to_string();
        let seed = start_url.to_string();

        let mut state = Self {
            host,
            limits,
            pages: Vec::new(),
            seen: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            dispatched: HashSet::new(),
            processed: 0,
            failed: 0,
            batches: 0,
        };
        state.push(seed, 0);

        Some(state)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn limits(&self) -> CrawlLimits {
        self.limits
    }

    /// True while there is queued work and the page ceiling has not been reached
    pub fn has_work(&self) -> bool {
        !self.queue.is_empty() && self.seen.len() < self.limits.max_pages
    }

    /// Dequeues the next batch, at most `min(max_pages - recorded, BATCH_SIZE)` entries
    pub fn next_batch(&mut self) -> Vec<FrontierEntry> {
        let remaining = self.limits.max_pages.saturating_sub(self.seen.len());
        let size = remaining.min(BATCH_SIZE).min(self.queue.len());

        let batch: Vec<FrontierEntry> = self.queue.drain(..size).collect();
        for entry in &batch {
            self.queued.remove(&entry.url);
            self.dispatched.insert(entry.url.clone());
        }

        if !batch.is_empty() {
            self.batches += 1;
        }

        batch
    }

    /// Applies one received response
    ///
    /// Links and the declared canonical resolve against the final URL after
    /// redirects, but the record falls back to the requested URL. A request that
    /// redirected to another host is therefore recorded under its on-host URL.
    pub fn apply_response(
        &mut self,
        entry: &FrontierEntry,
        page: &FetchedPage,
        robots: &RobotsRuleSet,
        filter: &UrlFilter,
    ) -> Disposition {
        self.processed += 1;

        if page.is_error_status() {
            debug!(url = %entry.url, status = page.status, "Skipping error response");
            return Disposition::HttpError(page.status);
        }

        // Redirects resolve relative links against where the body came from
        let base = Url::parse(&page.final_url).or_else(|_| Url::parse(&entry.url)).ok();

        let canonical = base
            .as_ref()
            .and_then(|base| get_canonical(&page.body, base))
            .filter(|canonical| is_same_host(canonical, &self.host))
            .unwrap_or_else(|| entry.url.clone());

        if self.seen.contains_key(&canonical) {
            debug!(url = %entry.url, %canonical, "Already seen canonical URL");
            return Disposition::Duplicate(canonical);
        }

        self.seen.insert(canonical.clone(), self.pages.len());
        self.pages.push(PageRecord::new(
            canonical.clone(),
            page.status,
            page.last_modified.clone(),
        ));

        let mut links_queued = 0;
        if entry.depth < self.limits.max_depth && page.is_html() {
            if let Some(base) = base {
                for link in extract_links(&page.body, &base) {
                    if self.should_queue(&link, robots, filter) {
                        self.push(link, entry.depth + 1);
                        links_queued += 1;
                    }
                }
            }
        }

        if links_queued > 0 {
            trace!(url = %entry.url, links_queued, "Queued new links");
        }

        Disposition::Recorded {
            canonical,
            links_queued,
        }
    }

    /// Counts a transport failure; the entry is not retried
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn stats(&self) -> CrawlStats {
        CrawlStats {
            processed: self.processed,
            unique_pages: self.pages.len(),
            queued: self.queue.len(),
            failed: self.failed,
            batches: self.batches,
        }
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<PageRecord> {
        self.pages
    }

    fn should_queue(&self, link: &str, robots: &RobotsRuleSet, filter: &UrlFilter) -> bool {
        if !is_same_host(link, &self.host) {
            return false;
        }

        if !filter.should_crawl(link) {
            trace!(%link, "Excluded by URL filter");
            return false;
        }

        if !robots.is_allowed(link) {
            debug!(%link, "Blocked by robots.txt");
            return false;
        }

        if self.seen.contains_key(link) || self.queued.contains(link) || self.dispatched.contains(link) {
            return false;
        }

        self.seen.len() + self.queue.len() < self.limits.max_pages
    }

    fn push(&mut self, url: String, depth: u32) {
        self.queued.insert(url.clone());
        self.queue.push_back(FrontierEntry { url, depth });
    }
}
