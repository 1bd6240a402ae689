//! Crawl progress events and the sinks that receive them
//!
//! The crawler reports lifecycle, batch, and per-URL failure events through a
//! `CrawlObserver`. Without an observer the events are dropped.

use crate::crawler::FetchError;
use crate::state::CrawlStats;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Structured progress and failure events emitted during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// Configuration validated, crawl about to begin
    Started {
        start_url: String,
        max_pages: usize,
        max_depth: u32,
    },

    /// robots.txt fetched (possibly empty)
    RobotsLoaded { allow_rules: usize, disallow_rules: usize },

    /// robots.txt could not be fetched; crawling unrestricted
    RobotsUnavailable { reason: String },

    /// A batch is about to be dispatched
    BatchStarted { batch: usize, size: usize },

    /// Transport failure for one URL; it will not be retried
    FetchFailed { url: String, depth: u32, error: FetchError },

    /// Counters after a batch has been applied
    Progress { stats: CrawlStats },

    /// A stop was requested; no further batches will be dispatched
    StopRequested { stats: CrawlStats },

    /// The crawl has ended
    Finished { stats: CrawlStats },
}

/// Receives crawl events
///
/// Implementations must be cheap: events are delivered on the crawl's control flow.
pub trait CrawlObserver: Send + Sync {
    fn on_event(&self, event: &CrawlEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Started {
                start_url,
                max_pages,
                max_depth,
            } => info!(%start_url, max_pages, max_depth, "Crawl started"),
            CrawlEvent::RobotsLoaded {
                allow_rules,
                disallow_rules,
            } => info!(allow_rules, disallow_rules, "robots.txt loaded"),
            CrawlEvent::RobotsUnavailable { reason } => {
                warn!(%reason, "robots.txt unavailable, crawling without restrictions")
            }
            CrawlEvent::BatchStarted { batch, size } => debug!(batch, size, "Batch started"),
            CrawlEvent::FetchFailed { url, depth, error } => {
                warn!(%url, depth, %error, "Fetch failed")
            }
            CrawlEvent::Progress { stats } => info!("Progress: {}", stats),
            CrawlEvent::StopRequested { stats } => info!("Stop requested: {}", stats),
            CrawlEvent::Finished { stats } => info!("Crawl finished: {}", stats),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Failure events only
    pub fn failures(&self) -> Vec<CrawlEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, CrawlEvent::FetchFailed { .. }))
            .collect()
    }
}

impl CrawlObserver for RecordingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
