use serde::Serialize;
use std::fmt;

/// Running counters for one crawl invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// HTTP responses received (any status)
    pub processed: usize,

    /// Pages recorded in the result set
    pub unique_pages: usize,

    /// Frontier entries still waiting
    pub queued: usize,

    /// Transport-level fetch failures
    pub failed: usize,

    /// Batches dispatched so far
    pub batches: usize,
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} unique pages, {} queued, {} failed, {} batches",
            self.processed, self.unique_pages, self.queued, self.failed, self.batches
        )
    }
}
