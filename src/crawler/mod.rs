//! Crawler module for page fetching and frontier management
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded concurrency and optional request pacing
//! - HTML parsing, link extraction, and canonical URL discovery
//! - The BFS frontier and result set
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod throttle;

pub use coordinator::{crawl, CrawlReport, Crawler, StopHandle};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, MAX_CONCURRENCY};
pub use frontier::{CrawlLimits, CrawlState, Disposition, FrontierEntry, BATCH_SIZE};
pub use parser::{extract_links, get_canonical, resolve_url};
pub use throttle::Throttle;
