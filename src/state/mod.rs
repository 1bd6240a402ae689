//! State module for crawl results
//!
//! # Components
//!
//! - `PageRecord`: one discovered page (canonical URL, status, optional last-modified date)
//! - `CrawlStats`: counters reported while and after a crawl runs

mod crawl_stats;
mod page_record;

// Re-export main types
pub use crawl_stats::CrawlStats;
pub use page_record::{is_valid_lastmod, parse_last_modified, PageRecord};
