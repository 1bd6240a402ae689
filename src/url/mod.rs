//! URL handling module for Sitewave
//!
//! This module provides host extraction, HTTP(S) fetchability checks, glob matching,
//! and the include/exclude link filter.

mod domain;
mod filter;
mod matcher;

// Re-export main functions
pub use domain::{extract_host, is_fetchable, is_same_host, parse_fetchable};
pub use filter::UrlFilter;
pub use matcher::matches_glob;
