//! Robots.txt handling module
//!
//! robots.txt is fetched once per crawl from the start URL's origin and parsed into a
//! `RobotsRuleSet`. A missing file (any non-200 status) means everything is allowed.

mod parser;

pub use parser::{matches_rule, RobotsRuleSet};

use crate::crawler::Fetcher;
use crate::SitewaveError;
use tracing::debug;
use url::Url;

/// Fetches and parses robots.txt for the origin of `start_url`
///
/// # Returns
///
/// * `Ok(RobotsRuleSet)` - Parsed rules, or an empty set when the server answered
///   with anything other than 200
/// * `Err(SitewaveError::Robots)` - The request itself failed; callers fall back to
///   `RobotsRuleSet::allow_all()`
pub async fn fetch_robots(
    fetcher: &Fetcher,
    start_url: &Url,
    agent_name: &str,
) -> Result<RobotsRuleSet, SitewaveError> {
    let robots_url = start_url
        .join("/robots.txt")
        .map_err(|e| SitewaveError::Robots(format!("cannot build robots.txt URL: {}", e)))?;

    let page = fetcher
        .get(robots_url.as_str())
        .await
        .map_err(|e| SitewaveError::Robots(e.to_string()))?;

    if page.status != 200 {
        debug!(url = %robots_url, status = page.status, "No robots.txt, allowing all");
        return Ok(RobotsRuleSet::allow_all());
    }

    let rules = RobotsRuleSet::parse(&page.body, agent_name);
    debug!(
        url = %robots_url,
        allow = rules.allows().len(),
        disallow = rules.disallows().len(),
        "Parsed robots.txt"
    );

    Ok(rules)
}
