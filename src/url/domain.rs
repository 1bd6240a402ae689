use url::Url;

/// Extracts the host from a URL string
///
/// Hosts come back lowercased from the `url` crate; ports are not part of the host.
///
/// # Examples
///
/// ```
/// use sitewave::url::extract_host;
///
/// assert_eq!(extract_host("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_host("https://example.com:8080/"), Some("example.com".to_string()));
/// assert_eq!(extract_host("/relative/path"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Returns true when `url` parses and its host equals `host` exactly
///
/// Subdomains do not match: `blog.example.com` is not on `example.com`.
pub fn is_same_host(url: &str, host: &str) -> bool {
    extract_host(url).is_some_and(|h| h == host)
}

/// Returns true when a URL is retrievable: it parses, uses HTTP(S), and has a host
pub fn is_fetchable(url: &str) -> bool {
    parse_fetchable(url).is_some()
}

/// Parses a URL, keeping it only if it is retrievable over HTTP(S)
pub fn parse_fetchable(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    (scheme_ok && parsed.host_str().is_some()).then_some(parsed)
}
