/// Checks if a glob pattern matches anywhere inside `candidate`
///
/// Supported wildcards:
/// 1. `*` matches any run of characters (including none)
/// 2. `?` matches exactly one character
///
/// The pattern is not anchored: `"/print/"` matches any URL containing `/print/`.
///
/// # Examples
///
/// ```
/// use sitewave::url::matches_glob;
///
/// assert!(matches_glob("/print/", "https://example.com/print/page"));
/// assert!(matches_glob("*.pdf", "https://example.com/file.pdf"));
/// assert!(matches_glob("/page-?", "https://example.com/page-7"));
/// assert!(!matches_glob("/admin/", "https://example.com/public"));
/// ```
pub fn matches_glob(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    (0..=candidate.len()).any(|start| match_here(&pattern, &candidate[start..]))
}

/// Matches `pattern` against a prefix of `text`
fn match_here(pattern: &[char], text: &[char]) -> bool {
    // Iterative wildcard matching with single-star backtracking
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    loop {
        if p == pattern.len() {
            // Unanchored at the end: any remaining text is fine
            return true;
        }

        match pattern[p] {
            '*' => {
                star = Some((p, t));
                p += 1;
            }
            c if t < text.len() && (c == '?' || c == text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) if star_t < text.len() => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, star_t + 1));
                }
                _ => return false,
            },
        }
    }
}
