//! Robots.txt parser implementation
//!
//! Only `Sitemap:` declarations are harvested. Every other directive
//! (`User-agent`, `Disallow`, `Crawl-delay`, ...) is ignored.

use crate::url::{canonicalize_url, resolve_reference};
use std::collections::HashSet;
use url::Url;

/// Extracts `Sitemap:` declarations from robots.txt content
///
/// The key is matched case-insensitively and may be surrounded by
/// whitespace. Relative values are resolved against `base`. Declarations
/// are returned in file order with canonical duplicates removed.
///
/// # Arguments
///
/// * `content` - The raw robots.txt file content
/// * `base` - The site's normalized base URL
///
/// # Example
///
/// ```
/// use sitemap_harvest::robots::parse_sitemap_directives;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let found = parse_sitemap_directives("User-agent: *\nSITEMAP: /sitemap_index.xml\n", &base);
/// assert_eq!(found, vec!["https://example.com/sitemap_index.xml"]);
/// ```
pub fn parse_sitemap_directives(content: &str, base: &Url) -> Vec<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut seen = HashSet::new();

    content
        .lines()
        .filter_map(|line| {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            resolve_reference(value, base)
        })
        .filter(|url| seen.insert(canonicalize_url(url)))
        .collect()
}
