use crate::UrlError;
use url::Url;

/// Canonicalizes an extracted URL for deduplication
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Lowercase the scheme and host (path, query keep their case)
/// 3. Remove the default port and the fragment
///
/// Strings that cannot be parsed as absolute URLs are returned trimmed but
/// otherwise untouched, so they still deduplicate against exact repeats.
///
/// # Examples
///
/// ```
/// use sitemap_harvest::url::canonicalize_url;
///
/// assert_eq!(
///     canonicalize_url("  HTTPS://Example.COM:443/Page#top "),
///     "https://example.com/Page"
/// );
/// ```
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Normalizes a site's base URL
///
/// A missing scheme is replaced by `https://`, and the fragment and query
/// are dropped. Only HTTP and HTTPS are accepted.
///
/// # Examples
///
/// ```
/// use sitemap_harvest::url::normalize_base_url;
///
/// let url = normalize_base_url("example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn normalize_base_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    url.set_query(None);
    Ok(url)
}

/// Returns the base URL without a trailing slash, ready for path joining
pub fn site_root(base: &Url) -> String {
    base.as_str().trim_end_matches('/').to_string()
}

/// Resolves a possibly relative sitemap reference against a base URL
///
/// Absolute HTTP(S) references are returned as-is, relative ones are joined
/// onto `base`. Empty references and non-HTTP schemes yield `None`.
pub fn resolve_reference(reference: &str, base: &Url) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url.to_string()),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).ok().map(|u| u.to_string())
        }
        Err(_) => None,
    }
}
