//! Result records produced by a site traversal
//!
//! Everything a traversal reports is data: extracted URLs, per-node errors,
//! and informational budget notes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// A page URL extracted from a `<urlset>` document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UrlRecord {
    /// Canonical URL (see [`crate::url::canonicalize_url`])
    pub url: String,

    /// Raw `<lastmod>` value, if present
    pub lastmod: Option<String>,

    /// URL of the sitemap document this record came from
    pub source_sitemap: String,
}

impl UrlRecord {
    pub fn new(url: String, lastmod: Option<String>, source_sitemap: String) -> Self {
        Self {
            url,
            lastmod,
            source_sitemap,
        }
    }

    /// Parses `lastmod` as a W3C datetime
    ///
    /// Accepts full RFC 3339 timestamps and plain `YYYY-MM-DD` dates
    /// (interpreted as midnight UTC). Anything else yields `None`.
    pub fn lastmod_datetime(&self) -> Option<DateTime<Utc>> {
        let raw = self.lastmod.as_deref()?.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        Some(Utc.from_utc_datetime(&midnight))
    }

    /// Ordering key used when two branches report the same URL
    ///
    /// Records with a `lastmod` win; ties go to the lexicographically
    /// smallest source sitemap so the result does not depend on completion
    /// order.
    pub(crate) fn preference_key(&self) -> (bool, &str, &str) {
        (
            self.lastmod.is_none(),
            self.source_sitemap.as_str(),
            self.lastmod.as_deref().unwrap_or(""),
        )
    }
}

/// Failure classification for a recorded node error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// DNS or connection failure
    Network,

    /// The request did not complete within the configured timeout
    Timeout,

    /// The server answered with a non-2xx status
    HttpStatus(u16),

    /// Malformed, truncated, or unrecognized sitemap document
    XmlParse,

    /// A base URL or sitemap reference that cannot be parsed
    InvalidUrl,

    /// The node's task panicked before producing an outcome
    TaskFailed,
}

impl ErrorKind {
    /// Returns a stable short label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "network_error",
            Self::Timeout => "timeout_error",
            Self::HttpStatus(_) => "http_status_error",
            Self::XmlParse => "xml_parse_error",
            Self::InvalidUrl => "invalid_url",
            Self::TaskFailed => "task_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "{}({})", self.label(), status),
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// An error recorded against a failed sitemap node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeError {
    /// URL of the failing node
    pub url: String,

    /// Depth of the failing node
    pub depth: usize,

    pub kind: ErrorKind,

    /// Human readable diagnostic
    pub message: String,

    /// The index that referenced this node, if any
    pub parent: Option<String>,
}

impl NodeError {
    pub fn new(
        url: impl Into<String>,
        depth: usize,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            depth,
            kind,
            message: message.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (depth {}): {}",
            self.kind, self.url, self.depth, self.message
        )
    }
}

/// Which budget stopped further expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BudgetReason {
    /// The index sits at the maximum depth
    Depth,

    /// The index lists more children than the fanout limit
    Fanout,

    /// The site's sitemap budget is spent
    Sitemaps,
}

impl BudgetReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::Fanout => "fanout",
            Self::Sitemaps => "sitemaps",
        }
    }
}

/// Informational note emitted when a budget stops expansion
///
/// Not an error: the site result stays clean when only notes are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetNote {
    /// URL of the node whose expansion was limited
    pub url: String,

    pub depth: usize,

    pub reason: BudgetReason,

    /// Number of child sitemaps that were not scheduled
    pub skipped: usize,
}

impl BudgetNote {
    pub fn new(url: impl Into<String>, depth: usize, reason: BudgetReason, skipped: usize) -> Self {
        Self {
            url: url.into(),
            depth,
            reason,
            skipped,
        }
    }
}

impl fmt::Display for BudgetNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} budget reached at {} (depth {}): {} child sitemap(s) skipped",
            self.reason.label(),
            self.url,
            self.depth,
            self.skipped
        )
    }
}
