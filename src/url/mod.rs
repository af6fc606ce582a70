//! URL handling module for Sitemap-Harvest
//!
//! This module provides canonical URL normalization for deduplication,
//! base URL normalization for site targets, and resolution of relative
//! sitemap references.

mod normalize;

pub use normalize::{canonicalize_url, normalize_base_url, resolve_reference, site_root};
