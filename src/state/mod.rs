//! State module for tracking traversal progress
//!
//! This module provides state management for sitemap nodes during a site's
//! traversal.
//!
//! # Components
//!
//! - `NodeState` / `NodeKind`: lifecycle and resolved type of one sitemap document
//! - `SitemapNode` / `NodeOutcome`: a node and what it contributed
//! - `TraversalContext`: the per-site visited set and sitemap budget

mod context;
mod node;

// Re-export main types
pub use context::{ChildClaims, Claim, TraversalContext};
pub use node::{NodeKind, NodeOutcome, NodeState, SitemapNode};
