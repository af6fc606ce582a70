//! Sitemap traverser - recursive descent over sitemap indexes
//!
//! This module contains the per-site traversal loop:
//! - Claiming root candidates against the site's sitemap budget
//! - Spawning one task per sitemap node on a `JoinSet`
//! - Fetching through the governor, decoding, and expanding indexes
//! - Enforcing depth, fanout, and total-sitemap budgets
//!
//! A node's children are only spawned after the node's own task has
//! finished decoding it, so scheduling is always causal. Sibling subtrees
//! complete in any order; the aggregator's merge is order-independent.

use crate::config::SiteTarget;
use crate::harvester::decoder::{decode, DecodedDocument, SitemapEntry};
use crate::harvester::fetcher::{fetch_gated, Fetch};
use crate::harvester::governor::Governor;
use crate::output::{BudgetNote, BudgetReason, ErrorKind, NodeError, ResultAggregator, UrlRecord};
use crate::state::{Claim, NodeKind, NodeOutcome, NodeState, SitemapNode, TraversalContext};
use crate::url::{canonicalize_url, resolve_reference};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinSet};
use url::Url;

/// Walks the sitemap graph of one site
#[derive(Clone)]
pub struct SitemapTraverser {
    fetcher: Arc<dyn Fetch>,
    governor: Governor,
}

impl SitemapTraverser {
    pub fn new(fetcher: Arc<dyn Fetch>, governor: Governor) -> Self {
        Self { fetcher, governor }
    }

    /// Traverses every root candidate and merges the outcomes
    ///
    /// Budgets and the per-request timeout come from `target.config`.
    /// Roots are claimed in order at depth 0 and count against the
    /// sitemap budget like any other node. A node whose task panics is
    /// recorded as a `TaskFailed` error. Dropping the returned future
    /// aborts all outstanding node tasks; their governor slots are
    /// released as the tasks unwind.
    pub async fn traverse(
        &self,
        target: &SiteTarget,
        roots: &[String],
        aggregator: &mut ResultAggregator,
    ) {
        let context = Arc::new(TraversalContext::new(&target.config));
        let timeout = target.config.timeout();
        let mut tasks: JoinSet<NodeOutcome> = JoinSet::new();
        let mut pending: HashMap<task::Id, SitemapNode> = HashMap::new();

        for root in roots {
            match context.claim(root) {
                Claim::Scheduled => {
                    let node = SitemapNode::root(root.clone());
                    self.spawn_node(&mut tasks, &mut pending, &context, timeout, node);
                }
                Claim::AlreadyVisited => {}
                Claim::BudgetExhausted => {
                    tracing::debug!("Sitemap budget spent before root {}", root);
                    aggregator.record_note(BudgetNote::new(
                        root.clone(),
                        0,
                        BudgetReason::Sitemaps,
                        1,
                    ));
                }
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, mut outcome)) => {
                    pending.remove(&id);
                    for child in std::mem::take(&mut outcome.children) {
                        self.spawn_node(&mut tasks, &mut pending, &context, timeout, child);
                    }
                    aggregator.absorb(outcome);
                }
                Err(e) => {
                    let Some(node) = pending.remove(&e.id()) else {
                        tracing::warn!("Untracked sitemap task failed: {}", e);
                        continue;
                    };
                    tracing::warn!("Sitemap task for {} failed: {}", node.url, e);
                    let error = NodeError::new(
                        node.url.clone(),
                        node.depth,
                        ErrorKind::TaskFailed,
                        e.to_string(),
                    )
                    .with_parent(node.parent.clone());
                    aggregator.absorb(NodeOutcome::failed(node, NodeKind::FetchFailed, error));
                }
            }
        }

        tracing::debug!(
            "Traversal finished: {} sitemaps claimed, {} URLs",
            context.sitemaps_claimed(),
            aggregator.urls_found()
        );
    }

    fn spawn_node(
        &self,
        tasks: &mut JoinSet<NodeOutcome>,
        pending: &mut HashMap<task::Id, SitemapNode>,
        context: &Arc<TraversalContext>,
        timeout: Duration,
        node: SitemapNode,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let governor = self.governor.clone();
        let context = Arc::clone(context);
        let tracked = node.clone();

        let handle = tasks
            .spawn(async move { process_node(fetcher, governor, context, timeout, node).await });
        pending.insert(handle.id(), tracked);
    }
}

/// Fetches, decodes, and expands a single node
async fn process_node(
    fetcher: Arc<dyn Fetch>,
    governor: Governor,
    context: Arc<TraversalContext>,
    timeout: Duration,
    mut node: SitemapNode,
) -> NodeOutcome {
    node.advance(NodeState::Fetching);

    let fetched = match fetch_gated(fetcher.as_ref(), &governor, &node.url, timeout).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Failed to fetch sitemap {}: {}", node.url, e);
            let error = NodeError::new(node.url.clone(), node.depth, e.kind(), e.to_string())
                .with_parent(node.parent.clone());
            return NodeOutcome::failed(node, NodeKind::FetchFailed, error);
        }
    };

    let document = decode(&fetched.body);
    node.advance(NodeState::Decoded);

    // Relative references resolve against the final URL after redirects
    let base = Url::parse(&fetched.final_url)
        .or_else(|_| Url::parse(&node.url))
        .ok();

    match document {
        DecodedDocument::Malformed { reason } => {
            tracing::warn!("Malformed sitemap {}: {}", node.url, reason);
            let error = NodeError::new(node.url.clone(), node.depth, ErrorKind::XmlParse, reason)
                .with_parent(node.parent.clone());
            NodeOutcome::failed(node, NodeKind::Malformed, error)
        }
        DecodedDocument::UrlSet { entries } => {
            let records = collect_records(&node, base.as_ref(), entries);
            tracing::debug!("{} contributed {} URLs", node.url, records.len());
            node.resolve(NodeKind::UrlSet, NodeState::Terminal);
            NodeOutcome {
                node,
                records,
                children: Vec::new(),
                error: None,
                notes: Vec::new(),
            }
        }
        DecodedDocument::Index { children } => {
            expand_index(node, base.as_ref(), children, &context)
        }
    }
}

fn collect_records(
    node: &SitemapNode,
    base: Option<&Url>,
    entries: Vec<SitemapEntry>,
) -> Vec<UrlRecord> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let absolute = resolve(&entry.loc, base)?;
            Some(UrlRecord::new(
                canonicalize_url(&absolute),
                entry.lastmod,
                node.url.clone(),
            ))
        })
        .collect()
}

fn resolve(reference: &str, base: Option<&Url>) -> Option<String> {
    let resolved = match base {
        Some(base) => resolve_reference(reference, base),
        None => Url::parse(reference.trim()).ok().map(String::from),
    };
    if resolved.is_none() {
        tracing::debug!("Skipping unresolvable reference {:?}", reference);
    }
    resolved
}

/// Applies the depth, fanout, and sitemap budgets to an index's children
fn expand_index(
    mut node: SitemapNode,
    base: Option<&Url>,
    children: Vec<String>,
    context: &TraversalContext,
) -> NodeOutcome {
    let mut notes = Vec::new();
    let mut scheduled = Vec::new();

    if !context.can_expand(node.depth) {
        tracing::debug!(
            "Depth limit reached at {} (depth {}), {} children not visited",
            node.url,
            node.depth,
            children.len()
        );
        notes.push(BudgetNote::new(
            node.url.clone(),
            node.depth,
            BudgetReason::Depth,
            children.len(),
        ));
    } else {
        // Distinct children in document order
        let mut seen = HashSet::new();
        let mut distinct: Vec<String> = children
            .iter()
            .filter_map(|child| resolve(child, base))
            .filter(|child| seen.insert(canonicalize_url(child)))
            .collect();

        let max_fanout = context.max_fanout();
        if distinct.len() > max_fanout {
            notes.push(BudgetNote::new(
                node.url.clone(),
                node.depth,
                BudgetReason::Fanout,
                distinct.len() - max_fanout,
            ));
            distinct.truncate(max_fanout);
        }

        let claims = context.claim_children(&distinct);
        if claims.budget_skipped > 0 {
            notes.push(BudgetNote::new(
                node.url.clone(),
                node.depth,
                BudgetReason::Sitemaps,
                claims.budget_skipped,
            ));
        }

        scheduled = claims
            .scheduled
            .into_iter()
            .map(|url| SitemapNode::child_of(&node, url))
            .collect();
    }

    node.resolve(NodeKind::Index, NodeState::Expanded);
    NodeOutcome {
        node,
        records: Vec::new(),
        children: scheduled,
        error: None,
        notes,
    }
}
