use crate::config::HarvesterConfig;
use crate::url::canonicalize_url;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Result of trying to claim a sitemap URL for fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// URL was new and the budget allowed it; it is now visited and counted
    Scheduled,

    /// URL was already claimed earlier in this site's traversal
    AlreadyVisited,

    /// The site's sitemap budget is spent
    BudgetExhausted,
}

/// Outcome of claiming a batch of children in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildClaims {
    /// URLs that were claimed and must be scheduled
    pub scheduled: Vec<String>,

    /// URLs skipped because they were already visited
    pub revisited: usize,

    /// URLs skipped because the sitemap budget ran out
    pub budget_skipped: usize,
}

#[derive(Debug, Default)]
struct ContextState {
    visited: HashSet<String>,
    sitemaps_claimed: usize,
}

/// Shared traversal state for one site
///
/// This is the only state mutated by several node tasks at once. The visited
/// set and the sitemap counter live behind one mutex so that "is this URL
/// new, and is the budget not yet spent" is a single atomic step.
#[derive(Debug)]
pub struct TraversalContext {
    max_depth: usize,
    max_fanout: usize,
    max_sitemaps: usize,
    state: Mutex<ContextState>,
}

impl TraversalContext {
    /// Creates a fresh context sized from the run configuration
    pub fn new(config: &HarvesterConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_fanout: config.max_fanout_per_level,
            max_sitemaps: config.max_sitemaps,
            state: Mutex::new(ContextState::default()),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_fanout(&self) -> usize {
        self.max_fanout
    }

    pub fn max_sitemaps(&self) -> usize {
        self.max_sitemaps
    }

    /// Returns true if an index at `depth` may schedule children
    pub fn can_expand(&self, depth: usize) -> bool {
        depth < self.max_depth
    }

    /// Claims one URL: check-and-increment under a single lock
    pub fn claim(&self, url: &str) -> Claim {
        let key = canonicalize_url(url);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::claim_locked(&mut state, key, self.max_sitemaps)
    }

    /// Claims children in order, holding the lock for the whole batch
    ///
    /// Order is preserved so budget exhaustion always drops the later
    /// entries of a document.
    pub fn claim_children(&self, urls: &[String]) -> ChildClaims {
        let mut claims = ChildClaims::default();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        for url in urls {
            match Self::claim_locked(&mut state, canonicalize_url(url), self.max_sitemaps) {
                Claim::Scheduled => claims.scheduled.push(url.clone()),
                Claim::AlreadyVisited => claims.revisited += 1,
                Claim::BudgetExhausted => claims.budget_skipped += 1,
            }
        }

        claims
    }

    fn claim_locked(state: &mut ContextState, key: String, max_sitemaps: usize) -> Claim {
        if state.visited.contains(&key) {
            return Claim::AlreadyVisited;
        }
        if state.sitemaps_claimed >= max_sitemaps {
            return Claim::BudgetExhausted;
        }
        state.visited.insert(key);
        state.sitemaps_claimed += 1;
        Claim::Scheduled
    }

    /// Number of sitemap fetches claimed so far
    pub fn sitemaps_claimed(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sitemaps_claimed
    }

    /// Returns true if the canonical form of `url` has been claimed
    pub fn is_visited(&self, url: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .visited
            .contains(&canonicalize_url(url))
    }
}
