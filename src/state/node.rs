/// Sitemap node definitions for tracking traversal progress
///
/// This module defines the lifecycle of a single sitemap document during a
/// site's traversal.
use crate::output::{BudgetNote, NodeError, UrlRecord};
use std::fmt;

/// Represents the current state of a sitemap node
///
/// Lifecycle: `Pending → Fetching → Decoded → (Expanded | Terminal | Failed)`.
/// A fetch failure skips `Decoded` and goes straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    // ===== Active States =====
    /// Claimed and scheduled, not yet fetching
    Pending,

    /// Holding a governor slot and waiting on the network
    Fetching,

    /// Document decoded, outcome not yet applied
    Decoded,

    // ===== Terminal States =====
    /// Sitemap index whose children were scheduled (or budget-limited)
    Expanded,

    /// URL set that contributed its entries
    Terminal,

    /// Fetch error or malformed document; contributes nothing
    Failed,
}

impl NodeState {
    /// Returns true if no further processing happens for this node
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expanded | Self::Terminal | Self::Failed)
    }

    /// Returns true if the node is still in flight
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Decoded)
                | (Self::Fetching, Self::Failed)
                | (Self::Decoded, Self::Expanded)
                | (Self::Decoded, Self::Terminal)
                | (Self::Decoded, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Decoded => "decoded",
            Self::Expanded => "expanded",
            Self::Terminal => "terminal",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a node turned out to be once fetched and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Index,
    UrlSet,
    Malformed,
    FetchFailed,
}

/// A sitemap URL being traversed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapNode {
    pub url: String,

    /// Index hops from the root candidate (roots are depth 0)
    pub depth: usize,

    /// Referencing index, kept for error attribution only
    pub parent: Option<String>,

    /// Resolved kind, set once the node reaches a terminal state
    pub kind: Option<NodeKind>,

    pub state: NodeState,
}

impl SitemapNode {
    /// Creates a depth-0 node for a robots-derived or direct candidate
    pub fn root(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            parent: None,
            kind: None,
            state: NodeState::Pending,
        }
    }

    /// Creates a node one level below `parent`
    pub fn child_of(parent: &SitemapNode, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: parent.depth + 1,
            parent: Some(parent.url.clone()),
            kind: None,
            state: NodeState::Pending,
        }
    }

    /// Moves the node to `next`
    pub fn advance(&mut self, next: NodeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid node transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Records the node's kind and moves it to a terminal state
    pub fn resolve(&mut self, kind: NodeKind, terminal: NodeState) {
        debug_assert!(terminal.is_terminal());
        self.kind = Some(kind);
        self.state = terminal;
    }
}

/// Everything one processed node contributes to its site
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    /// The node in its final state
    pub node: SitemapNode,

    /// Page URLs extracted from a URL set
    pub records: Vec<UrlRecord>,

    /// Children claimed for scheduling (sitemap indexes only)
    pub children: Vec<SitemapNode>,

    /// Recorded failure, if the node failed
    pub error: Option<NodeError>,

    /// Budget notes raised while expanding
    pub notes: Vec<BudgetNote>,
}

impl NodeOutcome {
    /// Outcome of a node that contributes nothing but an error
    pub fn failed(mut node: SitemapNode, kind: NodeKind, error: NodeError) -> Self {
        node.resolve(kind, NodeState::Failed);
        Self {
            node,
            records: Vec::new(),
            children: Vec::new(),
            error: Some(error),
            notes: Vec::new(),
        }
    }
}
