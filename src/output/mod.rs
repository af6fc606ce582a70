//! Output module: the result model of a harvest run
//!
//! This module handles:
//! - The records a traversal produces (URLs, errors, budget notes)
//! - Merging per-node outcomes into one `SiteResult` per site
//! - Batch-level statistics for the benchmarking and reporting layer

mod aggregate;
mod record;
pub mod stats;

pub use aggregate::{aggregate, ResultAggregator, SiteResult};
pub use record::{BudgetNote, BudgetReason, ErrorKind, NodeError, UrlRecord};
pub use stats::{count_errors, print_statistics, summarize, BatchStatistics};
