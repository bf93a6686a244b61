//! Windowed activity reports over the mirrored entities.
//!
//! Reports are assembled per repository from the store, then folded into a
//! single multi-repository view for presentation. No network access happens
//! here.

mod aggregator;
mod merge;
mod report;

pub use aggregator::repo_insights;
pub use merge::{merge_reports, summarize};
pub use report::{BranchActivity, InsightsReport, PullActivity};
