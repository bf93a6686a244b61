//! Incremental GitHub activity mirroring and reporting.
//!
//! The library synchronises a GitHub owner's repositories, issues, pull
//! requests, commits, and releases into a local `SQLite` store, then derives
//! per-repository activity reports for a time window and combines them into a
//! single summary. API responses are cached by `(url, method)` so repeated
//! lookups within a run collapse into one origin call.

pub mod cli;
pub mod config;
pub mod github;
pub mod insights;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use config::InsightConfig;
pub use github::{
    ApiToken, HostGateway, OctocrabHostGateway, OwnerKind, OwnerLogin, RepoName, SyncError,
};
pub use insights::{InsightsReport, repo_insights, summarize};
pub use store::{Store, StoreError};
pub use sync::{SyncEngine, SyncOutcome};
