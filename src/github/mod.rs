//! GitHub API access for the sync engine.
//!
//! This module wraps Octocrab behind a trait-based gateway so the
//! orchestrator never talks HTTP directly. Raw JSON responses flow through a
//! `(url, method)`-keyed cache in the entity store, and errors are mapped
//! into typed variants so callers can surface precise failures without
//! exposing Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;

pub use error::SyncError;
pub use gateway::{HostGateway, OctocrabHostGateway};
pub use locator::{ApiToken, OwnerLogin, RepoName};
pub use models::{
    CommitDetail, CommitSummary, IssueDetail, IssueSummary, OwnerKind, PullRequestDetail,
    ReleaseSummary, RepositorySummary,
};

#[cfg(test)]
pub use gateway::MockHostGateway;
