//! Gateways for reading repository activity through Octocrab.
//!
//! This module provides a trait-based gateway for communicating with the
//! GitHub API. The trait-based design enables mocking in tests while the
//! Octocrab implementation handles real HTTP requests behind the response
//! cache.

mod caching;
mod client;
mod error_mapping;
mod octocrab_impl;

pub use octocrab_impl::OctocrabHostGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::github::error::SyncError;
use crate::github::locator::{OwnerLogin, RepoName};
use crate::github::models::{
    CommitDetail, CommitSummary, IssueDetail, IssueSummary, OwnerKind, PullRequestDetail,
    ReleaseSummary, RepositorySummary,
};

/// Gateway that can read repository activity for an owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostGateway: Send + Sync {
    /// Probe whether the owner is a user or an organisation.
    ///
    /// A failed probe yields [`OwnerKind::Unknown`] rather than an error, so
    /// a pass can still list repositories organisation-style.
    async fn resolve_owner_kind(&self, owner: &OwnerLogin) -> Result<OwnerKind, SyncError>;

    /// List every repository belonging to the owner.
    async fn list_repositories(
        &self,
        owner: &OwnerLogin,
        kind: OwnerKind,
    ) -> Result<Vec<RepositorySummary>, SyncError>;

    /// List issues and pull requests updated since the given instant.
    async fn list_issues(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueSummary>, SyncError>;

    /// Fetch the statistics for a single pull request.
    async fn pull_request_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        number: i64,
    ) -> Result<PullRequestDetail, SyncError>;

    /// Fetch the closer of a single issue.
    async fn issue_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        number: i64,
    ) -> Result<IssueDetail, SyncError>;

    /// List commits on a branch authored since the given instant.
    async fn list_commits(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>, SyncError>;

    /// Fetch per-commit diff statistics.
    async fn commit_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        sha: &str,
    ) -> Result<CommitDetail, SyncError>;

    /// List every release for the repository, drafts included.
    async fn list_releases(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
    ) -> Result<Vec<ReleaseSummary>, SyncError>;
}
