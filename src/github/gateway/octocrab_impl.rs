//! Octocrab-backed [`HostGateway`] with page-level response caching.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use url::form_urlencoded::byte_serialize;

use crate::github::error::SyncError;
use crate::github::locator::{ApiToken, OwnerLogin, RepoName};
use crate::github::models::{
    ApiAccount, ApiCommit, ApiCommitDetail, ApiIssue, ApiIssueDetail, ApiPullRequestDetail,
    ApiRelease, ApiRepository, CommitDetail, CommitSummary, IssueDetail, IssueSummary, OwnerKind,
    PullRequestDetail, ReleaseSummary, RepositorySummary,
};
use crate::store::Store;

use super::HostGateway;
use super::caching::CachingTransport;
use super::client::build_octocrab_client;

const PER_PAGE: usize = 100;

/// Gateway that reads repository activity through the GitHub REST API,
/// memoising every page it fetches in the response cache.
pub struct OctocrabHostGateway {
    transport: CachingTransport,
}

impl OctocrabHostGateway {
    /// Builds a gateway for the given token, API base URL, and response
    /// cache store.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the Octocrab client cannot be constructed.
    pub fn for_token(
        token: &ApiToken,
        api_base: &str,
        store: Store,
        ttl_seconds: u64,
    ) -> Result<Self, SyncError> {
        let client = build_octocrab_client(token, api_base)?;
        Ok(Self {
            transport: CachingTransport::new(client, store, ttl_seconds),
        })
    }

    fn parse_items<T: DeserializeOwned>(
        operation: &str,
        value: serde_json::Value,
    ) -> Result<Vec<T>, SyncError> {
        serde_json::from_value(value).map_err(|error| SyncError::Api {
            message: format!("{operation} response deserialisation failed: {error}"),
        })
    }

    fn parse_item<T: DeserializeOwned>(
        operation: &str,
        value: serde_json::Value,
    ) -> Result<T, SyncError> {
        serde_json::from_value(value).map_err(|error| SyncError::Api {
            message: format!("{operation} response deserialisation failed: {error}"),
        })
    }

    /// Walks a listing endpoint page by page until a short page arrives.
    ///
    /// Each page is cached under its own `page` parameter, so replaying a
    /// listing within the TTL never touches the network.
    async fn paged<T: DeserializeOwned>(
        &self,
        operation: &str,
        base_path: &str,
    ) -> Result<Vec<T>, SyncError> {
        let separator = if base_path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let path = format!("{base_path}{separator}per_page={PER_PAGE}&page={page}");
            let value = self.transport.get_json(operation, &path).await?;
            let batch: Vec<T> = Self::parse_items(operation, value)?;
            let fetched = batch.len();
            items.extend(batch);

            if fetched < PER_PAGE {
                return Ok(items);
            }
            page += 1;
        }
    }
}

fn encode_query_value(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn since_parameter(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl HostGateway for OctocrabHostGateway {
    async fn resolve_owner_kind(&self, owner: &OwnerLogin) -> Result<OwnerKind, SyncError> {
        let path = format!("/users/{owner}");
        // A failed probe never aborts the pass; unknown owners fall back to
        // organisation-style listing.
        let value = match self.transport.get_json("owner probe", &path).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(owner = %owner, %error, "owner probe failed");
                return Ok(OwnerKind::Unknown);
            }
        };

        let account: ApiAccount = Self::parse_item("owner probe", value)?;
        Ok(match account.kind.as_deref() {
            Some("User") => OwnerKind::User,
            Some("Organization") => OwnerKind::Org,
            _ => OwnerKind::Unknown,
        })
    }

    async fn list_repositories(
        &self,
        owner: &OwnerLogin,
        kind: OwnerKind,
    ) -> Result<Vec<RepositorySummary>, SyncError> {
        // Unknown owners are listed organisation-style.
        let path = match kind {
            OwnerKind::User => format!("/users/{owner}/repos"),
            OwnerKind::Org | OwnerKind::Unknown => format!("/orgs/{owner}/repos"),
        };

        let repositories: Vec<ApiRepository> = self.paged("repository listing", &path).await?;
        Ok(repositories.into_iter().map(Into::into).collect())
    }

    async fn list_issues(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueSummary>, SyncError> {
        let path = format!(
            "/repos/{owner}/{repo}/issues?state=all&since={since}",
            since = encode_query_value(&since_parameter(since)),
        );

        let issues: Vec<ApiIssue> = self.paged("issue listing", &path).await?;
        Ok(issues.into_iter().map(Into::into).collect())
    }

    async fn pull_request_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        number: i64,
    ) -> Result<PullRequestDetail, SyncError> {
        let path = format!("/repos/{owner}/{repo}/pulls/{number}");
        let value = self.transport.get_json("pull request detail", &path).await?;
        let detail: ApiPullRequestDetail = Self::parse_item("pull request detail", value)?;
        Ok(detail.into())
    }

    async fn issue_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        number: i64,
    ) -> Result<IssueDetail, SyncError> {
        let path = format!("/repos/{owner}/{repo}/issues/{number}");
        let value = self.transport.get_json("issue detail", &path).await?;
        let detail: ApiIssueDetail = Self::parse_item("issue detail", value)?;
        Ok(detail.into())
    }

    async fn list_commits(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>, SyncError> {
        let path = format!(
            "/repos/{owner}/{repo}/commits?sha={branch}&since={since}",
            branch = encode_query_value(branch),
            since = encode_query_value(&since_parameter(since)),
        );

        let commits: Vec<ApiCommit> = self.paged("commit listing", &path).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn commit_detail(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        sha: &str,
    ) -> Result<CommitDetail, SyncError> {
        let path = format!("/repos/{owner}/{repo}/commits/{sha}");
        let value = self.transport.get_json("commit detail", &path).await?;
        let detail: ApiCommitDetail = Self::parse_item("commit detail", value)?;
        Ok(detail.into())
    }

    async fn list_releases(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
    ) -> Result<Vec<ReleaseSummary>, SyncError> {
        let path = format!("/repos/{owner}/{repo}/releases");
        let releases: Vec<ApiRelease> = self.paged("release listing", &path).await?;
        Ok(releases.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{encode_query_value, since_parameter};

    #[test]
    fn since_parameter_uses_zulu_rfc3339() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 1, 10, 30, 0).single();
        let instant = instant.unwrap_or_default();
        assert_eq!(since_parameter(instant), "2026-08-01T10:30:00Z");
    }

    #[test]
    fn branch_names_with_slashes_are_percent_encoded() {
        assert_eq!(encode_query_value("release/v1"), "release%2Fv1");
    }
}
