//! Data models for GitHub API payloads.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into the public summary types the gateway trait returns. The
//! summaries carry exactly what the sync phases persist; everything else in
//! the payloads is dropped here.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::store::{IssueKind, ReactionCounts};

/// The kind of account an owner login resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    /// A user account.
    User,
    /// An organisation account.
    Org,
    /// The probe failed or returned an unrecognised type; listing falls back
    /// to organisation-style.
    Unknown,
}

/// Repository fields consumed by the repository refresh phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    /// Repository name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Default branch name.
    pub default_branch: String,
}

/// Issue/PR fields consumed by the issue list phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    /// Issue/PR number.
    pub number: i64,
    /// Title.
    pub title: String,
    /// State (`open` or `closed`).
    pub state: String,
    /// Author login if present.
    pub author: Option<String>,
    /// Issue or pull request, classified by the presence of pull-request
    /// data in the listing payload.
    pub kind: IssueKind,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Close timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Merge timestamp, for merged PRs.
    pub merged_at: Option<DateTime<Utc>>,
    /// Comment count.
    pub comments: i64,
    /// Normalised reaction counters.
    pub reactions: ReactionCounts,
}

/// PR statistics consumed by the issue detail phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDetail {
    /// PR commit count.
    pub commits: i64,
    /// Added lines.
    pub additions: i64,
    /// Deleted lines.
    pub deletions: i64,
    /// Changed file count.
    pub changed_files: i64,
    /// Merger login when the PR was merged.
    pub merged_by: Option<String>,
    /// Close timestamp; `Some` with no merger means the closed-by login has
    /// to come from the issue API instead.
    pub closed_at: Option<DateTime<Utc>>,
}

/// Fields consumed by the issue-detail fallback fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDetail {
    /// Login that closed the issue, when known.
    pub closed_by: Option<String>,
}

/// Commit fields consumed by the commit list phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Commit SHA.
    pub sha: String,
    /// Author login if present.
    pub author: Option<String>,
    /// Committer login if present.
    pub committer: Option<String>,
    /// First line of the commit message.
    pub message: String,
    /// Author timestamp (committer timestamp when the author's is absent).
    pub created_at: DateTime<Utc>,
}

/// Per-commit statistics consumed by the commit detail phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitDetail {
    /// Added lines.
    pub additions: i64,
    /// Deleted lines.
    pub deletions: i64,
    /// Changed file count.
    pub files_changed: i64,
}

/// Release fields consumed by the release phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Release name when set.
    pub name: Option<String>,
    /// Release tag.
    pub tag: String,
    /// Whether the release is a draft; drafts are dropped at ingestion.
    pub draft: bool,
    /// Author login if present.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiActor {
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiAccount {
    #[serde(rename = "type")]
    pub(super) kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) name: String,
    pub(super) created_at: Option<DateTime<Utc>>,
    pub(super) updated_at: Option<DateTime<Utc>>,
    pub(super) default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestMarker {
    #[serde(default)]
    pub(super) merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssue {
    pub(super) number: i64,
    #[serde(default)]
    pub(super) title: Option<String>,
    pub(super) state: String,
    #[serde(default)]
    pub(super) user: Option<ApiActor>,
    #[serde(default)]
    pub(super) pull_request: Option<ApiPullRequestMarker>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
    #[serde(default)]
    pub(super) closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(super) comments: i64,
    #[serde(default)]
    pub(super) reactions: ReactionCounts,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestDetail {
    #[serde(default)]
    pub(super) commits: i64,
    #[serde(default)]
    pub(super) additions: i64,
    #[serde(default)]
    pub(super) deletions: i64,
    #[serde(default)]
    pub(super) changed_files: i64,
    #[serde(default)]
    pub(super) merged_by: Option<ApiActor>,
    #[serde(default)]
    pub(super) closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssueDetail {
    #[serde(default)]
    pub(super) closed_by: Option<ApiActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitIdent {
    #[serde(default)]
    pub(super) date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitInner {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) author: Option<ApiCommitIdent>,
    #[serde(default)]
    pub(super) committer: Option<ApiCommitIdent>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommit {
    pub(super) sha: String,
    #[serde(default)]
    pub(super) author: Option<ApiActor>,
    #[serde(default)]
    pub(super) committer: Option<ApiActor>,
    pub(super) commit: ApiCommitInner,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitStats {
    #[serde(default)]
    pub(super) additions: i64,
    #[serde(default)]
    pub(super) deletions: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitDetail {
    #[serde(default)]
    pub(super) stats: Option<ApiCommitStats>,
    #[serde(default)]
    pub(super) files: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRelease {
    #[serde(default)]
    pub(super) name: Option<String>,
    pub(super) tag_name: String,
    #[serde(default)]
    pub(super) draft: bool,
    #[serde(default)]
    pub(super) author: Option<ApiActor>,
    #[serde(default)]
    pub(super) created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(super) published_at: Option<DateTime<Utc>>,
}

fn actor_login(actor: Option<ApiActor>) -> Option<String> {
    actor.and_then(|actor| actor.login)
}

impl From<ApiRepository> for RepositorySummary {
    fn from(value: ApiRepository) -> Self {
        Self {
            name: value.name,
            created_at: value.created_at.unwrap_or(DateTime::UNIX_EPOCH),
            updated_at: value.updated_at.unwrap_or(DateTime::UNIX_EPOCH),
            default_branch: value.default_branch.unwrap_or_else(|| "main".to_owned()),
        }
    }
}

impl From<ApiIssue> for IssueSummary {
    fn from(value: ApiIssue) -> Self {
        let kind = if value.pull_request.is_some() {
            IssueKind::Pr
        } else {
            IssueKind::Issue
        };
        let merged_at = value
            .pull_request
            .as_ref()
            .and_then(|marker| marker.merged_at);

        Self {
            number: value.number,
            title: value.title.unwrap_or_default(),
            state: value.state,
            author: actor_login(value.user),
            kind,
            created_at: value.created_at,
            updated_at: value.updated_at,
            closed_at: value.closed_at,
            merged_at,
            comments: value.comments,
            reactions: value.reactions,
        }
    }
}

impl From<ApiPullRequestDetail> for PullRequestDetail {
    fn from(value: ApiPullRequestDetail) -> Self {
        Self {
            commits: value.commits,
            additions: value.additions,
            deletions: value.deletions,
            changed_files: value.changed_files,
            merged_by: actor_login(value.merged_by),
            closed_at: value.closed_at,
        }
    }
}

impl From<ApiIssueDetail> for IssueDetail {
    fn from(value: ApiIssueDetail) -> Self {
        Self {
            closed_by: actor_login(value.closed_by),
        }
    }
}

impl From<ApiCommit> for CommitSummary {
    fn from(value: ApiCommit) -> Self {
        let created_at = value
            .commit
            .author
            .as_ref()
            .and_then(|ident| ident.date)
            .or_else(|| value.commit.committer.as_ref().and_then(|ident| ident.date))
            .unwrap_or(DateTime::UNIX_EPOCH);
        let message = value
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .to_owned();

        Self {
            sha: value.sha,
            author: actor_login(value.author),
            committer: actor_login(value.committer),
            message,
            created_at,
        }
    }
}

impl From<ApiCommitDetail> for CommitDetail {
    fn from(value: ApiCommitDetail) -> Self {
        let (additions, deletions) = value
            .stats
            .map_or((0, 0), |stats| (stats.additions, stats.deletions));
        let files_changed = value
            .files
            .map_or(0, |files| i64::try_from(files.len()).unwrap_or(i64::MAX));

        Self {
            additions,
            deletions,
            files_changed,
        }
    }
}

impl From<ApiRelease> for ReleaseSummary {
    fn from(value: ApiRelease) -> Self {
        Self {
            name: value.name,
            tag: value.tag_name,
            draft: value.draft,
            author: actor_login(value.author),
            created_at: value.created_at.unwrap_or(DateTime::UNIX_EPOCH),
            published_at: value.published_at,
        }
    }
}
