//! Domain records held by the entity store and the write payloads each sync
//! phase applies to them.
//!
//! Reads return full records; writes use phase-specific payload structs so it
//! stays visible which fields the list phase owns and which the detail phases
//! fill in later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an issue row represents a plain issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Plain issue.
    Issue,
    /// Pull request (the listing endpoint returns both shapes).
    Pr,
}

impl IssueKind {
    /// Stored string form of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Pr => "pr",
        }
    }

    /// Parses the stored string form; anything unrecognised reads as an
    /// issue.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        if value == "pr" { Self::Pr } else { Self::Issue }
    }
}

/// Fixed-shape reaction counters, all zero by default.
///
/// The listing endpoint omits counters that are zero; constructing this type
/// with `#[serde(default)]` fields normalises every row at ingestion instead
/// of patching gaps at each call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    /// Total reaction count across all kinds.
    #[serde(default)]
    pub total_count: i64,
    /// Thumbs-up reactions.
    #[serde(default, rename = "+1")]
    pub plus_one: i64,
    /// Thumbs-down reactions.
    #[serde(default, rename = "-1")]
    pub minus_one: i64,
    /// Laugh reactions.
    #[serde(default)]
    pub laugh: i64,
    /// Confused reactions.
    #[serde(default)]
    pub confused: i64,
    /// Heart reactions.
    #[serde(default)]
    pub heart: i64,
    /// Hooray reactions.
    #[serde(default)]
    pub hooray: i64,
    /// Eyes reactions.
    #[serde(default)]
    pub eyes: i64,
    /// Rocket reactions.
    #[serde(default)]
    pub rocket: i64,
}

/// A mirrored repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// Owner login. Part of the natural key.
    pub owner: String,
    /// Repository name. Part of the natural key.
    pub name: String,
    /// Creation timestamp reported by the platform.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp reported by the platform.
    pub updated_at: DateTime<Utc>,
    /// Default branch name.
    pub default_branch: String,
    /// Watermark of the last successful full sync pass; `None` until the
    /// first pass completes.
    pub synced_at: Option<DateTime<Utc>>,
}

/// Repository fields written by the repository refresh phase.
///
/// The watermark is deliberately absent: only the orchestrator's watermark
/// commit mutates `synced_at`.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryWrite<'a> {
    /// Owner login.
    pub owner: &'a str,
    /// Repository name.
    pub name: &'a str,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Default branch name.
    pub default_branch: &'a str,
}

/// A mirrored issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    /// Owner login. Part of the natural key.
    pub owner: String,
    /// Repository name. Part of the natural key.
    pub repo: String,
    /// Issue/PR number. Part of the natural key.
    pub number: i64,
    /// Issue or pull request.
    pub kind: IssueKind,
    /// Title.
    pub title: String,
    /// State (`open` or `closed`).
    pub state: String,
    /// Author login if known.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Close timestamp, when closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Login that closed the issue, when known (detail phase).
    pub closed_by: Option<String>,
    /// Merge timestamp, for merged PRs.
    pub merged_at: Option<DateTime<Utc>>,
    /// Login that merged the PR, when known (detail phase).
    pub merged_by: Option<String>,
    /// Comment count.
    pub comments: i64,
    /// Normalised reaction counters.
    pub reactions: ReactionCounts,
    /// When the detail fields were last refreshed; `synced_at >= updated_at`
    /// means detail data is current.
    pub synced_at: Option<DateTime<Utc>>,
    /// PR commit count (detail phase).
    pub commits: Option<i64>,
    /// PR added lines (detail phase).
    pub additions: Option<i64>,
    /// PR deleted lines (detail phase).
    pub deletions: Option<i64>,
    /// PR changed file count (detail phase).
    pub changed_files: Option<i64>,
}

impl IssueRecord {
    /// Returns true when the detail phase still has to (re)fetch this row.
    #[must_use]
    pub fn needs_detail_fetch(&self) -> bool {
        self.synced_at.is_none_or(|synced_at| synced_at < self.updated_at)
    }
}

/// Issue fields written by the list phase.
#[derive(Debug, Clone)]
pub struct IssueListWrite<'a> {
    /// Owner login.
    pub owner: &'a str,
    /// Repository name.
    pub repo: &'a str,
    /// Issue/PR number.
    pub number: i64,
    /// Issue or pull request.
    pub kind: IssueKind,
    /// Title.
    pub title: &'a str,
    /// State.
    pub state: &'a str,
    /// Author login if known.
    pub author: Option<&'a str>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Close timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
    /// Comment count.
    pub comments: i64,
    /// Normalised reaction counters.
    pub reactions: ReactionCounts,
}

/// PR statistics written by the pull request detail step.
#[derive(Debug, Clone, Copy)]
pub struct PullDetailWrite<'a> {
    /// PR commit count.
    pub commits: i64,
    /// Added lines.
    pub additions: i64,
    /// Deleted lines.
    pub deletions: i64,
    /// Changed file count.
    pub changed_files: i64,
    /// Merger login; also recorded as `closed_by` when present.
    pub merged_login: Option<&'a str>,
    /// Detail watermark stamp.
    pub synced_at: DateTime<Utc>,
}

/// A mirrored commit on the repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Owner login. Part of the natural key.
    pub owner: String,
    /// Repository name. Part of the natural key.
    pub repo: String,
    /// Commit SHA. Part of the natural key.
    pub sha: String,
    /// Branch the commit was listed on.
    pub base: String,
    /// Author login if known.
    pub author: Option<String>,
    /// Committer login if known.
    pub committer: Option<String>,
    /// First line of the commit message.
    pub message: String,
    /// Author timestamp.
    pub created_at: DateTime<Utc>,
    /// Added lines (detail phase).
    pub additions: Option<i64>,
    /// Deleted lines (detail phase).
    pub deletions: Option<i64>,
    /// Changed file count (detail phase); absence marks the detail fetch as
    /// still pending.
    pub files_changed: Option<i64>,
}

/// Commit fields written by the list phase.
#[derive(Debug, Clone, Copy)]
pub struct CommitListWrite<'a> {
    /// Owner login.
    pub owner: &'a str,
    /// Repository name.
    pub repo: &'a str,
    /// Commit SHA.
    pub sha: &'a str,
    /// Branch the commit was listed on.
    pub base: &'a str,
    /// Author login if known.
    pub author: Option<&'a str>,
    /// Committer login if known.
    pub committer: Option<&'a str>,
    /// First line of the commit message.
    pub message: &'a str,
    /// Author timestamp.
    pub created_at: DateTime<Utc>,
}

/// Commit statistics written by the detail phase.
#[derive(Debug, Clone, Copy)]
pub struct CommitStatsWrite {
    /// Added lines.
    pub additions: i64,
    /// Deleted lines.
    pub deletions: i64,
    /// Changed file count.
    pub files_changed: i64,
}

/// A mirrored, non-draft release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Owner login. Part of the natural key.
    pub owner: String,
    /// Repository name. Part of the natural key.
    pub repo: String,
    /// Release tag. Part of the natural key.
    pub tag: String,
    /// Release name when set.
    pub name: Option<String>,
    /// Author login if known.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Publication timestamp; `None` for unpublished releases.
    pub published_at: Option<DateTime<Utc>>,
}

/// Release fields written by the release phase.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseWrite<'a> {
    /// Owner login.
    pub owner: &'a str,
    /// Repository name.
    pub repo: &'a str,
    /// Release tag.
    pub tag: &'a str,
    /// Release name when set.
    pub name: Option<&'a str>,
    /// Author login if known.
    pub author: Option<&'a str>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
}
