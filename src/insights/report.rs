//! Report types produced by the insight queries.

use std::collections::BTreeMap;

use crate::store::{CommitRecord, IssueRecord, ReleaseRecord};

/// Commit activity on one branch inside the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchActivity {
    /// Commit count.
    pub commits: i64,
    /// Added lines across the commits with fetched statistics.
    pub additions: i64,
    /// Deleted lines across the commits with fetched statistics.
    pub deletions: i64,
    /// Changed files across the commits with fetched statistics.
    pub files_changed: i64,
    /// Commit counts per author login.
    pub authors: BTreeMap<String, i64>,
}

/// Pull request activity across every branch inside the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullActivity {
    /// Pull request count.
    pub pulls: i64,
    /// Commit count across the PRs with fetched statistics.
    pub commits: i64,
    /// Added lines across the PRs with fetched statistics.
    pub additions: i64,
    /// Deleted lines across the PRs with fetched statistics.
    pub deletions: i64,
    /// Changed files across the PRs with fetched statistics.
    pub changed_files: i64,
    /// Pull request counts per author login.
    pub authors: BTreeMap<String, i64>,
}

/// Windowed activity for one repository, or several once merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightsReport {
    /// Owner login; merged reports join distinct owners with `", "`.
    pub owner: String,
    /// Repository name; merged reports join the names with `", "`.
    pub repo: String,
    /// Default branch of the repository; merged reports read `main`.
    pub default_branch: String,
    /// Open PRs with activity inside the window.
    pub open_pulls: Vec<IssueRecord>,
    /// PRs merged inside the window.
    pub merged_pulls: Vec<IssueRecord>,
    /// PRs closed inside the window.
    pub closed_pulls: Vec<IssueRecord>,
    /// Issues opened inside the window and still open.
    pub open_issues: Vec<IssueRecord>,
    /// Issues closed inside the window.
    pub closed_issues: Vec<IssueRecord>,
    /// Items opened before the window that saw activity inside it.
    pub unresolved_conversations: Vec<IssueRecord>,
    /// Commit activity on the default branch.
    pub main_branch: BranchActivity,
    /// PR activity across every branch.
    pub all_branches: PullActivity,
    /// Releases published inside the window.
    pub releases: Vec<ReleaseRecord>,
}

impl InsightsReport {
    /// Commits from `records` tallied into a branch activity block.
    #[must_use]
    pub fn branch_activity(records: &[CommitRecord]) -> BranchActivity {
        let mut activity = BranchActivity {
            commits: i64::try_from(records.len()).unwrap_or(i64::MAX),
            ..BranchActivity::default()
        };

        for record in records {
            activity.additions += record.additions.unwrap_or(0);
            activity.deletions += record.deletions.unwrap_or(0);
            activity.files_changed += record.files_changed.unwrap_or(0);
            if let Some(login) = record.author.as_ref().or(record.committer.as_ref()) {
                *activity.authors.entry(login.clone()).or_insert(0) += 1;
            }
        }

        activity
    }

    /// PRs from `records` tallied into a pull activity block. Rows whose
    /// detail phase never ran contribute zeros to the line statistics.
    #[must_use]
    pub fn pull_activity(records: &[IssueRecord]) -> PullActivity {
        let mut activity = PullActivity {
            pulls: i64::try_from(records.len()).unwrap_or(i64::MAX),
            ..PullActivity::default()
        };

        for record in records {
            activity.commits += record.commits.unwrap_or(0);
            activity.additions += record.additions.unwrap_or(0);
            activity.deletions += record.deletions.unwrap_or(0);
            activity.changed_files += record.changed_files.unwrap_or(0);
            if let Some(login) = record.author.as_ref() {
                *activity.authors.entry(login.clone()).or_insert(0) += 1;
            }
        }

        activity
    }
}
