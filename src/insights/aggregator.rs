//! Builds a per-repository report from the entity store.

use chrono::{DateTime, Utc};

use crate::store::{Store, StoreError};

use super::report::InsightsReport;

/// Assembles the windowed report for one repository.
///
/// Returns `None` when the repository was never mirrored; every bucket is
/// answered from the store alone, so this works offline once a sync pass has
/// run.
///
/// # Errors
///
/// Returns [`StoreError`] when any of the queries fail.
pub fn repo_insights(
    store: &Store,
    owner: &str,
    repo: &str,
    since: DateTime<Utc>,
) -> Result<Option<InsightsReport>, StoreError> {
    let Some(repository) = store.find_repository(owner, repo)? else {
        return Ok(None);
    };

    let open_pulls = store.open_pulls(owner, repo, since)?;
    let merged_pulls = store.merged_pulls(owner, repo, since)?;
    let closed_pulls = store.closed_pulls(owner, repo, since)?;
    let open_issues = store.open_issues(owner, repo, since)?;
    let closed_issues = store.closed_issues(owner, repo, since)?;
    let unresolved_conversations = store.unresolved_conversations(owner, repo, since)?;

    let branch_commits = store.commits_on_branch(owner, repo, &repository.default_branch, since)?;
    let main_branch = InsightsReport::branch_activity(&branch_commits);

    // Every PR with window activity, open or closed, merged included.
    let mut all_pulls = open_pulls.clone();
    all_pulls.extend(closed_pulls.iter().cloned());
    let all_branches = InsightsReport::pull_activity(&all_pulls);

    let releases = store.releases_published_after(owner, repo, since)?;

    Ok(Some(InsightsReport {
        owner: owner.to_owned(),
        repo: repo.to_owned(),
        default_branch: repository.default_branch,
        open_pulls,
        merged_pulls,
        closed_pulls,
        open_issues,
        closed_issues,
        unresolved_conversations,
        main_branch,
        all_branches,
        releases,
    }))
}
