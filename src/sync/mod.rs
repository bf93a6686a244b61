//! Incremental sync orchestration.
//!
//! The engine walks an owner's repositories in phases: refresh the
//! repository list, mirror issue/PR listings, backfill per-item detail,
//! mirror default-branch commits and their statistics, then releases. Each
//! repository is isolated: one failing repository is reported in the outcome
//! and never blocks the others, and its watermark is left untouched so the
//! next run retries the same window.

use chrono::{DateTime, Utc};

use crate::github::{
    HostGateway, IssueSummary, OwnerLogin, RepoName, RepositorySummary, SyncError,
};
use crate::store::{
    CommitListWrite, CommitStatsWrite, IssueKind, IssueListWrite, PullDetailWrite, ReleaseWrite,
    RepositoryWrite, Store,
};

#[cfg(test)]
mod tests;

/// One repository the engine failed to mirror.
#[derive(Debug)]
pub struct RepoFailure {
    /// Repository name.
    pub name: String,
    /// The error that stopped the repository's sync pass.
    pub error: SyncError,
}

/// What a full owner pass achieved.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Repositories mirrored and watermarked in this pass.
    pub synced: Vec<String>,
    /// Repositories whose pass failed; their watermarks were not advanced.
    pub failed: Vec<RepoFailure>,
}

/// Orchestrates the sync phases against a gateway and the entity store.
pub struct SyncEngine<'a> {
    gateway: &'a dyn HostGateway,
    store: &'a Store,
}

impl<'a> SyncEngine<'a> {
    #[must_use]
    pub fn new(gateway: &'a dyn HostGateway, store: &'a Store) -> Self {
        Self { gateway, store }
    }

    /// Runs a full pass for the owner.
    ///
    /// `selection` limits the pass to the named repositories; an empty
    /// selection means every repository the owner has. A repository with a
    /// stored watermark resumes from it; `window_start` is the cutoff only
    /// for repositories that never finished a pass. A completed repository's
    /// watermark advances to the later of its prior value and
    /// `window_start`, so it never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the repository list itself cannot be
    /// refreshed or the cache reaper fails. Per-repository failures are
    /// reported through the outcome instead.
    pub async fn sync_owner(
        &self,
        owner: &OwnerLogin,
        selection: &[String],
        window_start: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let reaped = self.store.purge_expired(Utc::now().timestamp())?;
        if reaped > 0 {
            tracing::debug!(removed = reaped, "reaped expired cache rows");
        }

        let repositories = self.sync_repositories(owner).await?;
        for requested in selection {
            if !repositories.iter().any(|repo| repo.name == *requested) {
                tracing::warn!(owner = %owner, repo = %requested, "requested repository not found");
            }
        }

        let mut outcome = SyncOutcome::default();
        for repository in repositories {
            if !selection.is_empty() && !selection.contains(&repository.name) {
                continue;
            }

            let stored = self
                .store
                .find_repository(owner.as_str(), &repository.name)?
                .and_then(|record| record.synced_at);
            let cutoff = stored.unwrap_or(window_start);

            match self.sync_repository(owner, &repository, cutoff).await {
                Ok(()) => {
                    self.store.set_watermark(
                        owner.as_str(),
                        &repository.name,
                        cutoff.max(window_start),
                    )?;
                    outcome.synced.push(repository.name);
                }
                Err(error) => {
                    tracing::warn!(
                        owner = %owner,
                        repo = %repository.name,
                        %error,
                        "repository sync failed",
                    );
                    outcome.failed.push(RepoFailure {
                        name: repository.name,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Probes the owner kind, lists the repositories, and mirrors them.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the probe, the listing, or a store write
    /// fails.
    pub async fn sync_repositories(
        &self,
        owner: &OwnerLogin,
    ) -> Result<Vec<RepositorySummary>, SyncError> {
        let kind = self.gateway.resolve_owner_kind(owner).await?;
        let repositories = self.gateway.list_repositories(owner, kind).await?;
        tracing::debug!(owner = %owner, ?kind, count = repositories.len(), "listed repositories");

        for repository in &repositories {
            self.store.upsert_repository(RepositoryWrite {
                owner: owner.as_str(),
                name: &repository.name,
                created_at: repository.created_at,
                updated_at: repository.updated_at,
                default_branch: &repository.default_branch,
            })?;
        }

        Ok(repositories)
    }

    async fn sync_repository(
        &self,
        owner: &OwnerLogin,
        repository: &RepositorySummary,
        cutoff: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let repo = RepoName::new(&repository.name)?;

        self.sync_issue_list(owner, &repo, cutoff).await?;
        self.sync_issue_details(owner, &repo, cutoff).await?;
        self.sync_commit_list(owner, &repo, &repository.default_branch, cutoff)
            .await?;
        self.sync_commit_details(owner, &repo, cutoff).await?;
        self.sync_releases(owner, &repo).await?;

        Ok(())
    }

    /// Mirrors the issue/PR listing for activity inside the window.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the listing or a store write fails.
    pub async fn sync_issue_list(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        since: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let issues = self.gateway.list_issues(owner, repo, since).await?;
        tracing::debug!(owner = %owner, repo = %repo, count = issues.len(), "listed issues");

        for issue in &issues {
            self.store.upsert_issue(&issue_list_write(owner, repo, issue))?;
        }

        Ok(())
    }

    /// Backfills detail fields for every listed item whose freshness stamp
    /// trails its update timestamp.
    ///
    /// PRs take their statistics from the pulls API; a PR closed without a
    /// merger and every plain issue fall back to the issues API, whose
    /// `closed_by` is only recorded when present.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a detail fetch or store write fails.
    pub async fn sync_issue_details(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        since: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let candidates = self
            .store
            .issues_updated_after(owner.as_str(), repo.as_str(), since)?;

        for record in candidates.iter().filter(|record| record.needs_detail_fetch()) {
            let now = Utc::now();
            match record.kind {
                IssueKind::Pr => {
                    let detail = self
                        .gateway
                        .pull_request_detail(owner, repo, record.number)
                        .await?;
                    self.store.apply_pull_detail(
                        owner.as_str(),
                        repo.as_str(),
                        record.number,
                        PullDetailWrite {
                            commits: detail.commits,
                            additions: detail.additions,
                            deletions: detail.deletions,
                            changed_files: detail.changed_files,
                            merged_login: detail.merged_by.as_deref(),
                            synced_at: now,
                        },
                    )?;

                    // Closed without a merger: the closing login only exists
                    // on the issues side of the API.
                    if detail.closed_at.is_some() && detail.merged_by.is_none() {
                        let fallback =
                            self.gateway.issue_detail(owner, repo, record.number).await?;
                        if let Some(closed_by) = fallback.closed_by {
                            self.store.record_closed_by(
                                owner.as_str(),
                                repo.as_str(),
                                record.number,
                                &closed_by,
                                now,
                            )?;
                        }
                    }
                }
                IssueKind::Issue => {
                    let detail = self.gateway.issue_detail(owner, repo, record.number).await?;
                    if let Some(closed_by) = detail.closed_by {
                        self.store.record_closed_by(
                            owner.as_str(),
                            repo.as_str(),
                            record.number,
                            &closed_by,
                            now,
                        )?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Mirrors the default-branch commit listing for the window.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the listing or a store write fails.
    pub async fn sync_commit_list(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let commits = self.gateway.list_commits(owner, repo, branch, since).await?;
        tracing::debug!(owner = %owner, repo = %repo, count = commits.len(), "listed commits");

        for commit in &commits {
            self.store.upsert_commit(CommitListWrite {
                owner: owner.as_str(),
                repo: repo.as_str(),
                sha: &commit.sha,
                base: branch,
                author: commit.author.as_deref(),
                committer: commit.committer.as_deref(),
                message: &commit.message,
                created_at: commit.created_at,
            })?;
        }

        Ok(())
    }

    /// Backfills diff statistics for commits that never had theirs fetched.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a detail fetch or store write fails.
    pub async fn sync_commit_details(
        &self,
        owner: &OwnerLogin,
        repo: &RepoName,
        since: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let pending = self
            .store
            .commits_missing_details(owner.as_str(), repo.as_str(), since)?;

        for commit in pending {
            let detail = self.gateway.commit_detail(owner, repo, &commit.sha).await?;
            self.store.apply_commit_stats(
                owner.as_str(),
                repo.as_str(),
                &commit.sha,
                CommitStatsWrite {
                    additions: detail.additions,
                    deletions: detail.deletions,
                    files_changed: detail.files_changed,
                },
            )?;
        }

        Ok(())
    }

    /// Mirrors the repository's releases, dropping drafts.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the listing or a store write fails.
    pub async fn sync_releases(&self, owner: &OwnerLogin, repo: &RepoName) -> Result<(), SyncError> {
        let releases = self.gateway.list_releases(owner, repo).await?;

        for release in releases.iter().filter(|release| !release.draft) {
            self.store.upsert_release(ReleaseWrite {
                owner: owner.as_str(),
                repo: repo.as_str(),
                tag: &release.tag,
                name: release.name.as_deref(),
                author: release.author.as_deref(),
                created_at: release.created_at,
                published_at: release.published_at,
            })?;
        }

        Ok(())
    }
}

fn issue_list_write<'i>(
    owner: &'i OwnerLogin,
    repo: &'i RepoName,
    issue: &'i IssueSummary,
) -> IssueListWrite<'i> {
    IssueListWrite {
        owner: owner.as_str(),
        repo: repo.as_str(),
        number: issue.number,
        kind: issue.kind,
        title: &issue.title,
        state: &issue.state,
        author: issue.author.as_deref(),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        merged_at: issue.merged_at,
        comments: issue.comments,
        reactions: issue.reactions,
    }
}
