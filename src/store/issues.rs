//! Issue/pull request collection, keyed by `(owner, repo, number)`.
//!
//! Issues and pull requests share one collection; `kind` distinguishes them.
//! The list phase owns the descriptive columns, the detail phases fill in
//! `closed_by`, `merged_by`, the PR statistics, and the per-issue `synced_at`
//! freshness stamp.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};

use chrono::{DateTime, Utc};

use super::records::{IssueKind, IssueListWrite, IssueRecord, PullDetailWrite, ReactionCounts};
use super::{
    Store, StoreError, from_unix, map_query_error, map_write_error, opt_from_unix, opt_to_unix,
    to_unix,
};

const TABLE: &str = "issues";

#[derive(Debug, QueryableByName)]
struct Row {
    #[diesel(sql_type = Text)]
    owner: String,
    #[diesel(sql_type = Text)]
    repo: String,
    #[diesel(sql_type = BigInt)]
    number: i64,
    #[diesel(sql_type = Text)]
    kind: String,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    state: String,
    #[diesel(sql_type = Nullable<Text>)]
    author: Option<String>,
    #[diesel(sql_type = BigInt)]
    created_at: i64,
    #[diesel(sql_type = BigInt)]
    updated_at: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    closed_at: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    closed_by: Option<String>,
    #[diesel(sql_type = Nullable<BigInt>)]
    merged_at: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    merged_by: Option<String>,
    #[diesel(sql_type = BigInt)]
    comments: i64,
    #[diesel(sql_type = Text)]
    reactions: String,
    #[diesel(sql_type = Nullable<BigInt>)]
    synced_at: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    commits: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    additions: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    deletions: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    changed_files: Option<i64>,
}

impl From<Row> for IssueRecord {
    fn from(row: Row) -> Self {
        // A malformed reactions column reads as all-zero counters rather
        // than failing the whole query.
        let reactions: ReactionCounts =
            serde_json::from_str(&row.reactions).unwrap_or_default();

        Self {
            owner: row.owner,
            repo: row.repo,
            number: row.number,
            kind: IssueKind::from_stored(&row.kind),
            title: row.title,
            state: row.state,
            author: row.author,
            created_at: from_unix(row.created_at),
            updated_at: from_unix(row.updated_at),
            closed_at: opt_from_unix(row.closed_at),
            closed_by: row.closed_by,
            merged_at: opt_from_unix(row.merged_at),
            merged_by: row.merged_by,
            comments: row.comments,
            reactions,
            synced_at: opt_from_unix(row.synced_at),
            commits: row.commits,
            additions: row.additions,
            deletions: row.deletions,
            changed_files: row.changed_files,
        }
    }
}

const SELECT: &str = "SELECT owner, repo, number, kind, title, state, author, created_at, \
                      updated_at, closed_at, closed_by, merged_at, merged_by, comments, \
                      reactions, synced_at, commits, additions, deletions, changed_files \
                      FROM issues";

impl Store {
    /// Inserts or refreshes an issue row with list-phase fields.
    ///
    /// Detail-phase columns (`closed_by`, `merged_by`, PR statistics, and the
    /// per-issue `synced_at`) are preserved on update so re-listing an issue
    /// never discards detail data.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn upsert_issue(&self, write: &IssueListWrite<'_>) -> Result<(), StoreError> {
        let reactions =
            serde_json::to_string(&write.reactions).map_err(|error| StoreError::Serialisation {
                message: error.to_string(),
            })?;

        let mut connection = self.connection()?;

        sql_query(
            "INSERT INTO issues \
             (owner, repo, number, kind, title, state, author, created_at, updated_at, \
              closed_at, merged_at, comments, reactions) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(owner, repo, number) DO UPDATE SET \
               kind = excluded.kind, \
               title = excluded.title, \
               state = excluded.state, \
               author = excluded.author, \
               created_at = excluded.created_at, \
               updated_at = excluded.updated_at, \
               closed_at = excluded.closed_at, \
               merged_at = excluded.merged_at, \
               comments = excluded.comments, \
               reactions = excluded.reactions;",
        )
        .bind::<Text, _>(write.owner)
        .bind::<Text, _>(write.repo)
        .bind::<BigInt, _>(write.number)
        .bind::<Text, _>(write.kind.as_str())
        .bind::<Text, _>(write.title)
        .bind::<Text, _>(write.state)
        .bind::<Nullable<Text>, _>(write.author)
        .bind::<BigInt, _>(to_unix(write.created_at))
        .bind::<BigInt, _>(to_unix(write.updated_at))
        .bind::<Nullable<BigInt>, _>(opt_to_unix(write.closed_at))
        .bind::<Nullable<BigInt>, _>(opt_to_unix(write.merged_at))
        .bind::<BigInt, _>(write.comments)
        .bind::<Text, _>(reactions)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Applies pull request detail statistics and stamps the per-issue
    /// freshness watermark.
    ///
    /// When a merger login is present it is recorded as both `merged_by` and
    /// `closed_by`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn apply_pull_detail(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        write: PullDetailWrite<'_>,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "UPDATE issues SET \
               commits = ?, \
               additions = ?, \
               deletions = ?, \
               changed_files = ?, \
               merged_by = COALESCE(?, merged_by), \
               closed_by = COALESCE(?, closed_by), \
               synced_at = ? \
             WHERE owner = ? AND repo = ? AND number = ?;",
        )
        .bind::<BigInt, _>(write.commits)
        .bind::<BigInt, _>(write.additions)
        .bind::<BigInt, _>(write.deletions)
        .bind::<BigInt, _>(write.changed_files)
        .bind::<Nullable<Text>, _>(write.merged_login)
        .bind::<Nullable<Text>, _>(write.merged_login)
        .bind::<BigInt, _>(to_unix(write.synced_at))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(number)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Records the closing login from the issue-detail fallback and stamps
    /// the per-issue freshness watermark.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn record_closed_by(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
        closed_by: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "UPDATE issues SET closed_by = ?, synced_at = ? \
             WHERE owner = ? AND repo = ? AND number = ?;",
        )
        .bind::<Text, _>(closed_by)
        .bind::<BigInt, _>(to_unix(synced_at))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(number)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Fetches one issue by its natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn find_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<IssueRecord>, StoreError> {
        let mut connection = self.connection()?;

        let result: Option<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND number = ? LIMIT 1;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(number)
        .get_result(&mut connection)
        .optional()
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(result.map(IssueRecord::from))
    }

    /// Issues and PRs updated after the cutoff, candidates for the detail
    /// phase.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn issues_updated_after(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!("{SELECT} WHERE owner = ? AND repo = ? AND updated_at > ? ORDER BY number;"),
            owner,
            repo,
            since,
        )
    }

    /// PRs still open that saw activity inside the window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn open_pulls(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!(
                "{SELECT} WHERE owner = ? AND repo = ? AND kind = 'pr' AND state = 'open' \
                 AND updated_at > ? ORDER BY number;"
            ),
            owner,
            repo,
            since,
        )
    }

    /// PRs merged inside the window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn merged_pulls(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!(
                "{SELECT} WHERE owner = ? AND repo = ? AND kind = 'pr' AND state = 'closed' \
                 AND merged_at IS NOT NULL AND merged_at > ? ORDER BY number;"
            ),
            owner,
            repo,
            since,
        )
    }

    /// PRs closed inside the window (merged or not).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn closed_pulls(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!(
                "{SELECT} WHERE owner = ? AND repo = ? AND kind = 'pr' AND state = 'closed' \
                 AND closed_at IS NOT NULL AND closed_at > ? ORDER BY number;"
            ),
            owner,
            repo,
            since,
        )
    }

    /// Issues opened inside the window and still open.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn open_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!(
                "{SELECT} WHERE owner = ? AND repo = ? AND kind = 'issue' AND state = 'open' \
                 AND created_at > ? ORDER BY number;"
            ),
            owner,
            repo,
            since,
        )
    }

    /// Issues closed inside the window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn closed_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        self.issue_query(
            format!(
                "{SELECT} WHERE owner = ? AND repo = ? AND kind = 'issue' AND state = 'closed' \
                 AND closed_at IS NOT NULL AND closed_at > ? ORDER BY number;"
            ),
            owner,
            repo,
            since,
        )
    }

    /// Conversations opened before the window but still active inside it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn unresolved_conversations(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND state = 'open' \
             AND created_at < ? AND updated_at > ? ORDER BY number;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(to_unix(since))
        .bind::<BigInt, _>(to_unix(since))
        .get_results(&mut connection)
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(IssueRecord::from).collect())
    }

    fn issue_query(
        &self,
        sql: String,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(sql)
            .bind::<Text, _>(owner)
            .bind::<Text, _>(repo)
            .bind::<BigInt, _>(to_unix(since))
            .get_results(&mut connection)
            .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(IssueRecord::from).collect())
    }
}
