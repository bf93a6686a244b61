//! Commit collection, keyed by `(owner, repo, sha)`.
//!
//! The list phase writes core fields; a missing `files_changed` marks the
//! per-commit detail fetch as still pending.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};

use chrono::{DateTime, Utc};

use super::records::{CommitListWrite, CommitRecord, CommitStatsWrite};
use super::{Store, StoreError, from_unix, map_query_error, map_write_error, to_unix};

const TABLE: &str = "commits";

#[derive(Debug, QueryableByName)]
struct Row {
    #[diesel(sql_type = Text)]
    owner: String,
    #[diesel(sql_type = Text)]
    repo: String,
    #[diesel(sql_type = Text)]
    sha: String,
    #[diesel(sql_type = Text)]
    base: String,
    #[diesel(sql_type = Nullable<Text>)]
    author: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    committer: Option<String>,
    #[diesel(sql_type = Text)]
    message: String,
    #[diesel(sql_type = BigInt)]
    created_at: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    additions: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    deletions: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    files_changed: Option<i64>,
}

impl From<Row> for CommitRecord {
    fn from(row: Row) -> Self {
        Self {
            owner: row.owner,
            repo: row.repo,
            sha: row.sha,
            base: row.base,
            author: row.author,
            committer: row.committer,
            message: row.message,
            created_at: from_unix(row.created_at),
            additions: row.additions,
            deletions: row.deletions,
            files_changed: row.files_changed,
        }
    }
}

const SELECT: &str = "SELECT owner, repo, sha, base, author, committer, message, created_at, \
                      additions, deletions, files_changed \
                      FROM commits";

impl Store {
    /// Inserts or refreshes a commit row with list-phase fields.
    ///
    /// Detail statistics are preserved on update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn upsert_commit(&self, write: CommitListWrite<'_>) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "INSERT INTO commits \
             (owner, repo, sha, base, author, committer, message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(owner, repo, sha) DO UPDATE SET \
               base = excluded.base, \
               author = excluded.author, \
               committer = excluded.committer, \
               message = excluded.message, \
               created_at = excluded.created_at;",
        )
        .bind::<Text, _>(write.owner)
        .bind::<Text, _>(write.repo)
        .bind::<Text, _>(write.sha)
        .bind::<Text, _>(write.base)
        .bind::<Nullable<Text>, _>(write.author)
        .bind::<Nullable<Text>, _>(write.committer)
        .bind::<Text, _>(write.message)
        .bind::<BigInt, _>(to_unix(write.created_at))
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Applies per-commit statistics from the detail phase.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn apply_commit_stats(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        write: CommitStatsWrite,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "UPDATE commits SET additions = ?, deletions = ?, files_changed = ? \
             WHERE owner = ? AND repo = ? AND sha = ?;",
        )
        .bind::<BigInt, _>(write.additions)
        .bind::<BigInt, _>(write.deletions)
        .bind::<BigInt, _>(write.files_changed)
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<Text, _>(sha)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Fetches one commit by its natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn find_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Option<CommitRecord>, StoreError> {
        let mut connection = self.connection()?;

        let result: Option<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND sha = ? LIMIT 1;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<Text, _>(sha)
        .get_result(&mut connection)
        .optional()
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(result.map(CommitRecord::from))
    }

    /// Commits in the window whose detail statistics were never fetched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn commits_missing_details(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND created_at > ? \
             AND files_changed IS NULL ORDER BY created_at;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(to_unix(since))
        .get_results(&mut connection)
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(CommitRecord::from).collect())
    }

    /// Commits on the given branch created after the cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn commits_on_branch(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND base = ? AND created_at > ? \
             ORDER BY created_at;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<Text, _>(base)
        .bind::<BigInt, _>(to_unix(since))
        .get_results(&mut connection)
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(CommitRecord::from).collect())
    }
}
