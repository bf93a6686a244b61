//! Release collection, keyed by `(owner, repo, tag)`.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};

use chrono::{DateTime, Utc};

use super::records::{ReleaseRecord, ReleaseWrite};
use super::{
    Store, StoreError, from_unix, map_query_error, map_write_error, opt_from_unix, opt_to_unix,
    to_unix,
};

const TABLE: &str = "releases";

#[derive(Debug, QueryableByName)]
struct Row {
    #[diesel(sql_type = Text)]
    owner: String,
    #[diesel(sql_type = Text)]
    repo: String,
    #[diesel(sql_type = Text)]
    tag: String,
    #[diesel(sql_type = Nullable<Text>)]
    name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    author: Option<String>,
    #[diesel(sql_type = BigInt)]
    created_at: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    published_at: Option<i64>,
}

impl From<Row> for ReleaseRecord {
    fn from(row: Row) -> Self {
        Self {
            owner: row.owner,
            repo: row.repo,
            tag: row.tag,
            name: row.name,
            author: row.author,
            created_at: from_unix(row.created_at),
            published_at: opt_from_unix(row.published_at),
        }
    }
}

const SELECT: &str =
    "SELECT owner, repo, tag, name, author, created_at, published_at FROM releases";

impl Store {
    /// Inserts or refreshes a release row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn upsert_release(&self, write: ReleaseWrite<'_>) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "INSERT INTO releases (owner, repo, tag, name, author, created_at, published_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(owner, repo, tag) DO UPDATE SET \
               name = excluded.name, \
               author = excluded.author, \
               created_at = excluded.created_at, \
               published_at = excluded.published_at;",
        )
        .bind::<Text, _>(write.owner)
        .bind::<Text, _>(write.repo)
        .bind::<Text, _>(write.tag)
        .bind::<Nullable<Text>, _>(write.name)
        .bind::<Nullable<Text>, _>(write.author)
        .bind::<BigInt, _>(to_unix(write.created_at))
        .bind::<Nullable<BigInt>, _>(opt_to_unix(write.published_at))
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Fetches one release by its natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn find_release(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<ReleaseRecord>, StoreError> {
        let mut connection = self.connection()?;

        let result: Option<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND tag = ? LIMIT 1;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<Text, _>(tag)
        .get_result(&mut connection)
        .optional()
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(result.map(ReleaseRecord::from))
    }

    /// Releases published after the cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn releases_published_after(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ReleaseRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND repo = ? AND published_at IS NOT NULL \
             AND published_at > ? ORDER BY published_at DESC;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(repo)
        .bind::<BigInt, _>(to_unix(since))
        .get_results(&mut connection)
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(ReleaseRecord::from).collect())
    }
}
