//! Repository collection, keyed by `(owner, name)`.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};

use chrono::{DateTime, Utc};

use super::records::{RepositoryRecord, RepositoryWrite};
use super::{Store, StoreError, from_unix, map_query_error, map_write_error, opt_from_unix, to_unix};

const TABLE: &str = "repositories";

#[derive(Debug, QueryableByName)]
struct Row {
    #[diesel(sql_type = Text)]
    owner: String,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = BigInt)]
    created_at: i64,
    #[diesel(sql_type = BigInt)]
    updated_at: i64,
    #[diesel(sql_type = Text)]
    default_branch: String,
    #[diesel(sql_type = Nullable<BigInt>)]
    synced_at: Option<i64>,
}

impl From<Row> for RepositoryRecord {
    fn from(row: Row) -> Self {
        Self {
            owner: row.owner,
            name: row.name,
            created_at: from_unix(row.created_at),
            updated_at: from_unix(row.updated_at),
            default_branch: row.default_branch,
            synced_at: opt_from_unix(row.synced_at),
        }
    }
}

const SELECT: &str = "SELECT owner, name, created_at, updated_at, default_branch, synced_at \
                      FROM repositories";

impl Store {
    /// Inserts or refreshes a repository row.
    ///
    /// The watermark (`synced_at`) is left untouched on update; only
    /// [`Store::set_watermark`] advances it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn upsert_repository(&self, write: RepositoryWrite<'_>) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "INSERT INTO repositories (owner, name, created_at, updated_at, default_branch) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(owner, name) DO UPDATE SET \
               created_at = excluded.created_at, \
               updated_at = excluded.updated_at, \
               default_branch = excluded.default_branch;",
        )
        .bind::<Text, _>(write.owner)
        .bind::<Text, _>(write.name)
        .bind::<BigInt, _>(to_unix(write.created_at))
        .bind::<BigInt, _>(to_unix(write.updated_at))
        .bind::<Text, _>(write.default_branch)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Advances the repository watermark after a successful full sync pass.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] when no matching row exists.
    pub fn set_watermark(
        &self,
        owner: &str,
        name: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        let affected = sql_query(
            "UPDATE repositories SET synced_at = ? WHERE owner = ? AND name = ?;",
        )
        .bind::<BigInt, _>(to_unix(synced_at))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(name)
        .execute(&mut connection)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))?;

        if affected == 0 {
            return Err(StoreError::WriteFailed {
                message: format!("no repository row for {owner}/{name}"),
            });
        }

        Ok(())
    }

    /// Fetches one repository by its natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn find_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositoryRecord>, StoreError> {
        let mut connection = self.connection()?;

        let result: Option<Row> = sql_query(format!(
            "{SELECT} WHERE owner = ? AND name = ? LIMIT 1;"
        ))
        .bind::<Text, _>(owner)
        .bind::<Text, _>(name)
        .get_result(&mut connection)
        .optional()
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(result.map(RepositoryRecord::from))
    }

    /// Lists every repository stored for an owner.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn repositories_for_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<RepositoryRecord>, StoreError> {
        let mut connection = self.connection()?;

        let rows: Vec<Row> = sql_query(format!("{SELECT} WHERE owner = ? ORDER BY name;"))
            .bind::<Text, _>(owner)
            .get_results(&mut connection)
            .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(rows.into_iter().map(RepositoryRecord::from).collect())
    }
}
