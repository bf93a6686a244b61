//! Local entity store backed by `SQLite`.
//!
//! One durable collection exists per entity kind (repositories, issues,
//! commits, releases, cached responses), each addressable by its natural key.
//! Writes are idempotent upserts (`INSERT ... ON CONFLICT ... DO UPDATE`);
//! nothing is deleted except expired or purged cache rows. The schema is
//! managed with Diesel migrations so the database can be created and upgraded
//! consistently across machines.

mod commits;
mod error;
mod issues;
mod migrator;
mod records;
mod releases;
mod repositories;
mod response_cache;

pub use error::StoreError;
pub use migrator::{INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database};
pub use records::{
    CommitListWrite, CommitRecord, CommitStatsWrite, IssueKind, IssueListWrite, IssueRecord,
    PullDetailWrite, ReactionCounts, ReleaseRecord, ReleaseWrite, RepositoryRecord,
    RepositoryWrite,
};
pub use response_cache::CachedResponseRecord;

use chrono::{DateTime, Utc};
use diesel::Connection;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

/// Handle to the local entity store.
///
/// Opens a fresh connection per operation so the handle stays cheap to clone
/// and pass by reference into the orchestrator and aggregator.
#[derive(Debug, Clone)]
pub struct Store {
    database_url: String,
}

impl Store {
    /// Creates a store handle targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, StoreError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(StoreError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    /// Returns the database URL/path this store targets.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub(crate) fn connection(&self) -> Result<SqliteConnection, StoreError> {
        let mut connection = SqliteConnection::establish(&self.database_url).map_err(|error| {
            StoreError::ConnectionFailed {
                message: error.to_string(),
            }
        })?;

        sql_query("PRAGMA foreign_keys = ON;")
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| StoreError::ForeignKeysEnableFailed {
                message: error.to_string(),
            })?;

        Ok(connection)
    }
}

/// Converts a stored unix-seconds value to a UTC timestamp.
pub(crate) fn from_unix(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Converts a UTC timestamp to the stored unix-seconds representation.
pub(crate) fn to_unix(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp()
}

pub(crate) fn opt_from_unix(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.map(from_unix)
}

pub(crate) fn opt_to_unix(timestamp: Option<DateTime<Utc>>) -> Option<i64> {
    timestamp.map(to_unix)
}

fn table_exists(
    connection: &mut SqliteConnection,
    table: &str,
) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    let row: Row = sql_query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
    )
    .bind::<Text, _>(table)
    .get_result(connection)?;

    Ok(row.count > 0)
}

fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
    create_error: F,
) -> StoreError
where
    F: Fn(String) -> StoreError,
{
    match table_exists(connection, table) {
        Ok(false) => StoreError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}

pub(crate) fn map_query_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> StoreError {
    map_error_with_schema_check(connection, table, error, |message| StoreError::QueryFailed {
        message,
    })
}

pub(crate) fn map_write_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> StoreError {
    map_error_with_schema_check(connection, table, error, |message| StoreError::WriteFailed {
        message,
    })
}

#[cfg(test)]
mod tests;
