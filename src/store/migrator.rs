//! Embedded Diesel migrations for the mirror database.

use std::fmt;

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::StoreError;

/// Migrations shipped with the binary, applied before any sync pass.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Version stamp of the first migration shipped with this crate.
pub const INITIAL_SCHEMA_VERSION: &str = "20260829000000";

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Brings the mirror database up to the newest schema and reports the
/// resulting version through telemetry.
///
/// Safe to run on every start; already-applied migrations are skipped.
///
/// # Errors
///
/// Returns [`StoreError`] when the database cannot be opened, a migration
/// fails, or no schema version is recorded afterwards.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, StoreError> {
    let mut connection = open_connection(database_url)?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| StoreError::MigrationFailed {
            message: error.to_string(),
        })?;
    if !applied.is_empty() {
        tracing::debug!(count = applied.len(), "applied pending migrations");
    }

    let Some(schema_version) = latest_applied_version(&mut connection)? else {
        return Err(StoreError::MissingSchemaVersion);
    };
    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });

    Ok(schema_version)
}

fn open_connection(database_url: &str) -> Result<SqliteConnection, StoreError> {
    let database_url = database_url.trim();
    if database_url.is_empty() {
        return Err(StoreError::BlankDatabaseUrl);
    }

    let mut connection =
        SqliteConnection::establish(database_url).map_err(|error| StoreError::ConnectionFailed {
            message: error.to_string(),
        })?;

    sql_query("PRAGMA foreign_keys = ON;")
        .execute(&mut connection)
        .map_err(|error| StoreError::ForeignKeysEnableFailed {
            message: error.to_string(),
        })?;

    Ok(connection)
}

fn latest_applied_version(
    connection: &mut SqliteConnection,
) -> Result<Option<SchemaVersion>, StoreError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        version: String,
    }

    let row: Option<Row> =
        sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version DESC LIMIT 1;")
            .get_result(connection)
            .optional()
            .map_err(|error| StoreError::SchemaVersionQueryFailed {
                message: error.to_string(),
            })?;

    Ok(row.map(|row| SchemaVersion(row.version)))
}
