//! Error types for entity store operations.

use thiserror::Error;

/// Errors returned while opening, migrating, or querying the local `SQLite`
/// store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Enabling foreign key enforcement failed.
    #[error("failed to enable foreign keys: {message}")]
    ForeignKeysEnableFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// A read query failed.
    #[error("store query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// An insert or update failed.
    #[error("store write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A query or write hit a database whose schema was never migrated.
    #[error("store schema is not initialised; run migrations first")]
    SchemaNotInitialised,

    /// Serialising or deserialising a stored JSON column failed.
    #[error("stored value could not be (de)serialised: {message}")]
    Serialisation {
        /// Error detail from serde.
        message: String,
    },
}
