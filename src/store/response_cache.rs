//! Cached API responses, keyed by `(url, method)`.
//!
//! Rows carry an `expires_at_unix` stamp but reads never check it: a live row
//! is returned unconditionally, and only [`Store::purge_expired`] (a
//! best-effort reaper) removes stale rows. The cache is deduplication, not a
//! freshness guarantee.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};

use super::{Store, StoreError, map_query_error, map_write_error};

const TABLE: &str = "response_cache";

/// One cached response row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponseRecord {
    /// Response body as serialised JSON.
    pub body: String,
    /// Unix timestamp after which the reaper may remove the row.
    pub expires_at_unix: i64,
}

#[derive(Debug, QueryableByName)]
struct Row {
    #[diesel(sql_type = Text)]
    body: String,
    #[diesel(sql_type = BigInt)]
    expires_at_unix: i64,
}

impl Store {
    /// Looks up a cached response by its request signature.
    ///
    /// Expiry is deliberately not consulted here; see the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn cached_response(
        &self,
        url: &str,
        method: &str,
    ) -> Result<Option<CachedResponseRecord>, StoreError> {
        let mut connection = self.connection()?;

        let result: Option<Row> = sql_query(
            "SELECT body, expires_at_unix FROM response_cache \
             WHERE url = ? AND method = ? LIMIT 1;",
        )
        .bind::<Text, _>(url)
        .bind::<Text, _>(method)
        .get_result(&mut connection)
        .optional()
        .map_err(|error| map_query_error(&mut connection, TABLE, &error))?;

        Ok(result.map(|row| CachedResponseRecord {
            body: row.body,
            expires_at_unix: row.expires_at_unix,
        }))
    }

    /// Inserts or replaces a cached response.
    ///
    /// Concurrent writers for the same signature converge on one row via the
    /// `(url, method)` uniqueness constraint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the write fails.
    pub fn store_response(
        &self,
        url: &str,
        method: &str,
        expires_at_unix: i64,
        body: &str,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection()?;

        sql_query(
            "INSERT INTO response_cache (url, method, expires_at_unix, body) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(url, method) DO UPDATE SET \
               expires_at_unix = excluded.expires_at_unix, \
               body = excluded.body;",
        )
        .bind::<Text, _>(url)
        .bind::<Text, _>(method)
        .bind::<BigInt, _>(expires_at_unix)
        .bind::<Text, _>(body)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Removes rows past their expiry stamp. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the delete fails.
    pub fn purge_expired(&self, now_unix: i64) -> Result<usize, StoreError> {
        let mut connection = self.connection()?;

        sql_query("DELETE FROM response_cache WHERE expires_at_unix <= ?;")
            .bind::<BigInt, _>(now_unix)
            .execute(&mut connection)
            .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }

    /// Removes every cached response. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema is missing or the delete fails.
    pub fn purge_all_responses(&self) -> Result<usize, StoreError> {
        let mut connection = self.connection()?;

        sql_query("DELETE FROM response_cache;")
            .execute(&mut connection)
            .map_err(|error| map_write_error(&mut connection, TABLE, &error))
    }
}
