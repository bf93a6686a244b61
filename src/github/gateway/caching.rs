//! Response-caching transport shared by the Octocrab gateway methods.

use chrono::Utc;
use octocrab::Octocrab;

use crate::github::error::SyncError;
use crate::store::Store;

use super::error_mapping::map_octocrab_error;

const CACHED_METHOD: &str = "GET";

/// Octocrab transport that memoises GET responses in the `SQLite` response
/// cache.
///
/// The cache key is the full request path including query string and page
/// parameters, so each page of a listing is its own entry. A cached row is
/// served even past its expiry stamp; the reaper in the sync engine is the
/// only thing that retires stale rows.
pub(super) struct CachingTransport {
    client: Octocrab,
    store: Store,
    ttl_seconds: u64,
}

impl CachingTransport {
    pub(super) fn new(client: Octocrab, store: Store, ttl_seconds: u64) -> Self {
        Self {
            client,
            store,
            ttl_seconds,
        }
    }

    fn expires_at(&self, now_unix: i64) -> i64 {
        let ttl_unix = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        now_unix.saturating_add(ttl_unix)
    }

    /// Fetches `path_and_query` as JSON, serving from the cache when a row
    /// for the signature exists.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the cache cannot be read or written, the
    /// request fails, or a cached body no longer parses as JSON.
    pub(super) async fn get_json(
        &self,
        operation: &str,
        path_and_query: &str,
    ) -> Result<serde_json::Value, SyncError> {
        if let Some(entry) = self.store.cached_response(path_and_query, CACHED_METHOD)? {
            tracing::debug!(path = path_and_query, "serving cached response");
            return serde_json::from_str(&entry.body).map_err(|error| SyncError::Api {
                message: format!("{operation} cached response parse failed: {error}"),
            });
        }

        let value: serde_json::Value = self
            .client
            .get(path_and_query, None::<&()>)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let body = serde_json::to_string(&value).map_err(|error| SyncError::Api {
            message: format!("{operation} response serialisation failed: {error}"),
        })?;
        let now = Utc::now().timestamp();
        self.store
            .store_response(path_and_query, CACHED_METHOD, self.expires_at(now), &body)?;

        Ok(value)
    }
}
