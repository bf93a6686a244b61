//! Application configuration loaded from CLI, environment, and files.
//!
//! Values merge from command-line arguments, environment variables, and
//! configuration files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Lowest to highest:
//!
//! 1. **Defaults** - built-in application defaults
//! 2. **Configuration file** - `.git-insight.toml` in the current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** - `GIT_INSIGHT_OWNER`, `GIT_INSIGHT_TOKEN`,
//!    or legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** - `--owner`/`-o`, `--token`/`-t`, ...
//!
//! # Configuration file
//!
//! ```toml
//! owner = "octocat"
//! repos = ["hello-world"]
//! token = "ghp_example"
//! database_url = "git-insight.sqlite"
//! days = 30
//! show = 5
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::SyncError;

/// Default activity window, in days.
const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Default number of items rendered under each report section.
const DEFAULT_SHOW: usize = 5;

/// Default TTL for cached API responses, in seconds (30 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 1_800;

/// Default `SQLite` database path when none is configured.
const DEFAULT_DATABASE_URL: &str = "git-insight.sqlite";

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment variables
///
/// - `GIT_INSIGHT_OWNER` or `--owner`: user or organisation to analyse
/// - `GIT_INSIGHT_REPOS` or repeated `--repos`: repositories to include
/// - `GIT_INSIGHT_TOKEN`, `GITHUB_TOKEN`, or `--token`: API token
/// - `GIT_INSIGHT_DATABASE_URL` or `--database-url`: local `SQLite` path
/// - `GIT_INSIGHT_DAYS` or `--days`/`-w`: how many days of activity to analyse
/// - `GIT_INSIGHT_SHOW` or `--show`: items to show under each section
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "GIT_INSIGHT",
    discovery(
        dotfile_name = ".git-insight.toml",
        config_file_name = "git-insight.toml",
        app_name = "git-insight"
    )
)]
pub struct InsightConfig {
    /// User or organisation whose repositories are analysed.
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repositories of `owner` to include. Empty means every repository the
    /// owner has.
    #[ortho_config()]
    pub repos: Vec<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Falls back to the legacy `GITHUB_TOKEN` environment variable when no
    /// other source provides a value.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Local `SQLite` database URL/path used for the entity store.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// How many days worth of activity to analyse.
    #[ortho_config(cli_short = 'w')]
    pub days: u32,

    /// How many items to show under each report section.
    #[ortho_config(cli_short = 's')]
    pub show: usize,

    /// TTL for cached API responses, in seconds.
    #[ortho_config()]
    pub cache_ttl_seconds: u64,

    /// Runs database migrations and exits without syncing.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Clears every cached API response before the pass runs.
    #[ortho_config()]
    pub purge_cache: bool,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repos: Vec::new(),
            token: None,
            database_url: None,
            days: DEFAULT_WINDOW_DAYS,
            show: DEFAULT_SHOW,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            migrate_db: false,
            purge_cache: false,
        }
    }
}

impl InsightConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, SyncError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(SyncError::MissingToken)
    }

    /// Returns the owner login or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when no owner is configured.
    pub fn require_owner(&self) -> Result<&str, SyncError> {
        self.owner
            .as_deref()
            .ok_or_else(|| SyncError::Configuration {
                message: "owner is required (use --owner or -o)".to_owned(),
            })
    }

    /// Returns the configured database URL or the built-in default path.
    #[must_use]
    pub fn database_url_or_default(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }
}

#[cfg(test)]
mod tests;
