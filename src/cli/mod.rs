//! CLI driving code: one pass of sync followed by the merged report.
//!
//! Output formatting utilities are in [`output`].

use std::io;

use chrono::{Duration, Utc};

use crate::config::InsightConfig;
use crate::github::{ApiToken, OctocrabHostGateway, OwnerLogin, SyncError};
use crate::insights::{InsightsReport, repo_insights, summarize};
use crate::store::{Store, migrate_database};
use crate::sync::SyncEngine;
use crate::telemetry::TracingTelemetrySink;

pub mod output;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Runs one sync pass for the configured owner and prints the merged report
/// to stdout.
///
/// A purge request clears the response cache before the pass. Repositories
/// that fail to sync are still reported from whatever the store holds, and
/// their names surface in the final error so the process exits non-zero.
///
/// # Errors
///
/// Returns [`SyncError`] when configuration is incomplete, the database or
/// gateway cannot be opened, the repository list cannot be refreshed, or any
/// repository failed its pass.
pub async fn run(config: &InsightConfig) -> Result<(), SyncError> {
    let database_url = config.database_url_or_default().to_owned();
    let schema_version = migrate_database(&database_url, &TracingTelemetrySink)?;
    if config.migrate_db {
        tracing::info!(version = %schema_version, "database schema is up to date");
        return Ok(());
    }
    let store = Store::new(database_url)?;

    if config.purge_cache {
        let removed = store.purge_all_responses()?;
        tracing::info!(removed, "cleared the response cache");
    }

    let owner = OwnerLogin::new(config.require_owner()?)?;
    let token = ApiToken::new(config.resolve_token()?)?;
    let gateway = OctocrabHostGateway::for_token(
        &token,
        GITHUB_API_BASE,
        store.clone(),
        config.cache_ttl_seconds,
    )?;

    let engine = SyncEngine::new(&gateway, &store);
    let window_start = Utc::now() - Duration::days(i64::from(config.days));
    let outcome = engine
        .sync_owner(&owner, &config.repos, window_start)
        .await?;

    let merged = summarize(collect_reports(&store, &owner, config)?);
    let mut stdout = io::stdout().lock();
    output::write_report(&mut stdout, &merged, config.days, config.show)?;

    if outcome.failed.is_empty() {
        Ok(())
    } else {
        let names: Vec<&str> = outcome
            .failed
            .iter()
            .map(|failure| failure.name.as_str())
            .collect();
        Err(SyncError::Api {
            message: format!("sync failed for: {}", names.join(", ")),
        })
    }
}

fn collect_reports(
    store: &Store,
    owner: &OwnerLogin,
    config: &InsightConfig,
) -> Result<Vec<InsightsReport>, SyncError> {
    let window_start = Utc::now() - Duration::days(i64::from(config.days));
    let mirrored = store.repositories_for_owner(owner.as_str())?;

    let mut reports = Vec::new();
    for repository in mirrored {
        if !config.repos.is_empty() && !config.repos.contains(&repository.name) {
            continue;
        }
        if let Some(report) =
            repo_insights(store, owner.as_str(), &repository.name, window_start)?
        {
            reports.push(report);
        }
    }

    Ok(reports)
}
