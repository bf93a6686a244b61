//! git-insight CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use git_insight::{InsightConfig, SyncError, cli};
use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let config = load_config()?;
    cli::run(&config).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<InsightConfig, SyncError> {
    InsightConfig::load().map_err(|error| SyncError::Configuration {
        message: error.to_string(),
    })
}
