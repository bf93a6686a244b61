//! Tests for configuration defaults, CLI parsing, and token resolution.

use ortho_config::OrthoConfig;
use rstest::rstest;

use super::InsightConfig;

#[rstest]
fn cli_short_flags_parse_without_colliding() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();

    let _guard = env_lock::lock_env([
        ("GIT_INSIGHT_OWNER", None::<&str>),
        ("GIT_INSIGHT_DAYS", None),
        ("GIT_INSIGHT_SHOW", None),
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
    ]);

    let args: Vec<std::ffi::OsString> = ["git-insight", "-o", "octocat", "-w", "14", "-s", "3"]
        .iter()
        .map(std::ffi::OsString::from)
        .collect();
    let config = InsightConfig::load_from_iter(args).expect("config should load");

    assert_eq!(config.owner.as_deref(), Some("octocat"));
    assert_eq!(config.days, 14, "-w should set the activity window");
    assert_eq!(config.show, 3, "-s should set the section cap");
    assert!(config.database_url.is_none(), "--database-url keeps its own flag");
}

#[rstest]
fn defaults_cover_window_show_and_ttl() {
    let config = InsightConfig::default();

    assert_eq!(config.days, 30, "default window should be 30 days");
    assert_eq!(config.show, 5, "default section cap should be 5");
    assert_eq!(
        config.cache_ttl_seconds, 1_800,
        "default cache TTL should be 30 minutes"
    );
    assert!(config.repos.is_empty());
    assert!(!config.migrate_db);
    assert!(!config.purge_cache);
}

#[rstest]
fn database_url_falls_back_to_default_path() {
    let config = InsightConfig::default();
    assert_eq!(config.database_url_or_default(), "git-insight.sqlite");

    let config = InsightConfig {
        database_url: Some("custom.sqlite".to_owned()),
        ..InsightConfig::default()
    };
    assert_eq!(config.database_url_or_default(), "custom.sqlite");
}

#[rstest]
fn resolve_token_prefers_configured_value() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);

    let config = InsightConfig {
        token: Some("configured-token".to_owned()),
        ..InsightConfig::default()
    };

    assert_eq!(
        config.resolve_token().expect("token should resolve"),
        "configured-token"
    );
}

#[rstest]
fn resolve_token_falls_back_to_legacy_github_token() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);

    let config = InsightConfig::default();

    assert_eq!(
        config.resolve_token().expect("token should resolve"),
        "legacy-token"
    );
}

#[rstest]
fn resolve_token_errors_when_no_source_provides_a_value() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);

    let config = InsightConfig::default();

    assert!(config.resolve_token().is_err());
}

#[rstest]
fn require_owner_errors_when_unset() {
    let config = InsightConfig::default();
    assert!(config.require_owner().is_err());

    let config = InsightConfig {
        owner: Some("octocat".to_owned()),
        ..InsightConfig::default()
    };
    assert_eq!(config.require_owner().expect("owner should be set"), "octocat");
}
