//! Tests for the sync engine's phase orchestration.

use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::github::{
    CommitDetail, CommitSummary, IssueDetail, IssueSummary, MockHostGateway, OwnerKind,
    OwnerLogin, PullRequestDetail, ReleaseSummary, RepoName, RepositorySummary, SyncError,
};
use crate::store::{IssueKind, ReactionCounts, RepositoryWrite, Store, migrate_database};
use crate::telemetry::NoopTelemetrySink;

use super::SyncEngine;

struct EngineFixture {
    // Held so the backing file outlives the store handle.
    _dir: TempDir,
    store: Store,
}

#[fixture]
fn engine_fixture() -> EngineFixture {
    let dir = TempDir::new().expect("temp dir should be created");
    let database_url = dir
        .path()
        .join("sync.sqlite")
        .to_string_lossy()
        .into_owned();
    migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");
    let store = Store::new(database_url).expect("store should open");
    EngineFixture { _dir: dir, store }
}

fn ts(offset_days: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_756_000_000, 0).expect("timestamp should parse")
        + Duration::days(offset_days)
}

fn owner() -> OwnerLogin {
    OwnerLogin::new("octo").expect("login should validate")
}

fn repo() -> RepoName {
    RepoName::new("widget").expect("name should validate")
}

fn repository(name: &str) -> RepositorySummary {
    RepositorySummary {
        name: name.to_owned(),
        created_at: ts(-100),
        updated_at: ts(-1),
        default_branch: "main".to_owned(),
    }
}

fn pull_summary(number: i64, closed: bool) -> IssueSummary {
    IssueSummary {
        number,
        title: "improve the widget".to_owned(),
        state: if closed { "closed" } else { "open" }.to_owned(),
        author: Some("alice".to_owned()),
        kind: IssueKind::Pr,
        created_at: ts(-5),
        updated_at: ts(-1),
        closed_at: closed.then(|| ts(-1)),
        merged_at: None,
        comments: 2,
        reactions: ReactionCounts::default(),
    }
}

fn empty_listing_expectations(gateway: &mut MockHostGateway) {
    gateway
        .expect_list_issues()
        .returning(|_, _, _| Ok(Vec::new()));
    gateway
        .expect_list_commits()
        .returning(|_, _, _, _| Ok(Vec::new()));
    gateway
        .expect_list_releases()
        .returning(|_, _| Ok(Vec::new()));
}

#[rstest]
#[tokio::test]
async fn owner_pass_watermarks_only_selected_repositories(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::User));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget"), repository("gadget")]));
    empty_listing_expectations(&mut gateway);

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let outcome = engine
        .sync_owner(&owner(), &["widget".to_owned()], ts(-30))
        .await
        .expect("pass should succeed");

    assert_eq!(outcome.synced, vec!["widget".to_owned()]);
    assert!(outcome.failed.is_empty());

    let widget = engine_fixture
        .store
        .find_repository("octo", "widget")
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(widget.synced_at, Some(ts(-30)));

    // The unselected repository is mirrored but never watermarked.
    let gadget = engine_fixture
        .store
        .find_repository("octo", "gadget")
        .expect("query should succeed")
        .expect("row should exist");
    assert!(gadget.synced_at.is_none());
}

#[rstest]
#[tokio::test]
async fn stored_watermark_bounds_the_fetch_cutoff(engine_fixture: EngineFixture) {
    engine_fixture
        .store
        .upsert_repository(RepositoryWrite {
            owner: "octo",
            name: "widget",
            created_at: ts(-100),
            updated_at: ts(-1),
            default_branch: "main",
        })
        .expect("seed should succeed");
    engine_fixture
        .store
        .set_watermark("octo", "widget", ts(-30))
        .expect("watermark should persist");

    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::User));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget")]));
    gateway
        .expect_list_issues()
        .withf(|_, _, since| *since == ts(-30))
        .returning(|_, _, _| Ok(Vec::new()));
    gateway
        .expect_list_commits()
        .withf(|_, _, _, since| *since == ts(-30))
        .returning(|_, _, _, _| Ok(Vec::new()));
    gateway
        .expect_list_releases()
        .returning(|_, _| Ok(Vec::new()));

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let outcome = engine
        .sync_owner(&owner(), &[], ts(-10))
        .await
        .expect("pass should succeed");
    assert!(outcome.failed.is_empty());

    let widget = engine_fixture
        .store
        .find_repository("octo", "widget")
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(widget.synced_at, Some(ts(-10)));
}

#[rstest]
#[tokio::test]
async fn watermark_never_moves_backwards(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::User));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget")]));
    empty_listing_expectations(&mut gateway);

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    for window_start in [ts(-5), ts(-40)] {
        engine
            .sync_owner(&owner(), &[], window_start)
            .await
            .expect("pass should succeed");
    }

    // The wider second window must not regress the first pass's watermark.
    let widget = engine_fixture
        .store
        .find_repository("octo", "widget")
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(widget.synced_at, Some(ts(-5)));
}

#[rstest]
#[tokio::test]
async fn merged_pull_records_merger_without_an_issue_fallback(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::Org));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget")]));
    gateway.expect_list_issues().returning(|_, _, _| {
        let mut pull = pull_summary(7, true);
        pull.merged_at = Some(ts(-1));
        Ok(vec![pull])
    });
    gateway.expect_pull_request_detail().returning(|_, _, _| {
        Ok(PullRequestDetail {
            commits: 4,
            additions: 120,
            deletions: 8,
            changed_files: 3,
            merged_by: Some("carol".to_owned()),
            closed_at: Some(ts(-1)),
        })
    });
    gateway.expect_issue_detail().never();
    gateway
        .expect_list_commits()
        .returning(|_, _, _, _| Ok(Vec::new()));
    gateway
        .expect_list_releases()
        .returning(|_, _| Ok(Vec::new()));

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let outcome = engine
        .sync_owner(&owner(), &[], ts(-30))
        .await
        .expect("pass should succeed");
    assert!(outcome.failed.is_empty());

    let record = engine_fixture
        .store
        .find_issue("octo", "widget", 7)
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(record.merged_by.as_deref(), Some("carol"));
    assert_eq!(record.closed_by.as_deref(), Some("carol"));
    assert_eq!(record.commits, Some(4));
    assert!(!record.needs_detail_fetch());
}

#[rstest]
#[tokio::test]
async fn closed_unmerged_pull_takes_its_closer_from_the_issue_api(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::User));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget")]));
    gateway
        .expect_list_issues()
        .returning(|_, _, _| Ok(vec![pull_summary(9, true)]));
    gateway.expect_pull_request_detail().returning(|_, _, _| {
        Ok(PullRequestDetail {
            commits: 1,
            additions: 2,
            deletions: 2,
            changed_files: 1,
            merged_by: None,
            closed_at: Some(ts(-1)),
        })
    });
    gateway.expect_issue_detail().times(1).returning(|_, _, _| {
        Ok(IssueDetail {
            closed_by: Some("dave".to_owned()),
        })
    });
    gateway
        .expect_list_commits()
        .returning(|_, _, _, _| Ok(Vec::new()));
    gateway
        .expect_list_releases()
        .returning(|_, _| Ok(Vec::new()));

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    engine
        .sync_owner(&owner(), &[], ts(-30))
        .await
        .expect("pass should succeed");

    let record = engine_fixture
        .store
        .find_issue("octo", "widget", 9)
        .expect("query should succeed")
        .expect("row should exist");
    assert!(record.merged_by.is_none());
    assert_eq!(record.closed_by.as_deref(), Some("dave"));
}

#[rstest]
#[tokio::test]
async fn failing_repository_is_reported_and_keeps_no_watermark(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_resolve_owner_kind()
        .returning(|_| Ok(OwnerKind::User));
    gateway
        .expect_list_repositories()
        .returning(|_, _| Ok(vec![repository("widget"), repository("gadget")]));
    gateway.expect_list_issues().returning(|_, repo, _| {
        if repo.as_str() == "widget" {
            Err(SyncError::Api {
                message: "issue listing failed with status 500: boom".to_owned(),
            })
        } else {
            Ok(Vec::new())
        }
    });
    gateway
        .expect_list_commits()
        .returning(|_, _, _, _| Ok(Vec::new()));
    gateway
        .expect_list_releases()
        .returning(|_, _| Ok(Vec::new()));

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let outcome = engine
        .sync_owner(&owner(), &[], ts(-30))
        .await
        .expect("pass should succeed overall");

    assert_eq!(outcome.synced, vec!["gadget".to_owned()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].name, "widget");

    let widget = engine_fixture
        .store
        .find_repository("octo", "widget")
        .expect("query should succeed")
        .expect("row should exist");
    assert!(widget.synced_at.is_none());
}

#[rstest]
#[tokio::test]
async fn stale_detail_is_refetched_after_new_listing_activity(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    // First pass: PR merged at ts(-8), detail stamped at that point.
    // Second pass: the listing reports activity newer than the stamp, whole
    // seconds to match the store's timestamp resolution.
    let fresh = DateTime::from_timestamp(Utc::now().timestamp() + 3_600, 0)
        .expect("timestamp should parse");
    let mut updated_at = ts(-8);
    gateway.expect_list_issues().returning(move |_, _, _| {
        let mut pull = pull_summary(11, true);
        pull.updated_at = updated_at;
        pull.merged_at = Some(ts(-8));
        updated_at = fresh;
        Ok(vec![pull])
    });
    gateway
        .expect_pull_request_detail()
        .times(2)
        .returning(|_, _, _| {
            Ok(PullRequestDetail {
                commits: 2,
                additions: 30,
                deletions: 3,
                changed_files: 2,
                merged_by: Some("carol".to_owned()),
                closed_at: Some(ts(-8)),
            })
        });

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let since = ts(-30);
    for _ in 0..2 {
        engine
            .sync_issue_list(&owner(), &repo(), since)
            .await
            .expect("list phase should succeed");
        engine
            .sync_issue_details(&owner(), &repo(), since)
            .await
            .expect("detail phase should succeed");
    }

    let record = engine_fixture
        .store
        .find_issue("octo", "widget", 11)
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(record.updated_at, fresh);
    // The second detail stamp still trails the future-dated activity, so
    // the row stays a candidate until the activity is in the past.
    assert!(record.synced_at.is_some());
}

#[rstest]
#[tokio::test]
async fn commit_details_are_fetched_once_per_commit(engine_fixture: EngineFixture) {
    let sha = "6e3ad42";
    let mut gateway = MockHostGateway::new();
    gateway
        .expect_list_commits()
        .returning(move |_, _, _, _| {
            Ok(vec![CommitSummary {
                sha: sha.to_owned(),
                author: Some("alice".to_owned()),
                committer: Some("alice".to_owned()),
                message: "tighten the widget".to_owned(),
                created_at: ts(-2),
            }])
        });
    gateway
        .expect_commit_detail()
        .times(1)
        .returning(|_, _, _| {
            Ok(CommitDetail {
                additions: 10,
                deletions: 4,
                files_changed: 2,
            })
        });

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    let since = ts(-30);

    // Two rounds: the second must not refetch the stats.
    for _ in 0..2 {
        engine
            .sync_commit_list(&owner(), &repo(), "main", since)
            .await
            .expect("list phase should succeed");
        engine
            .sync_commit_details(&owner(), &repo(), since)
            .await
            .expect("detail phase should succeed");
    }

    let record = engine_fixture
        .store
        .find_commit("octo", "widget", sha)
        .expect("query should succeed")
        .expect("row should exist");
    assert_eq!(record.files_changed, Some(2));
    assert_eq!(record.additions, Some(10));
}

#[rstest]
#[tokio::test]
async fn draft_releases_are_dropped_at_ingestion(engine_fixture: EngineFixture) {
    let mut gateway = MockHostGateway::new();
    gateway.expect_list_releases().returning(|_, _| {
        Ok(vec![
            ReleaseSummary {
                name: Some("v1.0.0".to_owned()),
                tag: "v1.0.0".to_owned(),
                draft: false,
                author: Some("carol".to_owned()),
                created_at: ts(-3),
                published_at: Some(ts(-3)),
            },
            ReleaseSummary {
                name: None,
                tag: "v1.1.0-draft".to_owned(),
                draft: true,
                author: Some("carol".to_owned()),
                created_at: ts(-1),
                published_at: None,
            },
        ])
    });

    let engine = SyncEngine::new(&gateway, &engine_fixture.store);
    engine
        .sync_releases(&owner(), &repo())
        .await
        .expect("release phase should succeed");

    assert!(
        engine_fixture
            .store
            .find_release("octo", "widget", "v1.0.0")
            .expect("query should succeed")
            .is_some()
    );
    assert!(
        engine_fixture
            .store
            .find_release("octo", "widget", "v1.1.0-draft")
            .expect("query should succeed")
            .is_none()
    );
}
