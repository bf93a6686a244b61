//! Tests for the entity store collections and the response cache.

use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::telemetry::NoopTelemetrySink;

use super::{
    CommitListWrite, CommitStatsWrite, IssueKind, IssueListWrite, PullDetailWrite,
    ReactionCounts, ReleaseWrite, RepositoryWrite, Store, migrate_database,
};

struct StoreFixture {
    // Held so the backing file outlives the store handle.
    _dir: TempDir,
    store: Store,
}

#[fixture]
fn store_fixture() -> StoreFixture {
    let dir = TempDir::new().expect("temp dir should be created");
    let database_url = dir
        .path()
        .join("store.sqlite")
        .to_string_lossy()
        .into_owned();
    migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");
    let store = Store::new(database_url).expect("store should open");
    StoreFixture { _dir: dir, store }
}

fn ts(offset_days: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_756_000_000, 0).expect("timestamp should parse")
        + Duration::days(offset_days)
}

fn repo_write<'a>(owner: &'a str, name: &'a str) -> RepositoryWrite<'a> {
    RepositoryWrite {
        owner,
        name,
        created_at: ts(-100),
        updated_at: ts(-1),
        default_branch: "main",
    }
}

fn issue_write<'a>(repo: &'a str, number: i64, kind: IssueKind) -> IssueListWrite<'a> {
    IssueListWrite {
        owner: "octo",
        repo,
        number,
        kind,
        title: "improve the widget",
        state: "open",
        author: Some("alice"),
        created_at: ts(-5),
        updated_at: ts(-1),
        closed_at: None,
        merged_at: None,
        comments: 2,
        reactions: ReactionCounts::default(),
    }
}

#[rstest]
fn repository_upsert_is_idempotent_and_preserves_watermark(store_fixture: StoreFixture) {
    let store = &store_fixture.store;

    store
        .upsert_repository(repo_write("octo", "widget"))
        .expect("first upsert should succeed");
    store
        .set_watermark("octo", "widget", ts(-2))
        .expect("watermark should persist");
    store
        .upsert_repository(repo_write("octo", "widget"))
        .expect("second upsert should succeed");

    let repos = store
        .repositories_for_owner("octo")
        .expect("listing should succeed");
    assert_eq!(repos.len(), 1, "upsert must not duplicate the row");
    assert_eq!(
        repos[0].synced_at,
        Some(ts(-2)),
        "refresh upsert must not touch the watermark"
    );
}

#[rstest]
fn set_watermark_requires_an_existing_row(store_fixture: StoreFixture) {
    let result = store_fixture.store.set_watermark("octo", "missing", ts(0));
    assert!(result.is_err());
}

#[rstest]
fn issue_relist_preserves_detail_columns(store_fixture: StoreFixture) {
    let store = &store_fixture.store;

    store
        .upsert_issue(&issue_write("widget", 7, IssueKind::Pr))
        .expect("list upsert should succeed");
    store
        .apply_pull_detail(
            "octo",
            "widget",
            7,
            PullDetailWrite {
                commits: 3,
                additions: 120,
                deletions: 8,
                changed_files: 4,
                merged_login: Some("maintainer"),
                synced_at: ts(0),
            },
        )
        .expect("detail write should succeed");

    // A later list pass must not discard what the detail phase wrote.
    store
        .upsert_issue(&issue_write("widget", 7, IssueKind::Pr))
        .expect("re-list upsert should succeed");

    let issue = store
        .find_issue("octo", "widget", 7)
        .expect("query should succeed")
        .expect("issue should exist");
    assert_eq!(issue.commits, Some(3));
    assert_eq!(issue.changed_files, Some(4));
    assert_eq!(issue.merged_by.as_deref(), Some("maintainer"));
    assert_eq!(issue.closed_by.as_deref(), Some("maintainer"));
    assert_eq!(issue.synced_at, Some(ts(0)));
}

#[rstest]
fn record_closed_by_stamps_the_issue_watermark(store_fixture: StoreFixture) {
    let store = &store_fixture.store;

    store
        .upsert_issue(&issue_write("widget", 9, IssueKind::Issue))
        .expect("list upsert should succeed");

    let before = store
        .find_issue("octo", "widget", 9)
        .expect("query should succeed")
        .expect("issue should exist");
    assert!(before.needs_detail_fetch());
    assert!(before.closed_by.is_none());

    store
        .record_closed_by("octo", "widget", 9, "triager", ts(0))
        .expect("fallback write should succeed");

    let after = store
        .find_issue("octo", "widget", 9)
        .expect("query should succeed")
        .expect("issue should exist");
    assert_eq!(after.closed_by.as_deref(), Some("triager"));
    assert!(!after.needs_detail_fetch());
}

#[rstest]
fn issue_buckets_filter_by_kind_state_and_window(store_fixture: StoreFixture) {
    let store = &store_fixture.store;
    let since = ts(-3);

    // Open PR created before the window but updated inside it: counted as
    // both an open pull and an unresolved conversation.
    store
        .upsert_issue(&issue_write("widget", 1, IssueKind::Pr))
        .expect("upsert should succeed");
    // Merged PR.
    let mut merged = issue_write("widget", 2, IssueKind::Pr);
    merged.state = "closed";
    merged.closed_at = Some(ts(-1));
    merged.merged_at = Some(ts(-1));
    store.upsert_issue(&merged).expect("upsert should succeed");
    // Issue opened before the window but still active: an unresolved
    // conversation, not an open issue.
    let mut stale = issue_write("widget", 3, IssueKind::Issue);
    stale.created_at = ts(-10);
    store.upsert_issue(&stale).expect("upsert should succeed");

    let open_pulls = store
        .open_pulls("octo", "widget", since)
        .expect("query should succeed");
    assert_eq!(open_pulls.len(), 1);
    assert_eq!(open_pulls[0].number, 1);

    let merged_pulls = store
        .merged_pulls("octo", "widget", since)
        .expect("query should succeed");
    assert_eq!(merged_pulls.len(), 1);
    assert_eq!(merged_pulls[0].number, 2);

    let closed_pulls = store
        .closed_pulls("octo", "widget", since)
        .expect("query should succeed");
    assert_eq!(closed_pulls.len(), 1);

    let open_issues = store
        .open_issues("octo", "widget", since)
        .expect("query should succeed");
    assert!(open_issues.is_empty(), "pre-window issue is not newly opened");

    // Conversations are kind-agnostic: any open item started before the
    // window with activity inside it qualifies, PRs included.
    let conversations = store
        .unresolved_conversations("octo", "widget", since)
        .expect("query should succeed");
    let numbers: Vec<i64> = conversations.iter().map(|record| record.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

#[rstest]
fn commit_detail_pending_is_detected_by_missing_files_changed(store_fixture: StoreFixture) {
    let store = &store_fixture.store;

    let write = CommitListWrite {
        owner: "octo",
        repo: "widget",
        sha: "abc123",
        base: "main",
        author: Some("alice"),
        committer: Some("alice"),
        message: "tighten the bolts",
        created_at: ts(-1),
    };
    store.upsert_commit(write).expect("upsert should succeed");
    store.upsert_commit(write).expect("repeat upsert should succeed");

    let pending = store
        .commits_missing_details("octo", "widget", ts(-3))
        .expect("query should succeed");
    assert_eq!(pending.len(), 1, "upsert must not duplicate the commit");

    store
        .apply_commit_stats(
            "octo",
            "widget",
            "abc123",
            CommitStatsWrite {
                additions: 10,
                deletions: 2,
                files_changed: 1,
            },
        )
        .expect("stats write should succeed");

    let pending = store
        .commits_missing_details("octo", "widget", ts(-3))
        .expect("query should succeed");
    assert!(pending.is_empty());

    let on_branch = store
        .commits_on_branch("octo", "widget", "main", ts(-3))
        .expect("query should succeed");
    assert_eq!(on_branch.len(), 1);
    assert_eq!(on_branch[0].additions, Some(10));
}

#[rstest]
fn releases_published_after_skips_unpublished_rows(store_fixture: StoreFixture) {
    let store = &store_fixture.store;

    store
        .upsert_release(ReleaseWrite {
            owner: "octo",
            repo: "widget",
            tag: "v1.0.0",
            name: Some("first stable"),
            author: Some("alice"),
            created_at: ts(-2),
            published_at: Some(ts(-1)),
        })
        .expect("upsert should succeed");
    store
        .upsert_release(ReleaseWrite {
            owner: "octo",
            repo: "widget",
            tag: "v1.1.0-rc",
            name: None,
            author: Some("alice"),
            created_at: ts(-1),
            published_at: None,
        })
        .expect("upsert should succeed");

    let published = store
        .releases_published_after("octo", "widget", ts(-3))
        .expect("query should succeed");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].tag, "v1.0.0");
}

#[rstest]
fn cache_read_ignores_expiry_until_the_reaper_runs(store_fixture: StoreFixture) {
    let store = &store_fixture.store;
    let url = "https://api.example.test/repos/octo/widget";

    store
        .store_response(url, "GET", 1_000, "{\"ok\":true}")
        .expect("write should succeed");

    // Reads never revalidate against the expiry stamp: a stale row is
    // served until the reaper removes it. This is the documented
    // non-guarantee, not a bug.
    let stale = store
        .cached_response(url, "GET")
        .expect("lookup should succeed")
        .expect("row should be returned despite being past expiry");
    assert_eq!(stale.expires_at_unix, 1_000);

    let removed = store.purge_expired(2_000).expect("purge should succeed");
    assert_eq!(removed, 1);
    assert!(
        store
            .cached_response(url, "GET")
            .expect("lookup should succeed")
            .is_none()
    );
}

#[rstest]
fn cache_store_converges_on_one_row_per_signature(store_fixture: StoreFixture) {
    let store = &store_fixture.store;
    let url = "https://api.example.test/users/octo";

    store
        .store_response(url, "GET", 1_000, "{\"v\":1}")
        .expect("write should succeed");
    store
        .store_response(url, "GET", 2_000, "{\"v\":2}")
        .expect("second write should succeed");

    let row = store
        .cached_response(url, "GET")
        .expect("lookup should succeed")
        .expect("row should exist");
    assert_eq!(row.body, "{\"v\":2}");

    let removed = store.purge_all_responses().expect("purge should succeed");
    assert_eq!(removed, 1, "duplicate writes must converge on one row");
}
