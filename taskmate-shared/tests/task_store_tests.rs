/// Integration tests for task operations through the scoped store

mod common;

use chrono::{Duration, NaiveDate};
use common::TestContext;
use taskmate_shared::error::{Entity, StoreError};
use taskmate_shared::models::task::TaskStatus;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_create_task_with_past_due_date_is_overdue() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let task = store
        .create_task("File taxes", Some("2020-01-01"), None)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Overdue);
    assert_eq!(task.due_date, Some(date(2020, 1, 1)));
    assert_eq!(task.tenant_id, alice.tenant_id);
    assert_eq!(task.author_id, alice.user_id);
    assert_eq!(task.created, common::start_instant());
}

#[tokio::test]
async fn test_create_task_status_from_due_date() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let undated = store.create_task("Someday", None, None).await.unwrap();
    assert_eq!(undated.status, TaskStatus::Active);
    assert_eq!(undated.due_date, None);

    let blank = store.create_task("Blank date", Some("  "), None).await.unwrap();
    assert_eq!(blank.status, TaskStatus::Active);
    assert_eq!(blank.due_date, None);

    let today = store.create_task("Today", Some("2024-06-15"), None).await.unwrap();
    assert_eq!(today.status, TaskStatus::Overdue);

    let tomorrow = store
        .create_task("Tomorrow", Some("2024-06-16"), None)
        .await
        .unwrap();
    assert_eq!(tomorrow.status, TaskStatus::Active);
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let err = store.create_task("   ", None, None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "title", .. }));

    let err = store
        .create_task("Bad date", Some("next tuesday"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "due_date", .. }));

    assert!(store.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_task_trims_body() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let with_body = store
        .create_task("  Title  ", None, Some("  details  "))
        .await
        .unwrap();
    assert_eq!(with_body.title, "Title");
    assert_eq!(with_body.body.as_deref(), Some("details"));

    let empty_body = store.create_task("Title", None, Some("")).await.unwrap();
    assert_eq!(empty_body.body, None);
}

#[tokio::test]
async fn test_lists_split_by_status_newest_first() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let first = store.create_task("First", None, None).await.unwrap();
    ctx.clock.set(common::start_instant() + Duration::minutes(1));
    let second = store
        .create_task("Second", Some("2024-01-01"), None)
        .await
        .unwrap();
    ctx.clock.set(common::start_instant() + Duration::minutes(2));
    let third = store.create_task("Third", None, None).await.unwrap();
    store.mark_done(third.id).await.unwrap();

    let active: Vec<i64> = store.list_active().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(active, vec![second.id, first.id]);

    let overdue: Vec<i64> = store.list_overdue().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(overdue, vec![second.id]);

    let done: Vec<i64> = store.list_done().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(done, vec![third.id]);

    assert_eq!(store.latest_active().await.unwrap().map(|t| t.id), Some(second.id));
    assert_eq!(store.latest_done().await.unwrap().map(|t| t.id), Some(third.id));
}

#[tokio::test]
async fn test_latest_views_are_empty_without_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    assert!(store.latest_active().await.unwrap().is_none());
    assert!(store.latest_done().await.unwrap().is_none());
}

#[tokio::test]
async fn test_lists_only_show_own_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let bob = ctx.member(alice.tenant_id, "bob").await.unwrap();

    ctx.store(&alice).create_task("Alice's", None, None).await.unwrap();
    ctx.store(&bob).create_task("Bob's", None, None).await.unwrap();

    let listed = ctx.store(&alice).list_active().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Alice's");
}

#[tokio::test]
async fn test_get_task_requires_author() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let bob = ctx.member(alice.tenant_id, "bob").await.unwrap();

    let task = ctx.store(&alice).create_task("Mine", None, None).await.unwrap();
    let bob_store = ctx.store(&bob);

    let err = bob_store.get_task(task.id, true).await.unwrap_err();
    assert!(matches!(err, StoreError::Forbidden { entity: Entity::Task, .. }));

    let seen = bob_store.get_task(task.id, false).await.unwrap();
    assert_eq!(seen.id, task.id);

    for err in [
        bob_store.update_task(task.id, "Hijack", None, None).await.unwrap_err(),
        bob_store.mark_done(task.id).await.map(|_| ()).unwrap_err(),
        bob_store.delete_task(task.id).await.unwrap_err(),
    ] {
        assert!(matches!(err, StoreError::Forbidden { .. }), "got {err:?}");
    }
}

#[tokio::test]
async fn test_get_missing_task_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();

    let err = ctx.store(&alice).get_task(999, true).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: Entity::Task,
            id: 999
        }
    ));
}

#[tokio::test]
async fn test_update_task_recomputes_status() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let task = store
        .create_task("Plan trip", Some("2030-01-01"), Some("Book flights"))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Active);

    let overdue = store
        .update_task(task.id, "Plan trip", Some("2024-06-01"), None)
        .await
        .unwrap();
    assert_eq!(overdue.status, TaskStatus::Overdue);
    assert_eq!(overdue.body.as_deref(), Some("Book flights"));

    let cleared = store
        .update_task(task.id, "Plan trip soon", None, Some("Book hotel"))
        .await
        .unwrap();
    assert_eq!(cleared.status, TaskStatus::Active);
    assert_eq!(cleared.due_date, None);
    assert_eq!(cleared.title, "Plan trip soon");
    assert_eq!(cleared.body.as_deref(), Some("Book hotel"));
}

#[tokio::test]
async fn test_update_done_task_reopens_it() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let task = store.create_task("Laundry", None, None).await.unwrap();
    store.mark_done(task.id).await.unwrap();

    let reopened = store.update_task(task.id, "Laundry", None, None).await.unwrap();
    assert_eq!(reopened.status, TaskStatus::Active);
    assert!(store.list_done().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_task_validation() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let task = store.create_task("Keep me", None, None).await.unwrap();

    let err = store.update_task(task.id, "", None, None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "title", .. }));

    let err = store
        .update_task(task.id, "Keep me", Some("2024/06/01"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "due_date", .. }));

    let unchanged = store.get_task(task.id, true).await.unwrap();
    assert_eq!(unchanged, task);

    let err = store.update_task(12345, "Nope", None, None).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_mark_done_from_any_open_status() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let active = store.create_task("Active", None, None).await.unwrap();
    let overdue = store.create_task("Overdue", Some("2020-01-01"), None).await.unwrap();

    assert_eq!(store.mark_done(active.id).await.unwrap().status, TaskStatus::Done);
    assert_eq!(store.mark_done(overdue.id).await.unwrap().status, TaskStatus::Done);
    assert_eq!(store.mark_done(overdue.id).await.unwrap().status, TaskStatus::Done);

    let err = store.mark_done(777).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_get_done_task_only_finds_done() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let task = store.create_task("Finish", None, None).await.unwrap();

    let err = store.get_done_task(task.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    store.mark_done(task.id).await.unwrap();
    assert_eq!(store.get_done_task(task.id).await.unwrap().status, TaskStatus::Done);
}

#[tokio::test]
async fn test_get_done_task_checks_status_before_author() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let carol = ctx.member(alice.tenant_id, "carol").await.unwrap();
    let store = ctx.store(&alice);

    let open = store.create_task("Still open", None, None).await.unwrap();
    let finished = store.create_task("Finished", None, None).await.unwrap();
    store.mark_done(finished.id).await.unwrap();

    let carol_store = ctx.store(&carol);
    let err = carol_store.get_done_task(open.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = carol_store.get_done_task(finished.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Forbidden { .. }));
}

#[tokio::test]
async fn test_delete_task_in_any_status() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let store = ctx.store(&alice);

    let active = store.create_task("Active", None, None).await.unwrap();
    let overdue = store.create_task("Overdue", Some("2020-01-01"), None).await.unwrap();
    let done = store.create_task("Done", None, None).await.unwrap();
    store.mark_done(done.id).await.unwrap();

    for id in [active.id, overdue.id, done.id] {
        store.delete_task(id).await.unwrap();
        let err = store.get_task(id, false).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    let err = store.delete_task(active.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_timezone_settings() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.tenant_with_member("alice", "UTC").await.unwrap();
    let mut store = ctx.store(&alice);

    assert_eq!(store.get_timezone().await.unwrap(), "UTC");

    store.set_timezone("Europe/Berlin").await.unwrap();
    store.set_timezone("Europe/Berlin").await.unwrap();
    assert_eq!(store.get_timezone().await.unwrap(), "Europe/Berlin");
    assert_eq!(store.context().timezone, "Europe/Berlin");

    for rejected in ["Berlin", "Europe", "europe/berlin", "UTC", ""] {
        let err = store.set_timezone(rejected).await.unwrap_err();
        assert!(
            matches!(err, StoreError::Validation { field: "timezone", .. }),
            "{rejected} should be rejected"
        );
    }
    assert_eq!(store.get_timezone().await.unwrap(), "Europe/Berlin");
}
