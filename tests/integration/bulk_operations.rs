//! Integration tests for selection and bulk operations.
//!
//! Bulk operations apply every change locally at once, then persist each
//! task independently. A failure affects only its own task.
//!
//! Verification command: `cargo test --test bulk_operations`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use tokio::sync::mpsc;

use taskboard::board::{BoardSession, FilterPatch, ReconcilePolicy, SessionConfig};
use taskboard::context::{AuthenticatedUser, SessionContext};
use taskboard::notify::{Notification, NotificationKind};
use taskboard::repository::memory::InMemoryRepository;
use taskboard_proto::task::{OwnerId, Task, TaskDraft, TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

const OWNER: &str = "user-1";

fn make_task(id: &str, status: TaskStatus) -> Task {
    TaskDraft::new(format!("task {id}"))
        .with_status(status)
        .for_owner(OwnerId::new(OWNER))
        .into_task(TaskId::new(id))
}

/// Loads three Todo tasks `1`, `2`, `3` into a session using `policy`.
async fn three_tasks(
    policy: ReconcilePolicy,
) -> (
    BoardSession<InMemoryRepository>,
    Arc<InMemoryRepository>,
    mpsc::Receiver<Notification>,
) {
    let repo = Arc::new(InMemoryRepository::with_tasks([
        make_task("1", TaskStatus::Todo),
        make_task("2", TaskStatus::Todo),
        make_task("3", TaskStatus::Todo),
    ]));
    let context = SessionContext::signed_in(AuthenticatedUser::new(OWNER));
    let config = SessionConfig {
        policy,
        ..SessionConfig::default()
    };
    let (session, rx) = BoardSession::new(Arc::clone(&repo), context, config);
    session.request_refresh().unwrap().settled().await;
    (session, repo, rx)
}

fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

fn todo_column(session: &BoardSession<InMemoryRepository>) -> Vec<String> {
    session
        .snapshot()
        .index
        .sequence_of(TaskStatus::Todo)
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn select(session: &BoardSession<InMemoryRepository>, ids: &[&str]) {
    for id in ids {
        assert!(session.toggle_select(&TaskId::new(*id)));
    }
}

// ---------------------------------------------------------------------------
// Bulk delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_delete_with_one_failure_restores_only_that_task() {
    let (session, repo, mut rx) = three_tasks(ReconcilePolicy::Rollback).await;
    repo.fail_deletes_for("3");
    select(&session, &["1", "3"]);

    let handle = session.bulk_delete().unwrap();
    let optimistic = session.snapshot();
    assert_eq!(optimistic.tasks.len(), 1);
    assert!(optimistic.selection.is_empty());

    let settled = handle.settled().await;
    assert_eq!(settled.succeeded, 1);
    assert_eq!(settled.failed, 1);

    let snapshot = session.snapshot();
    assert!(snapshot.task(&TaskId::new("1")).is_none());
    assert!(snapshot.task(&TaskId::new("3")).is_some());
    assert!(snapshot.selection.is_empty());
    assert_eq!(snapshot.index.sequence_of(TaskStatus::Todo).len(), 2);
    assert!(repo.get(&TaskId::new("1")).await.is_none());

    let errors: Vec<_> = drain(&mut rx).into_iter().filter(Notification::is_error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, NotificationKind::Delete);
    assert_eq!(errors[0].task_id, Some(TaskId::new("3")));
}

#[tokio::test]
async fn restored_task_keeps_its_column_position() {
    let (session, repo, _rx) = three_tasks(ReconcilePolicy::Rollback).await;
    repo.fail_deletes_for("2");
    select(&session, &["2"]);

    session.bulk_delete().unwrap().settled().await;
    assert_eq!(todo_column(&session), ["1", "2", "3"]);
}

#[tokio::test]
async fn several_failed_deletes_restore_original_order() {
    for failing in [["1", "3"], ["2", "3"], ["1", "2"]] {
        let (session, repo, mut rx) = three_tasks(ReconcilePolicy::Rollback).await;
        for id in failing {
            repo.fail_deletes_for(id);
        }
        select(&session, &failing);

        let settled = session.bulk_delete().unwrap().settled().await;
        assert_eq!(settled.failed, 2);
        assert_eq!(todo_column(&session), ["1", "2", "3"], "failing {failing:?}");
        let errors = drain(&mut rx).into_iter().filter(Notification::is_error).count();
        assert_eq!(errors, 2);
    }
}

#[tokio::test]
async fn bulk_delete_failure_under_keep_local_stays_deleted() {
    let (session, repo, mut rx) = three_tasks(ReconcilePolicy::KeepLocal).await;
    repo.fail_deletes_for("3");
    select(&session, &["3"]);

    let settled = session.bulk_delete().unwrap().settled().await;
    assert_eq!(settled.failed, 1);
    assert!(session.snapshot().task(&TaskId::new("3")).is_none());
    assert_eq!(drain(&mut rx).len(), 1);

    session.request_refresh().unwrap().settled().await;
    assert!(session.snapshot().task(&TaskId::new("3")).is_some());
}

// ---------------------------------------------------------------------------
// Bulk status change
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_status_moves_every_selected_task() {
    let (session, repo, mut rx) = three_tasks(ReconcilePolicy::Rollback).await;
    select(&session, &["3", "1"]);

    let handle = session.bulk_set_status(TaskStatus::Completed).unwrap();
    assert_eq!(handle.len(), 2);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.index.count_of(TaskStatus::Completed), 2);
    assert!(snapshot.selection.is_empty());

    assert!(handle.settled().await.all_succeeded());
    for id in ["1", "3"] {
        let stored = repo.get(&TaskId::new(id)).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
    }
    assert_eq!(
        repo.get(&TaskId::new("2")).await.unwrap().status,
        TaskStatus::Todo
    );
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn bulk_status_partial_failure_reverts_one_task() {
    let (session, repo, mut rx) = three_tasks(ReconcilePolicy::Rollback).await;
    repo.fail_updates_for("2");
    select(&session, &["1", "2", "3"]);

    let settled = session
        .bulk_set_status(TaskStatus::InProgress)
        .unwrap()
        .settled()
        .await;
    assert_eq!(settled.succeeded, 2);
    assert_eq!(settled.failed, 1);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.index.count_of(TaskStatus::InProgress), 2);
    assert_eq!(
        snapshot.index.sequence_of(TaskStatus::Todo),
        [TaskId::new("2")]
    );
    let errors = drain(&mut rx).into_iter().filter(Notification::is_error).count();
    assert_eq!(errors, 1);
}

#[tokio::test]
async fn bulk_operation_on_empty_selection_does_nothing() {
    let (session, _repo, mut rx) = three_tasks(ReconcilePolicy::Rollback).await;
    let before = session.snapshot();

    assert!(session.bulk_delete().unwrap().is_empty());
    assert!(session.bulk_set_status(TaskStatus::Completed).unwrap().is_empty());
    assert_eq!(session.snapshot().tasks, before.tasks);
    assert!(drain(&mut rx).is_empty());
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggling_twice_deselects() {
    let (session, _repo, _rx) = three_tasks(ReconcilePolicy::Rollback).await;
    let id = TaskId::new("2");
    assert!(session.toggle_select(&id));
    assert!(!session.toggle_select(&id));
    assert!(session.snapshot().selection.is_empty());
}

#[tokio::test]
async fn selection_survives_filter_changes() {
    let (session, _repo, _rx) = three_tasks(ReconcilePolicy::Rollback).await;
    select(&session, &["1", "2"]);
    session.set_filter(FilterPatch::search("task 1"));
    assert_eq!(session.snapshot().visible_len(), 1);

    // Hidden selected tasks are still acted on.
    let handle = session.bulk_set_status(TaskStatus::Completed).unwrap();
    assert_eq!(handle.len(), 2);
    assert!(handle.settled().await.all_succeeded());
}

#[tokio::test]
async fn clear_selection_empties_it() {
    let (session, _repo, _rx) = three_tasks(ReconcilePolicy::Rollback).await;
    select(&session, &["1", "2", "3"]);
    session.clear_selection();
    assert!(session.snapshot().selection.is_empty());
}
