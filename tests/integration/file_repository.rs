//! Integration tests for the on-disk repository.
//!
//! Uses `tempfile` directories so every test owns its snapshot file.
//!
//! Verification command: `cargo test --test file_repository`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;

use taskboard::board::{BoardSession, FilterPatch, MoveRequest, SessionConfig, Slot};
use taskboard::context::{AuthenticatedUser, SessionContext};
use taskboard::repository::file::FileRepository;
use taskboard::repository::{RepositoryError, TaskRepository};
use taskboard_proto::task::{Category, OwnerId, TaskDraft, TaskId, TaskPatch, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn owner(uid: &str) -> OwnerId {
    OwnerId::new(uid)
}

/// Opens a session for `uid` over the snapshot at `repo`.
async fn open_session(repo: &Arc<FileRepository>, uid: &str) -> BoardSession<FileRepository> {
    let context = SessionContext::signed_in(AuthenticatedUser::new(uid));
    let (session, _rx) = BoardSession::new(Arc::clone(repo), context, SessionConfig::default());
    assert!(session.request_refresh().unwrap().settled().await.all_succeeded());
    session
}

// ---------------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn records_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.bin");
    let due = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

    let id = {
        let repo = FileRepository::new(&path);
        let id = repo
            .create(
                &TaskDraft::new("Write report")
                    .with_due_date(due)
                    .with_category(Category::Personal)
                    .with_description("quarterly numbers")
                    .for_owner(owner("u1")),
            )
            .await
            .unwrap();
        repo.update(&id, &TaskPatch::status(TaskStatus::InProgress))
            .await
            .unwrap();
        id
    };

    let reopened = FileRepository::new(&path);
    let tasks = reopened.list(&owner("u1")).await.unwrap();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.id, id);
    assert_eq!(task.title, "Write report");
    assert_eq!(task.description.as_deref(), Some("quarterly numbers"));
    assert_eq!(task.due_date, Some(due));
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.category, Category::Personal);
}

#[tokio::test]
async fn list_is_scoped_to_owner() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileRepository::new(dir.path().join("tasks.bin"));
    for (uid, title) in [("u1", "a"), ("u2", "b"), ("u1", "c")] {
        repo.create(&TaskDraft::new(title).for_owner(owner(uid)))
            .await
            .unwrap();
    }

    let titles: Vec<_> = repo
        .list(&owner("u1"))
        .await
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["a", "c"]);
    assert_eq!(repo.list(&owner("u2")).await.unwrap().len(), 1);
    assert!(repo.list(&owner("u3")).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileRepository::new(dir.path().join("tasks.bin"));
    let missing = TaskId::new("missing");

    assert!(matches!(
        repo.update(&missing, &TaskPatch::status(TaskStatus::Completed))
            .await,
        Err(RepositoryError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        repo.delete(&missing).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn concurrent_creates_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(FileRepository::new(dir.path().join("tasks.bin")));

    let calls: Vec<_> = (0..8)
        .map(|n| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                repo.create(&TaskDraft::new(format!("t{n}")).for_owner(owner("u1")))
                    .await
            })
        })
        .collect();
    for call in calls {
        call.await.unwrap().unwrap();
    }
    assert_eq!(repo.list(&owner("u1")).await.unwrap().len(), 8);
}

// ---------------------------------------------------------------------------
// Board session over the file store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_changes_are_visible_to_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(FileRepository::new(dir.path().join("tasks.bin")));

    let first = open_session(&repo, "u1").await;
    first
        .create_task(TaskDraft::new("Report Q1"))
        .unwrap()
        .settled()
        .await;
    first
        .create_task(TaskDraft::new("Groceries").with_category(Category::Personal))
        .unwrap()
        .settled()
        .await;
    let report = first.snapshot().tasks[0].id.clone();
    first
        .move_task(&MoveRequest::new(
            report.clone(),
            Slot::new(TaskStatus::Todo, 0),
            Slot::new(TaskStatus::Completed, 0),
        ))
        .unwrap()
        .settled()
        .await;

    let second = open_session(&repo, "u1").await;
    let snapshot = second.snapshot();
    assert_eq!(snapshot.index.sequence_of(TaskStatus::Completed), [report]);
    assert_eq!(snapshot.index.count_of(TaskStatus::Todo), 1);

    second.set_filter(FilterPatch::category("Personal"));
    assert_eq!(second.snapshot().visible_len(), 1);

    let other = open_session(&repo, "u2").await;
    assert!(other.snapshot().index.is_empty());
}

#[tokio::test]
async fn session_delete_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(FileRepository::new(dir.path().join("tasks.bin")));
    let id = repo
        .create(&TaskDraft::new("gone soon").for_owner(owner("u1")))
        .await
        .unwrap();

    let session = open_session(&repo, "u1").await;
    assert!(session.delete_task(&id).unwrap().settled().await.all_succeeded());
    assert!(repo.list(&owner("u1")).await.unwrap().is_empty());
}
