//! Task repository port and its adapters.
//!
//! The board session talks to persistence only through [`TaskRepository`].
//! Two adapters ship with the crate:
//!
//! - [`memory::InMemoryRepository`]: volatile store with fault injection,
//!   used by tests and demos.
//! - [`file::FileRepository`]: single-file postcard snapshot on disk, used
//!   by the CLI.

pub mod file;
pub mod memory;

use taskboard_proto::codec::CodecError;
use taskboard_proto::task::{NewTask, OwnerId, Task, TaskId, TaskPatch};

/// Errors surfaced by a repository call.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backend could not be reached or refused the request.
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// No record with this id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The caller may not access this record or store.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Asynchronous create/read/update/delete over task records.
///
/// Implementations are passive record keepers: they store what they are
/// given and apply no business rules.
pub trait TaskRepository: Send + Sync {
    /// Every task owned by `owner`, in storage order.
    fn list(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    /// Stores a new task and returns its assigned id.
    fn create(
        &self,
        task: &NewTask,
    ) -> impl std::future::Future<Output = Result<TaskId, RepositoryError>> + Send;

    /// Applies a partial update to an existing task.
    fn update(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Deletes a task.
    fn delete(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
