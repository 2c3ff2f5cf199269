//! Single-file repository backed by a postcard snapshot.
//!
//! Every call loads the snapshot, applies its change, and rewrites the
//! whole file through a temporary sibling followed by a rename, so a crash
//! mid-write leaves the previous snapshot intact. Calls are serialized by
//! an async mutex.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use uuid::Uuid;

use taskboard_proto::codec::{self, TaskSnapshot};
use taskboard_proto::task::{NewTask, OwnerId, Task, TaskId, TaskPatch};

use super::{RepositoryError, TaskRepository};

/// [`TaskRepository`] persisted to one file on disk.
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRepository {
    /// Opens a repository at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<TaskSnapshot, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(codec::decode(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(TaskSnapshot::default()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    async fn store(&self, snapshot: &TaskSnapshot) -> Result<(), RepositoryError> {
        let bytes = codec::encode(snapshot)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), tasks = snapshot.tasks.len(), "snapshot written");
        Ok(())
    }

    fn io_error(&self, err: std::io::Error) -> RepositoryError {
        if err.kind() == ErrorKind::PermissionDenied {
            RepositoryError::PermissionDenied(self.path.display().to_string())
        } else {
            RepositoryError::Io(err)
        }
    }

    fn find_mut<'a>(snapshot: &'a mut TaskSnapshot, id: &TaskId) -> Result<&'a mut Task, RepositoryError> {
        snapshot
            .tasks
            .iter_mut()
            .find(|task| task.id == *id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }
}

impl TaskRepository for FileRepository {
    async fn list(&self, owner: &OwnerId) -> Result<Vec<Task>, RepositoryError> {
        let _guard = self.lock.lock().await;
        let snapshot = self.load().await?;
        Ok(snapshot
            .tasks
            .into_iter()
            .filter(|task| task.owner_id == *owner)
            .collect())
    }

    async fn create(&self, task: &NewTask) -> Result<TaskId, RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.load().await?;
        let id = TaskId::new(Uuid::now_v7().to_string());
        snapshot.tasks.push(task.clone().into_task(id.clone()));
        self.store(&snapshot).await?;
        Ok(id)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.load().await?;
        patch.apply_to(Self::find_mut(&mut snapshot, id)?);
        self.store(&snapshot).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.load().await?;
        let position = snapshot
            .tasks
            .iter()
            .position(|task| task.id == *id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        snapshot.tasks.remove(position);
        self.store(&snapshot).await
    }
}
