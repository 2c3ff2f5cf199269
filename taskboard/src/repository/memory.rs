//! Volatile repository with fault injection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use taskboard_proto::task::{NewTask, OwnerId, Task, TaskId, TaskPatch};

use super::{RepositoryError, TaskRepository};

/// Failures and delays to inject into repository calls.
#[derive(Debug, Default)]
struct Faults {
    fail_creates: bool,
    fail_lists: bool,
    fail_updates: HashSet<TaskId>,
    fail_deletes: HashSet<TaskId>,
    latency: Duration,
    list_delays: VecDeque<Duration>,
}

/// In-memory [`TaskRepository`], grouped by owner.
///
/// Ids are UUID v7 strings. Data is lost when the value is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tasks: RwLock<HashMap<OwnerId, Vec<Task>>>,
    faults: parking_lot::Mutex<Faults>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `tasks` under their existing ids.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut by_owner: HashMap<OwnerId, Vec<Task>> = HashMap::new();
        for task in tasks {
            by_owner.entry(task.owner_id.clone()).or_default().push(task);
        }
        Self {
            tasks: RwLock::new(by_owner),
            faults: parking_lot::Mutex::default(),
        }
    }

    /// Adds a task under its existing id.
    pub async fn seed(&self, task: Task) {
        self.tasks
            .write()
            .await
            .entry(task.owner_id.clone())
            .or_default()
            .push(task);
    }

    /// Returns a stored task by id.
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks
            .read()
            .await
            .values()
            .flatten()
            .find(|task| task.id == *id)
            .cloned()
    }

    /// Number of stored tasks across all owners.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Makes every `create` fail (or succeed again).
    pub fn fail_creates(&self, fail: bool) {
        self.faults.lock().fail_creates = fail;
    }

    /// Makes every `list` fail (or succeed again).
    pub fn fail_lists(&self, fail: bool) {
        self.faults.lock().fail_lists = fail;
    }

    /// Makes `update` fail for `id`.
    pub fn fail_updates_for(&self, id: impl Into<TaskId>) {
        self.faults.lock().fail_updates.insert(id.into());
    }

    /// Makes `delete` fail for `id`.
    pub fn fail_deletes_for(&self, id: impl Into<TaskId>) {
        self.faults.lock().fail_deletes.insert(id.into());
    }

    /// Removes every injected failure.
    pub fn heal(&self) {
        let mut faults = self.faults.lock();
        faults.fail_creates = false;
        faults.fail_lists = false;
        faults.fail_updates.clear();
        faults.fail_deletes.clear();
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.faults.lock().latency = latency;
    }

    /// Builder form of [`set_latency`](Self::set_latency).
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Delays the next `list` call's reply by `delay`, after it has read
    /// the stored tasks. Queued delays are consumed in call order.
    pub fn delay_next_list(&self, delay: Duration) {
        self.faults.lock().list_delays.push_back(delay);
    }

    async fn simulate_latency(&self) {
        let latency = self.faults.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl TaskRepository for InMemoryRepository {
    async fn list(&self, owner: &OwnerId) -> Result<Vec<Task>, RepositoryError> {
        self.simulate_latency().await;
        let (fail, delay) = {
            let mut faults = self.faults.lock();
            (faults.fail_lists, faults.list_delays.pop_front())
        };
        let tasks = self.tasks.read().await.get(owner).cloned().unwrap_or_default();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(RepositoryError::Unavailable("list rejected".to_string()));
        }
        Ok(tasks)
    }

    async fn create(&self, task: &NewTask) -> Result<TaskId, RepositoryError> {
        self.simulate_latency().await;
        if self.faults.lock().fail_creates {
            return Err(RepositoryError::Unavailable("create rejected".to_string()));
        }
        let id = TaskId::new(Uuid::now_v7().to_string());
        self.tasks
            .write()
            .await
            .entry(task.owner_id.clone())
            .or_default()
            .push(task.clone().into_task(id.clone()));
        Ok(id)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), RepositoryError> {
        self.simulate_latency().await;
        if self.faults.lock().fail_updates.contains(id) {
            return Err(RepositoryError::Unavailable(format!("update of {id} rejected")));
        }
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .values_mut()
            .flatten()
            .find(|task| task.id == *id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        patch.apply_to(task);
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        self.simulate_latency().await;
        if self.faults.lock().fail_deletes.contains(id) {
            return Err(RepositoryError::Unavailable(format!("delete of {id} rejected")));
        }
        let mut tasks = self.tasks.write().await;
        for owned in tasks.values_mut() {
            if let Some(position) = owned.iter().position(|task| task.id == *id) {
                owned.remove(position);
                return Ok(());
            }
        }
        Err(RepositoryError::NotFound(id.clone()))
    }
}
