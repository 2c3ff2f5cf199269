//! Board session: the coordinator that owns the task collection.
//!
//! Every mutation entry point applies its change to the in-memory state
//! immediately, re-derives the [`GroupIndex`], and then issues the matching
//! repository call on a spawned task. The caller gets a [`MutationHandle`]
//! back at once and may await [`MutationHandle::settled`] or drop it;
//! dropping never cancels the call.
//!
//! When a repository call fails, the outcome depends on the
//! [`ReconcilePolicy`]: `Rollback` restores the snapshot taken before the
//! optimistic apply, `KeepLocal` leaves the local state alone until the
//! next refresh. Both report the failure through the notification sink.
//!
//! # Provisional ids
//!
//! A created task is shown right away under a provisional id. When the
//! repository returns the real id the task is re-keyed everywhere (task
//! collection, index, selection). Updates and deletes issued against a
//! provisional id wait for the create to finish and are then sent under
//! the real id; if the create fails they are dropped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use taskboard_proto::task::{NewTask, OwnerId, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

use super::BoardError;
use super::filter::{self, FilterPatch, FilterState};
use super::index::GroupIndex;
use super::reorder::{self, MoveRequest};
use super::selection::{BulkDelta, Selection};
use crate::context::SessionContext;
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::repository::TaskRepository;

/// Default capacity of the notification channel.
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 64;

/// What to do with an optimistic change whose repository call failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePolicy {
    /// Restore the state captured before the change.
    #[default]
    Rollback,
    /// Keep the local change; local and remote diverge until a refresh.
    KeepLocal,
}

impl ReconcilePolicy {
    /// Returns the config-file spelling of this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rollback => "rollback",
            Self::KeepLocal => "keep-local",
        }
    }
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`ReconcilePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reconcile policy {0:?} (expected \"rollback\" or \"keep-local\")")]
pub struct ParsePolicyError(pub String);

impl FromStr for ReconcilePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollback" => Ok(Self::Rollback),
            "keep-local" | "keep_local" | "keeplocal" => Ok(Self::KeepLocal),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Tunables for a [`BoardSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Failure handling for optimistic changes.
    pub policy: ReconcilePolicy,
    /// Capacity of the notification channel.
    pub notification_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::default(),
            notification_buffer: DEFAULT_NOTIFICATION_BUFFER,
        }
    }
}

/// Outcome counts of the repository calls behind a [`MutationHandle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settled {
    /// Calls that succeeded.
    pub succeeded: usize,
    /// Calls that failed, were dropped, or panicked.
    pub failed: usize,
}

impl Settled {
    /// Total number of calls.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Returns `true` if no call failed.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Handle to the repository calls spawned by one mutation.
#[derive(Debug, Default)]
pub struct MutationHandle {
    calls: Vec<JoinHandle<bool>>,
}

impl MutationHandle {
    /// A handle with no calls, returned when a mutation was a local no-op.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    fn single(call: JoinHandle<bool>) -> Self {
        Self { calls: vec![call] }
    }

    /// Number of repository calls behind this handle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if the mutation issued no repository call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Waits for every call to complete.
    pub async fn settled(self) -> Settled {
        let mut settled = Settled::default();
        for outcome in join_all(self.calls).await {
            if matches!(outcome, Ok(true)) {
                settled.succeeded += 1;
            } else {
                settled.failed += 1;
            }
        }
        settled
    }
}

/// Read-only copy of the session state for presentation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    /// Visible task ids grouped by status.
    pub index: GroupIndex,
    /// Active filters.
    pub filters: FilterState,
    /// Selected task ids.
    pub selection: Selection,
    /// `true` while a refresh is in flight.
    pub is_loading: bool,
    /// Generation of the most recent refresh request.
    pub refresh_generation: u64,
    /// Whole task collection in presentation order, including filtered-out tasks.
    pub tasks: Vec<Task>,
}

impl BoardSnapshot {
    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    /// Visible tasks under `status`, in board order.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.index
            .sequence_of(status)
            .iter()
            .filter_map(|id| self.task(id))
            .collect()
    }

    /// Number of visible tasks.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.index.len()
    }
}

/// Where a task sat in the collection before it was moved or removed.
///
/// `next` and `prev` list the neighbouring ids, nearest first, up to and
/// including the first neighbour that was not itself moved or removed by
/// the same change.
#[derive(Debug, Clone)]
struct Origin {
    next: Vec<TaskId>,
    prev: Vec<TaskId>,
    position: usize,
}

impl Origin {
    fn capture(tasks: &[Task], position: usize, moving: impl Fn(&TaskId) -> bool) -> Self {
        Self {
            next: neighbours(tasks.iter().skip(position + 1), &moving),
            prev: neighbours(tasks.iter().take(position).rev(), &moving),
            position,
        }
    }
}

fn neighbours<'a>(
    tasks: impl Iterator<Item = &'a Task>,
    moving: &impl Fn(&TaskId) -> bool,
) -> Vec<TaskId> {
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.id.clone());
        if !moving(&task.id) {
            break;
        }
    }
    ids
}

/// A repository write captured together with what is needed to undo it.
#[derive(Debug)]
enum Write {
    Update {
        id: TaskId,
        patch: TaskPatch,
        previous: Task,
        /// Set when the change also repositioned the task.
        origin: Option<Origin>,
    },
    Delete {
        id: TaskId,
        previous: Task,
        origin: Origin,
    },
}

impl Write {
    const fn id(&self) -> &TaskId {
        match self {
            Self::Update { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    fn rekeyed(self, real: TaskId) -> Self {
        match self {
            Self::Update {
                patch,
                mut previous,
                origin,
                ..
            } => {
                previous.id.clone_from(&real);
                Self::Update {
                    id: real,
                    patch,
                    previous,
                    origin,
                }
            }
            Self::Delete {
                mut previous,
                origin,
                ..
            } => {
                previous.id.clone_from(&real);
                Self::Delete {
                    id: real,
                    previous,
                    origin,
                }
            }
        }
    }
}

/// A write ready to send, or one waiting for its task's create to finish.
#[derive(Debug)]
enum Dispatch {
    Ready(Write),
    AfterCreate(oneshot::Receiver<Option<TaskId>>, Write),
}

#[derive(Debug, Default)]
struct BoardState {
    /// Canonical collection; its order is the presentation order.
    tasks: Vec<Task>,
    filters: FilterState,
    index: GroupIndex,
    selection: Selection,
    is_loading: bool,
    refresh_generation: u64,
    /// Provisional id to real id, for creates that have completed.
    aliases: HashMap<TaskId, TaskId>,
    /// Writes waiting on an in-flight create, keyed by provisional id.
    awaiting_create: HashMap<TaskId, Vec<oneshot::Sender<Option<TaskId>>>>,
}

impl BoardState {
    fn rebuilt_index(&self) -> GroupIndex {
        GroupIndex::build(filter::apply(&self.tasks, &self.filters))
    }

    fn reindex(&mut self) {
        self.index = self.rebuilt_index();
    }

    fn resolve(&self, id: &TaskId) -> TaskId {
        self.aliases.get(id).unwrap_or(id).clone()
    }

    fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == *id)
    }

    fn rekey(&mut self, from: &TaskId, to: &TaskId) {
        if let Some(task) = self.task_mut(from) {
            task.id.clone_from(to);
        }
        self.index.rekey(from, to);
        self.selection.rekey(from, to);
        self.aliases.insert(from.clone(), to.clone());
    }

    fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        // Fetched tasks carry real ids only.
        self.aliases.clear();
        let tasks = &self.tasks;
        self.selection
            .retain(|id| tasks.iter().any(|task| task.id == *id));
        self.reindex();
    }

    /// Where to put a moved task back into the collection so that the
    /// rebuilt index agrees with the patched `index`.
    fn insertion_point(&self, index: &GroupIndex, task: &Task, fallback: usize) -> usize {
        let column = index.sequence_of(task.status);
        let fallback = fallback.min(self.tasks.len());
        let Some(slot) = column.iter().position(|id| *id == task.id) else {
            return fallback;
        };
        if let Some(next) = column.get(slot + 1)
            && let Some(at) = self.position_of(next)
        {
            return at;
        }
        if let Some(prev) = slot.checked_sub(1).and_then(|p| column.get(p))
            && let Some(at) = self.position_of(prev)
        {
            return at + 1;
        }
        fallback
    }

    /// Puts `task` back next to the first neighbour in `origin` that is
    /// still present, or at its old index if none is.
    fn restore(&mut self, task: Task, origin: &Origin) {
        let present = |id: &TaskId| self.position_of(&self.resolve(id));
        let at = origin
            .next
            .iter()
            .find_map(present)
            .or_else(|| origin.prev.iter().find_map(present).map(|at| at + 1))
            .unwrap_or_else(|| origin.position.min(self.tasks.len()));
        self.tasks.insert(at, task);
    }

    /// Applies one bulk delta locally, returning the write to persist.
    ///
    /// Deletes take their [`Origin`] from `origins`, captured before any
    /// task of the batch was removed.
    fn apply_bulk(
        &mut self,
        delta: BulkDelta,
        origins: &mut HashMap<TaskId, Origin>,
    ) -> Option<Write> {
        let id = self.resolve(delta.task_id());
        match delta {
            BulkDelta::UpdateStatus { status, .. } => {
                let Some(task) = self.task_mut(&id) else {
                    tracing::debug!(task_id = %id, "selected task vanished; skipping");
                    return None;
                };
                let previous = task.clone();
                let patch = TaskPatch::status(status);
                patch.apply_to(task);
                Some(Write::Update {
                    id,
                    patch,
                    previous,
                    origin: None,
                })
            }
            BulkDelta::Delete { .. } => {
                let (Some(position), Some(origin)) = (self.position_of(&id), origins.remove(&id))
                else {
                    tracing::debug!(task_id = %id, "selected task vanished; skipping");
                    return None;
                };
                let previous = self.tasks.remove(position);
                Some(Write::Delete {
                    id,
                    previous,
                    origin,
                })
            }
        }
    }

    fn apply_bulk_all(&mut self, deltas: Vec<BulkDelta>) -> Vec<Dispatch> {
        let deleted: HashSet<TaskId> = deltas
            .iter()
            .filter(|delta| matches!(delta, BulkDelta::Delete { .. }))
            .map(|delta| self.resolve(delta.task_id()))
            .collect();
        let mut origins: HashMap<TaskId, Origin> = deleted
            .iter()
            .filter_map(|id| {
                let position = self.position_of(id)?;
                let origin = Origin::capture(&self.tasks, position, |other| deleted.contains(other));
                Some((id.clone(), origin))
            })
            .collect();
        let writes: Vec<Write> = deltas
            .into_iter()
            .filter_map(|delta| self.apply_bulk(delta, &mut origins))
            .collect();
        self.reindex();
        writes
            .into_iter()
            .filter_map(|write| self.plan(write))
            .collect()
    }

    /// Decides when `write` may be sent. `None` means never: its task was
    /// created locally and the create already failed.
    fn plan(&mut self, write: Write) -> Option<Dispatch> {
        if !write.id().is_provisional() {
            return Some(Dispatch::Ready(write));
        }
        let Some(waiters) = self.awaiting_create.get_mut(write.id()) else {
            tracing::debug!(task_id = %write.id(), "task was never created; change stays local");
            return None;
        };
        let (tx, rx) = oneshot::channel();
        waiters.push(tx);
        Some(Dispatch::AfterCreate(rx, write))
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            index: self.index.clone(),
            filters: self.filters.clone(),
            selection: self.selection.clone(),
            is_loading: self.is_loading,
            refresh_generation: self.refresh_generation,
            tasks: self.tasks.clone(),
        }
    }
}

/// State shared between the session and its in-flight repository calls.
struct Inner<R> {
    repo: Arc<R>,
    state: Mutex<BoardState>,
    notifier: Notifier,
    policy: ReconcilePolicy,
}

impl<R: TaskRepository> Inner<R> {
    async fn run(&self, dispatch: Dispatch) -> bool {
        match dispatch {
            Dispatch::Ready(write) => self.send(write).await,
            Dispatch::AfterCreate(created, write) => {
                if let Ok(Some(real)) = created.await {
                    self.send(write.rekeyed(real)).await
                } else {
                    tracing::debug!(task_id = %write.id(), "create failed; dropping dependent change");
                    false
                }
            }
        }
    }

    async fn send(&self, write: Write) -> bool {
        match write {
            Write::Update {
                id,
                patch,
                previous,
                origin,
            } => match self.repo.update(&id, &patch).await {
                Ok(()) => {
                    self.notifier
                        .emit(Notification::success(NotificationKind::Update, id));
                    true
                }
                Err(err) => {
                    tracing::warn!(task_id = %id, error = %err, "task update failed");
                    if self.policy == ReconcilePolicy::Rollback {
                        let mut state = self.state.lock();
                        let restored = state
                            .task_mut(&id)
                            .is_some_and(|task| patch.revert_on(task, &previous));
                        if restored {
                            if let Some(origin) = &origin
                                && let Some(at) = state.position_of(&id)
                            {
                                let task = state.tasks.remove(at);
                                state.restore(task, origin);
                            }
                            state.reindex();
                            tracing::warn!(task_id = %id, "rolled back task update");
                        }
                    }
                    self.notifier
                        .emit(Notification::failure(NotificationKind::Update, Some(id)));
                    false
                }
            },
            Write::Delete {
                id,
                previous,
                origin,
            } => match self.repo.delete(&id).await {
                Ok(()) => {
                    self.notifier
                        .emit(Notification::success(NotificationKind::Delete, id));
                    true
                }
                Err(err) => {
                    tracing::warn!(task_id = %id, error = %err, "task delete failed");
                    if self.policy == ReconcilePolicy::Rollback {
                        let mut state = self.state.lock();
                        if state.position_of(&id).is_none() {
                            state.restore(previous, &origin);
                            state.reindex();
                            tracing::warn!(task_id = %id, "restored task after failed delete");
                        }
                    }
                    self.notifier
                        .emit(Notification::failure(NotificationKind::Delete, Some(id)));
                    false
                }
            },
        }
    }

    async fn create(&self, provisional: TaskId, new_task: NewTask) -> bool {
        let result = self.repo.create(&new_task).await;
        let waiters = {
            let mut state = self.state.lock();
            match &result {
                Ok(id) => state.rekey(&provisional, id),
                Err(_) if self.policy == ReconcilePolicy::Rollback => {
                    if let Some(position) = state.position_of(&provisional) {
                        state.tasks.remove(position);
                        state.selection.remove(&provisional);
                        state.reindex();
                        tracing::warn!(task_id = %provisional, "removed task after failed create");
                    }
                }
                Err(_) => {}
            }
            state.awaiting_create.remove(&provisional).unwrap_or_default()
        };

        match result {
            Ok(id) => {
                tracing::info!(provisional = %provisional, task_id = %id, "task create reconciled");
                self.notifier
                    .emit(Notification::success(NotificationKind::Create, id.clone()));
                for waiter in waiters {
                    let _ = waiter.send(Some(id.clone()));
                }
                true
            }
            Err(err) => {
                tracing::warn!(task_id = %provisional, error = %err, "task create failed");
                self.notifier.emit(Notification::failure(
                    NotificationKind::Create,
                    Some(provisional),
                ));
                for waiter in waiters {
                    let _ = waiter.send(None);
                }
                false
            }
        }
    }

    async fn refresh(&self, generation: u64, owner: OwnerId) -> bool {
        let result = self.repo.list(&owner).await;
        let mut state = self.state.lock();
        if state.refresh_generation != generation {
            tracing::debug!(
                generation,
                current = state.refresh_generation,
                "discarding stale refresh result"
            );
            return result.is_ok();
        }
        state.is_loading = false;
        match result {
            Ok(tasks) => {
                let count = tasks.len();
                state.replace_tasks(tasks);
                tracing::info!(generation, tasks = count, "task collection refreshed");
                true
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "task refresh failed");
                self.notifier
                    .emit(Notification::failure(NotificationKind::Refresh, None));
                false
            }
        }
    }
}

/// Coordinator owning one user's task board.
///
/// Entry points never block on the repository. They must be called from
/// within a Tokio runtime.
pub struct BoardSession<R> {
    inner: Arc<Inner<R>>,
    context: SessionContext,
}

impl<R: TaskRepository + 'static> BoardSession<R> {
    /// Creates a session bound to `context` and returns the receiver for
    /// its notifications.
    ///
    /// The session starts empty; call [`request_refresh`](Self::request_refresh)
    /// to load tasks.
    #[must_use]
    pub fn new(
        repo: Arc<R>,
        context: SessionContext,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (notifier, rx) = Notifier::channel(config.notification_buffer);
        let inner = Inner {
            repo,
            state: Mutex::new(BoardState::default()),
            notifier,
            policy: config.policy,
        };
        let session = Self {
            inner: Arc::new(inner),
            context,
        };
        (session, rx)
    }

    /// The context this session reads the owner from.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Failure handling in effect.
    #[must_use]
    pub fn policy(&self) -> ReconcilePolicy {
        self.inner.policy
    }

    /// Read-only copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner.state.lock().snapshot()
    }

    fn owner(&self) -> Result<OwnerId, BoardError> {
        self.context.owner().ok_or(BoardError::NotAuthenticated)
    }

    fn spawn(&self, dispatch: Dispatch) -> JoinHandle<bool> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(dispatch).await })
    }

    fn spawn_all(&self, dispatches: impl IntoIterator<Item = Dispatch>) -> MutationHandle {
        MutationHandle {
            calls: dispatches.into_iter().map(|d| self.spawn(d)).collect(),
        }
    }

    /// Re-fetches the owner's tasks and rebuilds the index from scratch,
    /// discarding unreconciled local changes.
    ///
    /// A result that arrives after a newer refresh was requested is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown.
    pub fn request_refresh(&self) -> Result<MutationHandle, BoardError> {
        let owner = self.owner()?;
        let generation = {
            let mut state = self.inner.state.lock();
            state.refresh_generation += 1;
            state.is_loading = true;
            state.refresh_generation
        };
        tracing::info!(generation, owner = %owner, "refresh requested");
        let inner = Arc::clone(&self.inner);
        Ok(MutationHandle::single(tokio::spawn(async move {
            inner.refresh(generation, owner).await
        })))
    }

    /// Adds a task under a provisional id and asks the repository to
    /// create it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown.
    pub fn create_task(&self, draft: TaskDraft) -> Result<MutationHandle, BoardError> {
        let new_task = draft.for_owner(self.owner()?);
        let provisional = TaskId::provisional();
        {
            let mut state = self.inner.state.lock();
            state
                .tasks
                .push(new_task.clone().into_task(provisional.clone()));
            state.awaiting_create.insert(provisional.clone(), Vec::new());
            state.reindex();
        }
        tracing::debug!(task_id = %provisional, "optimistic create");
        let inner = Arc::clone(&self.inner);
        Ok(MutationHandle::single(tokio::spawn(async move {
            inner.create(provisional, new_task).await
        })))
    }

    /// Changes one task's status.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown, or
    /// [`BoardError::TaskNotFound`] for an unknown id.
    pub fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<MutationHandle, BoardError> {
        self.update_task(id, TaskPatch::status(status))
    }

    /// Applies a partial edit to one task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown, or
    /// [`BoardError::TaskNotFound`] for an unknown id.
    pub fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<MutationHandle, BoardError> {
        self.owner()?;
        let dispatch = {
            let mut state = self.inner.state.lock();
            let id = state.resolve(id);
            let task = state
                .task_mut(&id)
                .ok_or_else(|| BoardError::TaskNotFound(id.clone()))?;
            if patch.is_empty() {
                return Ok(MutationHandle::none());
            }
            let previous = task.clone();
            patch.apply_to(task);
            state.reindex();
            tracing::debug!(task_id = %id, "optimistic update");
            state.plan(Write::Update {
                id,
                patch,
                previous,
                origin: None,
            })
        };
        Ok(self.spawn_all(dispatch))
    }

    /// Applies a drag-and-drop move.
    ///
    /// Invalid moves (cancelled drags, stale source slots) and drops onto
    /// the task's own slot change nothing and return an empty handle. A
    /// move within one status is local only; a move across statuses also
    /// persists the new status.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown.
    pub fn move_task(&self, mv: &MoveRequest) -> Result<MutationHandle, BoardError> {
        self.owner()?;
        let dispatch = {
            let mut state = self.inner.state.lock();
            let mv = MoveRequest {
                task_id: state.resolve(&mv.task_id),
                ..mv.clone()
            };
            let outcome = match reorder::try_apply(&state.index, &mv) {
                Ok(outcome) if outcome.changed => outcome,
                Ok(_) => return Ok(MutationHandle::none()),
                Err(err) => {
                    tracing::debug!(task_id = %mv.task_id, error = %err, "ignoring invalid move");
                    return Ok(MutationHandle::none());
                }
            };
            let Some(position) = state.position_of(&mv.task_id) else {
                return Ok(MutationHandle::none());
            };

            let origin = Origin::capture(&state.tasks, position, |other| *other == mv.task_id);
            let mut task = state.tasks.remove(position);
            let previous = task.clone();
            if let Some(delta) = &outcome.delta {
                task.status = delta.status;
            }
            let at = state.insertion_point(&outcome.index, &task, position);
            state.tasks.insert(at, task);
            state.index = outcome.index;
            debug_assert_eq!(state.index, state.rebuilt_index());
            tracing::debug!(task_id = %mv.task_id, to = ?mv.to, "optimistic move");

            outcome.delta.and_then(|delta| {
                state.plan(Write::Update {
                    id: delta.task_id,
                    patch: TaskPatch::status(delta.status),
                    previous,
                    origin: Some(origin),
                })
            })
        };
        Ok(self.spawn_all(dispatch))
    }

    /// Removes one task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown, or
    /// [`BoardError::TaskNotFound`] for an unknown id.
    pub fn delete_task(&self, id: &TaskId) -> Result<MutationHandle, BoardError> {
        self.owner()?;
        let dispatch = {
            let mut state = self.inner.state.lock();
            let id = state.resolve(id);
            let position = state
                .position_of(&id)
                .ok_or_else(|| BoardError::TaskNotFound(id.clone()))?;
            let origin = Origin::capture(&state.tasks, position, |other| *other == id);
            let previous = state.tasks.remove(position);
            state.selection.remove(&id);
            state.reindex();
            tracing::debug!(task_id = %id, "optimistic delete");
            state.plan(Write::Delete {
                id,
                previous,
                origin,
            })
        };
        Ok(self.spawn_all(dispatch))
    }

    /// Sets every selected task to `status` and clears the selection.
    ///
    /// Each task is persisted independently; one failure does not affect
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown.
    pub fn bulk_set_status(&self, status: TaskStatus) -> Result<MutationHandle, BoardError> {
        self.owner()?;
        let dispatches = {
            let mut state = self.inner.state.lock();
            let deltas = state.selection.bulk_set_status(status);
            let planned = state.apply_bulk_all(deltas);
            tracing::debug!(count = planned.len(), status = %status, "optimistic bulk status change");
            planned
        };
        Ok(self.spawn_all(dispatches))
    }

    /// Deletes every selected task and clears the selection.
    ///
    /// Each task is persisted independently; one failure does not affect
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAuthenticated`] after context teardown.
    pub fn bulk_delete(&self) -> Result<MutationHandle, BoardError> {
        self.owner()?;
        let dispatches = {
            let mut state = self.inner.state.lock();
            let deltas = state.selection.bulk_delete();
            let planned = state.apply_bulk_all(deltas);
            tracing::debug!(count = planned.len(), "optimistic bulk delete");
            planned
        };
        Ok(self.spawn_all(dispatches))
    }

    /// Merges `patch` into the active filters and rebuilds the index.
    pub fn set_filter(&self, patch: FilterPatch) {
        let mut state = self.inner.state.lock();
        state.filters.update(patch);
        state.reindex();
        tracing::debug!(filters = ?state.filters, visible = state.index.len(), "filters changed");
    }

    /// Toggles selection of `id`. Returns `true` if it is now selected.
    pub fn toggle_select(&self, id: &TaskId) -> bool {
        let mut state = self.inner.state.lock();
        let id = state.resolve(id);
        state.selection.toggle(id)
    }

    /// Deselects everything.
    pub fn clear_selection(&self) {
        self.inner.state.lock().selection.clear();
    }
}
