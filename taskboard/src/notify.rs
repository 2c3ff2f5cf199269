//! Notification sink for mutation outcomes.
//!
//! The board session reports every repository outcome as a one-shot
//! [`Notification`] over a bounded channel. Delivery is fire-and-forget:
//! if the receiver is gone or the buffer is full, the notification is
//! dropped and the session carries on.

use serde::Serialize;
use tokio::sync::mpsc;

use taskboard_proto::task::TaskId;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// A task was created or deleted.
    Success,
    /// A task edit was persisted.
    Info,
    /// A repository call failed.
    Error,
}

/// Which operation a notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Task creation.
    Create,
    /// Task update (including status changes and moves).
    Update,
    /// Task deletion.
    Delete,
    /// Full refresh of the task collection.
    Refresh,
}

/// A single user-facing outcome signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Operation reported on.
    pub kind: NotificationKind,
    /// Human-readable message.
    pub message: String,
    /// Task concerned, if any.
    pub task_id: Option<TaskId>,
}

impl Notification {
    /// Notification for a persisted mutation. Edits are reported at
    /// [`NotificationLevel::Info`], everything else at `Success`.
    #[must_use]
    pub fn success(kind: NotificationKind, task_id: TaskId) -> Self {
        let message = match kind {
            NotificationKind::Create => "Task added successfully!",
            NotificationKind::Update => "Task updated successfully!",
            NotificationKind::Delete => "Task deleted successfully!",
            NotificationKind::Refresh => "Tasks refreshed.",
        };
        let level = match kind {
            NotificationKind::Update => NotificationLevel::Info,
            _ => NotificationLevel::Success,
        };
        Self {
            level,
            kind,
            message: message.to_string(),
            task_id: Some(task_id),
        }
    }

    /// Error notification for a failed repository call.
    #[must_use]
    pub fn failure(kind: NotificationKind, task_id: Option<TaskId>) -> Self {
        let message = match kind {
            NotificationKind::Create => "Failed to add task!",
            NotificationKind::Update => "Failed to update task!",
            NotificationKind::Delete => "Failed to delete task!",
            NotificationKind::Refresh => "Failed to fetch tasks!",
        };
        Self {
            level: NotificationLevel::Error,
            kind,
            message: message.to_string(),
            task_id,
        }
    }

    /// Returns `true` for error notifications.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiver the presentation layer drains.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Emits a notification without waiting.
    pub fn emit(&self, notification: Notification) {
        if let Err(err) = self.tx.try_send(notification) {
            tracing::debug!(error = %err, "notification dropped");
        }
    }
}
