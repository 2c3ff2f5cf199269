//! Multi-select state and the bulk operations it drives.

use serde::Serialize;
use taskboard_proto::task::{TaskId, TaskStatus};

/// A per-task change produced by a bulk operation.
///
/// Bulk operations are not atomic: the session dispatches each delta on
/// its own and a failure never rolls back siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkDelta {
    /// Change one task's status.
    UpdateStatus {
        /// Target task.
        task_id: TaskId,
        /// New status.
        status: TaskStatus,
    },
    /// Delete one task.
    Delete {
        /// Target task.
        task_id: TaskId,
    },
}

impl BulkDelta {
    /// The task this delta targets.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::UpdateStatus { task_id, .. } | Self::Delete { task_id } => task_id,
        }
    }
}

/// Set of selected task ids, kept in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<TaskId>,
}

impl Selection {
    /// Adds `id` if absent, removes it if present.
    ///
    /// Returns `true` if the id is selected afterwards.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if let Some(position) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(position);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Returns `true` if nothing is selected; gates the bulk-action bar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.ids.contains(id)
    }

    /// Iterates selected ids in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskId> {
        self.ids.iter()
    }

    /// Emits one status update per selected id and clears the selection.
    pub fn bulk_set_status(&mut self, status: TaskStatus) -> Vec<BulkDelta> {
        self.ids
            .drain(..)
            .map(|task_id| BulkDelta::UpdateStatus { task_id, status })
            .collect()
    }

    /// Emits one delete per selected id and clears the selection.
    pub fn bulk_delete(&mut self) -> Vec<BulkDelta> {
        self.ids
            .drain(..)
            .map(|task_id| BulkDelta::Delete { task_id })
            .collect()
    }

    pub(crate) fn remove(&mut self, id: &TaskId) {
        self.ids.retain(|selected| selected != id);
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&TaskId) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub(crate) fn rekey(&mut self, from: &TaskId, to: &TaskId) {
        if let Some(slot) = self.ids.iter_mut().find(|id| *id == from) {
            slot.clone_from(to);
        }
    }
}
