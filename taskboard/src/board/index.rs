//! Status-partitioned view of the visible tasks.
//!
//! A [`GroupIndex`] maps each of the three statuses to an ordered list of
//! task ids. The order is the on-screen order. Every status always has a
//! sequence, possibly empty, so consumers never special-case a missing key.

use serde::ser::{Serialize, SerializeMap, Serializer};
use taskboard_proto::task::{Task, TaskId, TaskStatus};

/// Ordered per-status sequences of visible task ids.
///
/// The index is a partition: each visible task id appears in exactly one
/// sequence. It is a derived view owned by the board session, never a
/// second source of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    columns: [Vec<TaskId>; 3],
}

impl GroupIndex {
    /// Partitions `tasks` by status, keeping their relative order within
    /// each status.
    pub fn build<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut index = Self::default();
        for task in tasks {
            index.columns[task.status.ordinal()].push(task.id.clone());
        }
        index
    }

    /// Number of tasks shown under `status`.
    #[must_use]
    pub fn count_of(&self, status: TaskStatus) -> usize {
        self.columns[status.ordinal()].len()
    }

    /// Ordered ids shown under `status`.
    #[must_use]
    pub fn sequence_of(&self, status: TaskStatus) -> &[TaskId] {
        &self.columns[status.ordinal()]
    }

    pub(crate) fn sequence_mut(&mut self, status: TaskStatus) -> &mut Vec<TaskId> {
        &mut self.columns[status.ordinal()]
    }

    /// Finds the status and position of `id`, if it is visible.
    #[must_use]
    pub fn locate(&self, id: &TaskId) -> Option<(TaskStatus, usize)> {
        TaskStatus::ALL.into_iter().find_map(|status| {
            self.sequence_of(status)
                .iter()
                .position(|candidate| candidate == id)
                .map(|position| (status, position))
        })
    }

    /// Returns `true` if `id` appears in any sequence.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.columns.iter().any(|column| column.contains(id))
    }

    /// Total number of visible tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no task is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Iterates `(status, sequence)` pairs in board order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &[TaskId])> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| (status, self.sequence_of(status)))
    }

    /// Replaces `from` with `to` wherever it appears.
    pub(crate) fn rekey(&mut self, from: &TaskId, to: &TaskId) {
        for column in &mut self.columns {
            if let Some(slot) = column.iter_mut().find(|id| *id == from) {
                slot.clone_from(to);
            }
        }
    }
}

/// Serializes as a map from status wire name to ordered ids.
impl Serialize for GroupIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(TaskStatus::ALL.len()))?;
        for (status, ids) in self.iter() {
            map.serialize_entry(status.as_str(), ids)?;
        }
        map.end()
    }
}
