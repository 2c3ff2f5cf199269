//! Drag-and-drop move engine.
//!
//! Computes the [`GroupIndex`] that results from dropping a task at a new
//! slot, and the persistence delta that goes with it. Only a change of
//! status is ever persisted; order within a status is presentation-only.

use serde::Serialize;
use taskboard_proto::task::{TaskId, TaskStatus};

use super::index::GroupIndex;

/// A position within one status sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Status column.
    pub status: TaskStatus,
    /// Zero-based position in that column.
    pub position: usize,
}

impl Slot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(status: TaskStatus, position: usize) -> Self {
        Self { status, position }
    }
}

/// A completed drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    /// Task being dragged.
    pub task_id: TaskId,
    /// Where the drag started.
    pub from: Slot,
    /// Where it was dropped; `None` if released outside any drop target.
    pub to: Option<Slot>,
}

impl MoveRequest {
    /// A move dropped onto `to`.
    #[must_use]
    pub const fn new(task_id: TaskId, from: Slot, to: Slot) -> Self {
        Self {
            task_id,
            from,
            to: Some(to),
        }
    }

    /// A drag released outside every drop target.
    #[must_use]
    pub const fn cancelled(task_id: TaskId, from: Slot) -> Self {
        Self {
            task_id,
            from,
            to: None,
        }
    }
}

/// The persisted effect of a cross-status move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDelta {
    /// Moved task.
    pub task_id: TaskId,
    /// Its new status.
    pub status: TaskStatus,
}

/// Why a move could not be applied. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMoveError {
    /// The drag ended outside any drop target.
    #[error("drop target is undefined")]
    NoDropTarget,
    /// The source position does not exist in the source column.
    #[error("position {position} is out of range for {status} (length {len})")]
    PositionOutOfRange {
        /// Source status.
        status: TaskStatus,
        /// Requested position.
        position: usize,
        /// Length of the column.
        len: usize,
    },
    /// The task at the source position is not the one being dragged.
    #[error("expected task {expected} at source position, found {found}")]
    TaskMismatch {
        /// Dragged task.
        expected: TaskId,
        /// Task actually at that position.
        found: TaskId,
    },
}

/// Result of a successfully validated move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The patched index.
    pub index: GroupIndex,
    /// Status change to persist, if the task changed column.
    pub delta: Option<StatusDelta>,
    /// `false` when the task was dropped back onto its own slot.
    pub changed: bool,
}

/// Applies `mv` to `index`, or explains why it cannot be applied.
///
/// The destination position is clamped to the destination column's length
/// after the task has been removed from its source.
///
/// # Errors
///
/// Returns [`InvalidMoveError`] if the drop target is undefined or the
/// source slot does not hold the dragged task.
pub fn try_apply(index: &GroupIndex, mv: &MoveRequest) -> Result<MoveOutcome, InvalidMoveError> {
    let to = mv.to.ok_or(InvalidMoveError::NoDropTarget)?;
    let source = index.sequence_of(mv.from.status);
    let found = source
        .get(mv.from.position)
        .ok_or(InvalidMoveError::PositionOutOfRange {
            status: mv.from.status,
            position: mv.from.position,
            len: source.len(),
        })?;
    if *found != mv.task_id {
        return Err(InvalidMoveError::TaskMismatch {
            expected: mv.task_id.clone(),
            found: found.clone(),
        });
    }

    if to == mv.from {
        return Ok(MoveOutcome {
            index: index.clone(),
            delta: None,
            changed: false,
        });
    }

    let mut next = index.clone();
    let moved = next.sequence_mut(mv.from.status).remove(mv.from.position);
    let destination = next.sequence_mut(to.status);
    let position = to.position.min(destination.len());
    destination.insert(position, moved);

    let delta = (mv.from.status != to.status).then(|| StatusDelta {
        task_id: mv.task_id.clone(),
        status: to.status,
    });
    Ok(MoveOutcome {
        index: next,
        delta,
        changed: true,
    })
}

/// Applies `mv` to `index`, treating invalid moves as no-ops.
///
/// Returns the new index and the status delta to persist, if any.
#[must_use]
pub fn apply(index: &GroupIndex, mv: &MoveRequest) -> (GroupIndex, Option<StatusDelta>) {
    match try_apply(index, mv) {
        Ok(outcome) => (outcome.index, outcome.delta),
        Err(err) => {
            tracing::debug!(task_id = %mv.task_id, error = %err, "ignoring invalid move");
            (index.clone(), None)
        }
    }
}
