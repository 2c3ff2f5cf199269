//! Task board state engine.
//!
//! Data flows one way: the repository fills the task collection, the
//! [`filter`] pipeline narrows it, and the [`index`] groups the result by
//! status. Moves ([`reorder`]) and bulk operations ([`selection`]) propose
//! changes that only the [`session::BoardSession`] applies.

pub mod filter;
pub mod index;
pub mod reorder;
pub mod selection;
pub mod session;

use taskboard_proto::task::TaskId;

pub use filter::{FilterPatch, FilterState};
pub use index::GroupIndex;
pub use reorder::{InvalidMoveError, MoveRequest, Slot, StatusDelta};
pub use selection::{BulkDelta, Selection};
pub use session::{
    BoardSession, BoardSnapshot, MutationHandle, ReconcilePolicy, SessionConfig, Settled,
};

/// Errors returned synchronously by board session entry points.
///
/// Repository failures are never returned here; they arrive later as
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The session context has no signed-in user.
    #[error("no authenticated user in session context")]
    NotAuthenticated,

    /// The id does not name a task in the session's collection.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}
