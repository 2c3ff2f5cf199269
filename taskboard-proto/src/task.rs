//! Task record types for `Taskboard`.
//!
//! Defines the persisted task record, its identity types, the status and
//! category enums, and the partial forms used for creation ([`NewTask`])
//! and updates ([`TaskPatch`]).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest description the create form accepts, in characters.
///
/// Exposed for presentation layers; the engine itself accepts any input.
pub const MAX_DESCRIPTION_LENGTH: usize = 300;

/// Prefix of ids minted locally before the repository assigns a real one.
const PROVISIONAL_PREFIX: &str = "local-";

/// Opaque task identifier assigned by the repository on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a repository-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a provisional identifier for an optimistically created task.
    ///
    /// Provisional ids are time-ordered (UUID v7) and never collide with
    /// each other; they are replaced once the repository acknowledges
    /// the create.
    #[must_use]
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_PREFIX}{}", Uuid::now_v7()))
    }

    /// Returns `true` if this id was minted locally and not yet confirmed.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    /// Returns the string form of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the authenticated user who owns a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wraps an authentication uid.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of this owner id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow status of a task. The domain is fixed at three values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TaskStatus {
    /// Not started.
    #[default]
    #[serde(rename = "Todo")]
    Todo,
    /// Actively being worked on.
    #[serde(rename = "In-Progress")]
    InProgress,
    /// Finished.
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    /// Every status, in board order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Returns the wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In-Progress",
            Self::Completed => "Completed",
        }
    }

    /// Returns the board position of this status (0-based).
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`TaskStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "to-do" | "to_do" => Ok(Self::Todo),
            "in-progress" | "in_progress" | "inprogress" | "doing" => Ok(Self::InProgress),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// Task category. Two well-known values plus free-form extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Work-related task.
    #[default]
    Work,
    /// Personal task.
    Personal,
    /// Any other category name, kept as written.
    Other(String),
}

impl Category {
    /// Returns the display name of this category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Other(name) => name,
        }
    }

    /// Case-insensitive equality on the display name.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.as_str().to_lowercase() == other.as_str().to_lowercase()
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("work") {
            Self::Work
        } else if trimmed.eq_ignore_ascii_case("personal") {
            Self::Personal
        } else {
            Self::Other(trimmed.to_string())
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task record.
///
/// Every task belongs to exactly one owner and has exactly one status at
/// any instant. The owner never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Repository-assigned identifier (or provisional, see [`TaskId::provisional`]).
    pub id: TaskId,
    /// Display title.
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar due date; `None` means no due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Workflow status.
    pub status: TaskStatus,
    /// Category.
    pub category: Category,
    /// Owner identity.
    pub owner_id: OwnerId,
}

/// User-supplied fields of a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Initial status (defaults to [`TaskStatus::Todo`]).
    pub status: TaskStatus,
    /// Category (defaults to [`Category::Work`]).
    pub category: Category,
}

impl TaskDraft {
    /// Starts a draft with the given title and default status and category.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches an owner, producing the record sent to the repository.
    #[must_use]
    pub fn for_owner(self, owner_id: OwnerId) -> NewTask {
        NewTask {
            owner_id,
            draft: self,
        }
    }
}

/// A task record without an id, as handed to the repository's `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Owner of the new task.
    pub owner_id: OwnerId,
    /// User-supplied fields.
    pub draft: TaskDraft,
}

impl NewTask {
    /// Materializes the full record under the given id.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.draft.title,
            description: self.draft.description,
            due_date: self.draft.due_date,
            status: self.draft.status,
            category: self.draft.category,
            owner_id: self.owner_id,
        }
    }
}

/// A partial update to a task. `None` fields are left untouched.
///
/// Identity and owner are not patchable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New due date (`Some(None)` clears it).
    pub due_date: Option<Option<NaiveDate>>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New category.
    pub category: Option<Category>,
}

impl TaskPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.category.is_none()
    }

    /// Writes every present field into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
    }

    /// Undoes this patch on `task` using the `previous` snapshot.
    ///
    /// A field is restored only while it still holds the value this patch
    /// wrote; a later edit to the same field wins. Returns `true` if any
    /// field was restored.
    pub fn revert_on(&self, task: &mut Task, previous: &Task) -> bool {
        let mut restored = false;
        if let Some(title) = &self.title
            && task.title == *title
        {
            task.title.clone_from(&previous.title);
            restored = true;
        }
        if let Some(description) = &self.description
            && task.description == *description
        {
            task.description.clone_from(&previous.description);
            restored = true;
        }
        if let Some(due_date) = self.due_date
            && task.due_date == due_date
        {
            task.due_date = previous.due_date;
            restored = true;
        }
        if let Some(status) = self.status
            && task.status == status
        {
            task.status = previous.status;
            restored = true;
        }
        if let Some(category) = &self.category
            && task.category == *category
        {
            task.category = previous.category.clone();
            restored = true;
        }
        restored
    }
}
