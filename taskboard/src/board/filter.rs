//! Filter pipeline over a task collection.
//!
//! Three predicates combined with AND: title substring, category, and due
//! date. Each one matches everything when its filter value is empty.
//! Filtering is pure and order-preserving.

use chrono::NaiveDate;
use serde::Serialize;
use taskboard_proto::date::parse_calendar_date;
use taskboard_proto::task::{Category, Task};

/// Active filter values. Owned by the board session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    /// Case-insensitive title substring; empty matches all.
    pub search_text: String,
    /// Category to keep; `None` matches all.
    pub category: Option<Category>,
    /// Due date to keep; `None` matches all.
    pub due_date: Option<NaiveDate>,
}

impl FilterState {
    /// Returns `true` if no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_text.is_empty() && self.category.is_none() && self.due_date.is_none()
    }

    /// Returns `true` if `task` passes every active predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_text(task) && self.matches_category(task) && self.matches_due_date(task)
    }

    fn matches_text(&self, task: &Task) -> bool {
        self.search_text.is_empty()
            || task
                .title
                .to_lowercase()
                .contains(&self.search_text.to_lowercase())
    }

    fn matches_category(&self, task: &Task) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| task.category.matches(category))
    }

    fn matches_due_date(&self, task: &Task) -> bool {
        self.due_date
            .is_none_or(|wanted| task.due_date == Some(wanted))
    }

    /// Merges a partial update into the current filters.
    pub fn update(&mut self, patch: FilterPatch) {
        if let Some(text) = patch.search_text {
            self.search_text = text;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

/// Partial update to [`FilterState`]. `None` fields keep their value.
///
/// The string constructors treat empty or malformed input as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    /// New search text.
    pub search_text: Option<String>,
    /// New category filter (`Some(None)` clears it).
    pub category: Option<Option<Category>>,
    /// New due-date filter (`Some(None)` clears it).
    pub due_date: Option<Option<NaiveDate>>,
}

impl FilterPatch {
    /// Sets the search text.
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Sets the category filter from user input; blank clears it.
    #[must_use]
    pub fn category(input: &str) -> Self {
        let category = (!input.trim().is_empty()).then(|| Category::from(input));
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Sets the due-date filter from user input; blank or malformed clears it.
    #[must_use]
    pub fn due_date(input: &str) -> Self {
        Self {
            due_date: Some(parse_calendar_date(input)),
            ..Self::default()
        }
    }

    /// Clears every filter.
    #[must_use]
    pub fn clear_all() -> Self {
        Self {
            search_text: Some(String::new()),
            category: Some(None),
            due_date: Some(None),
        }
    }

    /// Combines two patches; fields in `other` win.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        if other.search_text.is_some() {
            self.search_text = other.search_text;
        }
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.due_date.is_some() {
            self.due_date = other.due_date;
        }
        self
    }
}

/// Returns the tasks that pass `filters`, in their original order.
#[must_use]
pub fn apply<'a>(tasks: &'a [Task], filters: &FilterState) -> Vec<&'a Task> {
    tasks.iter().filter(|task| filters.matches(task)).collect()
}
