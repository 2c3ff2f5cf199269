//! Plain-text presentation of a board snapshot.
//!
//! Both view modes render the same [`BoardSnapshot`]; the session does not
//! know which one is in use.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use taskboard_proto::task::{MAX_DESCRIPTION_LENGTH, Task, TaskStatus};

use crate::board::BoardSnapshot;

/// Width of one board column, in characters.
const COLUMN_WIDTH: usize = 30;

/// How the board is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Status groups stacked vertically.
    #[default]
    List,
    /// Status groups as side-by-side kanban columns.
    Board,
}

impl ViewMode {
    /// Returns the config-file spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Board => "board",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`ViewMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view mode {0:?} (expected \"list\" or \"board\")")]
pub struct ParseViewModeError(pub String);

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "board" | "kanban" => Ok(Self::Board),
            _ => Err(ParseViewModeError(s.to_string())),
        }
    }
}

/// Renders `snapshot` in the given mode.
///
/// `date_format` is a chrono format string for due dates.
#[must_use]
pub fn render(snapshot: &BoardSnapshot, mode: ViewMode, date_format: &str) -> String {
    let mut out = String::new();
    if snapshot.is_loading {
        out.push_str("(loading)\n");
    }
    match mode {
        ViewMode::List => render_list(&mut out, snapshot, date_format),
        ViewMode::Board => render_board(&mut out, snapshot, date_format),
    }
    if !snapshot.selection.is_empty() {
        let _ = writeln!(out, "{} selected", snapshot.selection.len());
    }
    out
}

fn render_list(out: &mut String, snapshot: &BoardSnapshot, date_format: &str) {
    if snapshot.visible_len() == 0 {
        out.push_str("No tasks\n");
        return;
    }
    for status in TaskStatus::ALL {
        let column = snapshot.column(status);
        let _ = writeln!(out, "{status} ({})", column.len());
        for task in column {
            let mark = if snapshot.selection.contains(&task.id) {
                'x'
            } else {
                ' '
            };
            let _ = writeln!(
                out,
                "  [{mark}] {}  {}{}  [{}]",
                task.id,
                task.title,
                due_suffix(task, date_format),
                task.category
            );
            if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(out, "        {}", truncate(description, MAX_DESCRIPTION_LENGTH));
            }
        }
    }
}

fn render_board(out: &mut String, snapshot: &BoardSnapshot, date_format: &str) {
    let columns: Vec<Vec<String>> = TaskStatus::ALL
        .into_iter()
        .map(|status| {
            let tasks = snapshot.column(status);
            let mut cells = vec![
                format!("{status} ({})", tasks.len()),
                "-".repeat(COLUMN_WIDTH - 2),
            ];
            cells.extend(tasks.into_iter().map(|task| {
                let mark = if snapshot.selection.contains(&task.id) { "*" } else { "" };
                format!("{mark}{}{}", task.title, due_suffix(task, date_format))
            }));
            cells
        })
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..height {
        let line: String = columns
            .iter()
            .map(|cells| {
                let cell = cells.get(row).map_or("", String::as_str);
                format!("{:<width$}", truncate(cell, COLUMN_WIDTH - 2), width = COLUMN_WIDTH)
            })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

/// Formats the due date, falling back to ISO 8601 if `date_format` is not
/// a valid chrono format string.
fn due_suffix(task: &Task, date_format: &str) -> String {
    let Some(date) = task.due_date else {
        return String::new();
    };
    let mut text = String::new();
    if write!(text, "{}", date.format(date_format)).is_err() {
        text = date.to_string();
    }
    format!(" (due {text})")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
