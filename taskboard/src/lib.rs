//! `Taskboard`: personal task board state engine.
//!
//! Groups a user's tasks by status, filters them, applies drag-and-drop
//! moves and bulk operations, and keeps the visible state in step with an
//! asynchronous repository through optimistic updates.

pub mod board;
pub mod config;
pub mod context;
pub mod notify;
pub mod repository;
pub mod ui;
