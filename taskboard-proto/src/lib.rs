//! Shared record definitions for `Taskboard`.
//!
//! Everything that crosses the repository boundary lives here: task
//! identity, the task record and its partial forms, calendar-date parsing,
//! and the postcard snapshot codec used by file-backed stores.

pub mod codec;
pub mod date;
pub mod task;
