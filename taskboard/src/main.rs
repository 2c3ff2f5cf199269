//! `taskboard`: personal task board on the command line.
//!
//! Each invocation signs in the configured owner, loads the board from the
//! snapshot file, applies at most one operation, waits for it to be
//! persisted, and prints the resulting board. Notifications go to stderr.
//!
//! ```bash
//! taskboard add "Write report" --due 2025-03-14 --category work
//! taskboard move <id> --to in-progress --position 0
//! taskboard bulk-status completed <id> <id>
//! taskboard --view board list --search report
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::board::{
    BoardError, BoardSession, FilterPatch, MoveRequest, MutationHandle, Settled, Slot,
};
use taskboard::config::{CliArgs, Command, TaskboardConfig};
use taskboard::context::{AuthenticatedUser, SessionContext};
use taskboard::notify::{Notification, NotificationLevel};
use taskboard::repository::file::FileRepository;
use taskboard::ui;
use taskboard_proto::date::parse_calendar_date;
use taskboard_proto::task::{Category, ParseStatusError, TaskDraft, TaskId, TaskPatch, TaskStatus};

/// Errors that end an invocation before the board is printed.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Status(#[from] ParseStatusError),
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    Date(String),
    #[error("no task with id {0} on the board")]
    UnknownTask(String),
    #[error("failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let config = match TaskboardConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(data_file = %config.data_file.display(), owner = %config.owner, "taskboard starting");

    match run(&cli, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging.
///
/// Logs go to stderr unless `file_path` is given, in which case they are
/// written through a non-blocking appender. The returned [`WorkerGuard`]
/// must be held until shutdown to flush buffered entries.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let Some(log_path) = file_path else {
        builder.with_writer(std::io::stderr).init();
        return None;
    };

    let log_dir = log_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    builder.with_writer(non_blocking).with_ansi(false).init();

    Some(guard)
}

/// Runs one invocation. Returns `Ok(false)` if a repository call failed.
async fn run(cli: &CliArgs, config: &TaskboardConfig) -> Result<bool, CliError> {
    let mut user = AuthenticatedUser::new(config.owner.clone());
    user.display_name.clone_from(&config.display_name);
    let context = SessionContext::signed_in(user);

    let repo = Arc::new(FileRepository::new(&config.data_file));
    let (session, mut notifications) =
        BoardSession::new(repo, context.clone(), config.session_config());
    tracing::debug!(policy = %session.policy(), "board session opened");

    let loaded = session.request_refresh()?.settled().await;
    let settled = if loaded.all_succeeded() {
        let command = cli.command.clone().unwrap_or(Command::List {
            search: None,
            category: None,
            due: None,
        });
        execute(&session, command)?.settled().await
    } else {
        Settled::default()
    };

    while let Ok(notification) = notifications.try_recv() {
        print_notification(&notification);
    }

    let snapshot = session.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", ui::render(&snapshot, config.view, &config.date_format));
    }

    context.teardown();
    tracing::info!(
        writes = settled.total(),
        succeeded = settled.succeeded,
        failed = settled.failed,
        "taskboard exiting"
    );
    Ok(loaded.all_succeeded() && settled.all_succeeded())
}

fn execute(
    session: &BoardSession<FileRepository>,
    command: Command,
) -> Result<MutationHandle, CliError> {
    let handle = match command {
        Command::List {
            search,
            category,
            due,
        } => {
            let mut patch = FilterPatch::default();
            if let Some(text) = search {
                patch = patch.and(FilterPatch::search(text));
            }
            if let Some(category) = category {
                patch = patch.and(FilterPatch::category(&category));
            }
            if let Some(due) = due {
                patch = patch.and(FilterPatch::due_date(&due));
            }
            session.set_filter(patch);
            MutationHandle::none()
        }
        Command::Add {
            title,
            due,
            category,
            status,
            description,
        } => {
            let mut draft = TaskDraft::new(title);
            if let Some(due) = due {
                draft = draft.with_due_date(parse_date(&due)?);
            }
            if let Some(category) = category {
                draft = draft.with_category(Category::from(category));
            }
            if let Some(status) = status {
                draft = draft.with_status(status.parse()?);
            }
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            session.create_task(draft)?
        }
        Command::Move { id, to, position } => {
            let status: TaskStatus = to.parse()?;
            let id = TaskId::new(id);
            let (from_status, from_position) = session
                .snapshot()
                .index
                .locate(&id)
                .ok_or_else(|| CliError::UnknownTask(id.to_string()))?;
            session.move_task(&MoveRequest::new(
                id,
                Slot::new(from_status, from_position),
                Slot::new(status, position.unwrap_or(usize::MAX)),
            ))?
        }
        Command::Status { id, status } => {
            session.update_status(&TaskId::new(id), status.parse()?)?
        }
        Command::Edit {
            id,
            title,
            due,
            category,
            description,
        } => {
            let due_date = due
                .map(|due| {
                    if due.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_date(&due).map(Some)
                    }
                })
                .transpose()?;
            let patch = TaskPatch {
                title,
                description: description.map(|text| (!text.is_empty()).then_some(text)),
                due_date,
                status: None,
                category: category.map(Category::from),
            };
            session.update_task(&TaskId::new(id), patch)?
        }
        Command::Delete { id } => session.delete_task(&TaskId::new(id))?,
        Command::BulkStatus { status, ids } => {
            let status: TaskStatus = status.parse()?;
            select_all(session, ids)?;
            session.bulk_set_status(status)?
        }
        Command::BulkDelete { ids } => {
            select_all(session, ids)?;
            session.bulk_delete()?
        }
    };
    Ok(handle)
}

fn select_all(session: &BoardSession<FileRepository>, ids: Vec<String>) -> Result<(), CliError> {
    let snapshot = session.snapshot();
    session.clear_selection();
    for id in ids.into_iter().map(TaskId::new) {
        if snapshot.task(&id).is_none() {
            session.clear_selection();
            return Err(CliError::UnknownTask(id.to_string()));
        }
        // Repeated ids must stay selected.
        if !session.toggle_select(&id) {
            session.toggle_select(&id);
        }
    }
    Ok(())
}

fn parse_date(input: &str) -> Result<chrono::NaiveDate, CliError> {
    parse_calendar_date(input).ok_or_else(|| CliError::Date(input.to_string()))
}

fn print_notification(notification: &Notification) {
    let label = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };
    match &notification.task_id {
        Some(id) => eprintln!("[{label}] {} ({id})", notification.message),
        None => eprintln!("[{label}] {}", notification.message),
    }
}
