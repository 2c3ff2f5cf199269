//! Configuration system for the `taskboard` CLI.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};

use crate::board::{ReconcilePolicy, SessionConfig};
use crate::board::session::DEFAULT_NOTIFICATION_BUFFER;
use crate::ui::ViewMode;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    repository: RepositoryFileConfig,
    session: SessionFileConfig,
    ui: UiFileConfig,
}

/// `[repository]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RepositoryFileConfig {
    data_file: Option<PathBuf>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    owner: Option<String>,
    display_name: Option<String>,
    reconcile: Option<ReconcilePolicy>,
    notification_buffer: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    view: Option<ViewMode>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct TaskboardConfig {
    // -- Repository --
    /// Snapshot file used by the file repository.
    pub data_file: PathBuf,

    // -- Session --
    /// Uid the session context is initialised with.
    pub owner: String,
    /// Display name for the session user.
    pub display_name: Option<String>,
    /// Failure handling for optimistic changes.
    pub reconcile: ReconcilePolicy,
    /// Capacity of the notification channel.
    pub notification_buffer: usize,

    // -- UI --
    /// Presentation mode.
    pub view: ViewMode,
    /// Due date display format (chrono format string).
    pub date_format: String,
}

impl Default for TaskboardConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            owner: "local".to_string(),
            display_name: None,
            reconcile: ReconcilePolicy::default(),
            notification_buffer: DEFAULT_NOTIFICATION_BUFFER,
            view: ViewMode::default(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl TaskboardConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path (`~/.config/taskboard/config.toml`)
    /// is tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `TaskboardConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.repository.data_file.clone())
                .unwrap_or(defaults.data_file),
            owner: cli
                .owner
                .clone()
                .or_else(|| file.session.owner.clone())
                .unwrap_or(defaults.owner),
            display_name: file.session.display_name.clone(),
            reconcile: cli
                .reconcile
                .or(file.session.reconcile)
                .unwrap_or(defaults.reconcile),
            notification_buffer: file
                .session
                .notification_buffer
                .unwrap_or(defaults.notification_buffer),
            view: cli.view.or(file.ui.view).unwrap_or(defaults.view),
            date_format: file
                .ui
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        }
    }

    /// Session tunables taken from this configuration.
    #[must_use]
    pub const fn session_config(&self) -> SessionConfig {
        SessionConfig {
            policy: self.reconcile,
            notification_buffer: self.notification_buffer,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Personal task board with optimistic persistence")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file holding the tasks.
    #[arg(long, env = "TASKBOARD_DATA_FILE", global = true)]
    pub data_file: Option<PathBuf>,

    /// Uid of the signed-in user.
    #[arg(long, env = "TASKBOARD_OWNER", global = true)]
    pub owner: Option<String>,

    /// What to do when a repository call fails (rollback, keep-local).
    #[arg(long, env = "TASKBOARD_RECONCILE", global = true)]
    pub reconcile: Option<ReconcilePolicy>,

    /// Presentation mode (list, board).
    #[arg(long, env = "TASKBOARD_VIEW", global = true)]
    pub view: Option<ViewMode>,

    /// Print the resulting board snapshot as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "TASKBOARD_LOG", global = true)]
    pub log_level: String,

    /// Path to log file (default: stderr).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Operation to run (default: list).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One board operation per invocation.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the board.
    List {
        /// Only tasks whose title contains this text (case-insensitive).
        #[arg(long)]
        search: Option<String>,
        /// Only tasks in this category.
        #[arg(long)]
        category: Option<String>,
        /// Only tasks due on this date.
        #[arg(long)]
        due: Option<String>,
    },
    /// Create a task.
    Add {
        /// Task title.
        title: String,
        /// Due date (`YYYY-MM-DD` or RFC 3339).
        #[arg(long)]
        due: Option<String>,
        /// Category (Work, Personal, or any other name).
        #[arg(long)]
        category: Option<String>,
        /// Initial status.
        #[arg(long)]
        status: Option<String>,
        /// Free-text description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Drag a task to another status or position.
    Move {
        /// Task id.
        id: String,
        /// Destination status.
        #[arg(long)]
        to: String,
        /// Destination position (default: end of column).
        #[arg(long)]
        position: Option<usize>,
    },
    /// Change one task's status.
    Status {
        /// Task id.
        id: String,
        /// New status.
        status: String,
    },
    /// Edit one task's fields.
    Edit {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New due date; an empty value clears it.
        #[arg(long)]
        due: Option<String>,
        /// New category.
        #[arg(long)]
        category: Option<String>,
        /// New description; an empty value clears it.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete one task.
    Delete {
        /// Task id.
        id: String,
    },
    /// Select several tasks and set their status.
    BulkStatus {
        /// New status.
        status: String,
        /// Task ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Select several tasks and delete them.
    BulkDelete {
        /// Task ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_data_file() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("taskboard.bin"),
        |dir| dir.join("taskboard").join("tasks.bin"),
    )
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
