//! Error types for the cdrip command core.

use crate::task::TaskException;
use std::path::PathBuf;
use thiserror::Error;

/// Reserved process exit statuses.
pub mod exit_status {
    /// Command completed, or help was displayed without further action.
    pub const SUCCESS: i32 = 0;
    /// The first remaining token did not name a registered subcommand.
    pub const UNKNOWN_SUBCOMMAND: i32 = 1;
    /// Command-line usage error (clap's own convention).
    pub const USAGE: i32 = 2;
    /// Device enumeration returned no drives.
    pub const NO_DEVICE: i32 = 3;
    /// The chosen device path does not exist after symlink resolution.
    pub const DEVICE_NOT_FOUND: i32 = 4;
    /// A leaf command surfaced a task failure.
    pub const TASK_FAILED: i32 = 5;
    /// Writing command output failed.
    pub const IO_ERROR: i32 = 74;
    /// An option was registered incorrectly (programming defect).
    pub const SOFTWARE: i32 = 70;
    /// The configuration file could not be loaded or holds a bad value.
    pub const CONFIG: i32 = 78;
}

/// Option registration defects. These are programming mistakes, raised
/// before any argv parsing takes place.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("parser requires a 'dest' argument (flags: {flags:?})")]
    MissingDest { flags: Vec<String> },

    #[error("option '{dest}' has no flags")]
    MissingFlags { dest: String },

    #[error("option '{dest}' has invalid flag '{flag}'")]
    InvalidFlag { dest: String, flag: String },

    #[error("option '{0}' is registered twice on the same command")]
    DuplicateDest(String),

    #[error("flag '{flag}' of option '{dest}' is already used by '{owner}'")]
    DuplicateFlag {
        flag: String,
        dest: String,
        owner: String,
    },

    #[error("default for option '{dest}' is not a {expected} value")]
    DefaultTypeMismatch { dest: String, expected: &'static str },

    #[error("invalid option descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Configuration store errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Configuration section [{section}] is not a table: {source}")]
    MalformedSection {
        section: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("Configuration value [{section}] {key} is not a valid {expected}: {source}")]
    InvalidValue {
        section: String,
        key: String,
        expected: &'static str,
        #[source]
        source: config::ConfigError,
    },

    #[error("Logging configuration error: {0}")]
    Logging(String),
}

/// Errors surfaced by the command dispatch chain.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// A dispatching command was invoked without a subcommand. Carries the
    /// rendered help text; this is a successful outcome.
    #[error("no subcommand given")]
    HelpShown { help: String },

    #[error("incorrect subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("No CD-DA drives found!")]
    NoDevice,

    #[error("CD-DA device {} not found!", .0.display())]
    DeviceNotFound(PathBuf),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Task(#[from] TaskException),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Process exit status reserved for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Registration(_) => exit_status::SOFTWARE,
            CommandError::Config(_) => exit_status::CONFIG,
            CommandError::Usage(e) => e.exit_code(),
            CommandError::HelpShown { .. } => exit_status::SUCCESS,
            CommandError::UnknownSubcommand(_) => exit_status::UNKNOWN_SUBCOMMAND,
            CommandError::NoDevice => exit_status::NO_DEVICE,
            CommandError::DeviceNotFound(_) => exit_status::DEVICE_NOT_FOUND,
            CommandError::InvalidArgument(_) => exit_status::USAGE,
            CommandError::Task(_) => exit_status::TASK_FAILED,
            CommandError::Io(_) => exit_status::IO_ERROR,
        }
    }
}
