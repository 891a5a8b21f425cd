//! CLI output: error mapping from command errors to user-facing messages.

use crate::error::CommandError;

/// Message to print on stderr for `e`, or `None` when the error was already
/// reported at critical severity where it was raised.
pub fn map_error(e: &CommandError) -> Option<String> {
    match e {
        CommandError::NoDevice
        | CommandError::DeviceNotFound(_)
        | CommandError::UnknownSubcommand(_) => None,
        CommandError::Task(task) => Some(format!("{}: {}", task.task(), task.exception())),
        CommandError::Registration(inner) => Some(format!("internal error: {inner}")),
        other => Some(other.to_string()),
    }
}
