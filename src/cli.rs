//! CLI entry: builds the command chain from argv, runs the leaf, and maps the
//! outcome to a process exit status.

mod output;

pub use output::map_error;

use crate::command::{CommandNode, DispatchContext};
use crate::commands::Cdrip;
use crate::error::{exit_status, CommandError};
use crate::options::ResolvedOptions;
use std::io::Write;
use tracing::{debug, error};

/// Program name of the root command.
pub const PROG_NAME: &str = "cdrip";

/// Dispatch `argv` (without the program name) and return the exit status.
pub fn run(argv: &[String], ctx: &DispatchContext<'_>, out: &mut dyn Write) -> i32 {
    let mut options = ResolvedOptions::new();
    let result = match CommandNode::new(Box::new(Cdrip), argv, PROG_NAME, &mut options, ctx) {
        Ok(mut node) => {
            debug!(command = node.leaf().prog_name(), "executing");
            node.execute(&options, out)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(CommandError::HelpShown { help }) => {
            match write!(out, "{help}").and_then(|()| out.flush()) {
                Ok(()) => exit_status::SUCCESS,
                Err(e) => {
                    error!(error = %e, "failed to write help");
                    exit_status::IO_ERROR
                }
            }
        }
        Err(CommandError::Usage(e)) => match e.print() {
            Ok(()) => e.exit_code(),
            Err(io) => {
                error!(error = %io, "failed to write usage message");
                exit_status::IO_ERROR
            }
        },
        Err(e) => {
            if let Some(message) = map_error(&e) {
                error!("Command failed: {}", e);
                eprintln!("{message}");
            }
            e.exit_code()
        }
    }
}
